//! Generation of `bin/game.js`, the executable description of a scene.
//!
//! The script rebuilds the scene with the runtime's entity API: one
//! `Entity` per scene entity, one component per scene component, and a
//! `scripts` table for smart items whose code ships with the asset.

use std::collections::BTreeMap;
use std::fmt::Write;

use scene_format::AssetDescriptor;
use scene_graph::{ComponentValue, SceneSnapshot};
use serde_json::json;

use crate::error::PublishError;

/// Render the scene script. Assets are looked up by id to find model and
/// script paths inside the deployment.
///
/// # Errors
///
/// Returns [`PublishError::AssetResolution`] if a component references an
/// asset missing from `assets`.
pub fn generate(snapshot: &SceneSnapshot, assets: &BTreeMap<String, AssetDescriptor>) -> Result<String, PublishError> {
    let mut out = String::from("// Generated scene script. Do not edit.\n");
    out.push_str("const scripts = [];\n\n");

    for (index, entity) in snapshot.entities().iter().enumerate() {
        let var = format!("entity{index}");
        let _ = writeln!(out, "const {var} = new Entity({});", js_string(entity.id.as_str()));
        for component in &entity.components {
            if let Some(line) = component_line(&var, component, assets)? {
                out.push_str(&line);
                out.push('\n');
            }
        }
        let _ = writeln!(out, "engine.addEntity({var});\n");
    }

    out.push_str("export { scripts };\n");
    Ok(out)
}

fn component_line(
    var: &str,
    component: &ComponentValue,
    assets: &BTreeMap<String, AssetDescriptor>,
) -> Result<Option<String>, PublishError> {
    let line = match component {
        ComponentValue::Transform(t) => {
            let p = t.position;
            let r = t.rotation;
            let s = t.scale;
            format!(
                "{var}.addComponentOrReplace(new Transform({{ position: new Vector3({}, {}, {}), rotation: new Quaternion({}, {}, {}, {}), scale: new Vector3({}, {}, {}) }}));",
                p.x, p.y, p.z, r.x, r.y, r.z, r.w, s.x, s.y, s.z
            )
        }
        ComponentValue::GltfShape(shape) => {
            let asset = lookup(assets, &shape.asset_id)?;
            format!(
                "{var}.addComponentOrReplace(new GLTFShape({}));",
                js_string(&asset.deployment_path(&asset.model)?)
            )
        }
        ComponentValue::NftShape(nft) => match nft.color {
            Some([r, g, b]) => format!(
                "{var}.addComponentOrReplace(new NFTShape({}, {{ color: new Color3({r}, {g}, {b}) }}));",
                js_string(&nft.src)
            ),
            None => format!("{var}.addComponentOrReplace(new NFTShape({}));", js_string(&nft.src)),
        },
        ComponentValue::Name(name) => format!("{var}.name = {};", js_string(&name.value)),
        // Editor-only.
        ComponentValue::LockedOnEdit(_) => return Ok(None),
        ComponentValue::Script(script) => {
            let asset = lookup(assets, &script.asset_id)?;
            let Some(path) = &asset.script else {
                return Err(PublishError::AssetResolution {
                    asset_id: asset.id.clone(),
                    reason: "asset has no script".to_string(),
                });
            };
            let src = asset.deployment_path(path)?;
            let entry = json!({
                "src": src,
                "values": script.values,
            });
            format!("scripts.push({{ entity: {var}, ...{entry} }});")
        }
    };
    Ok(Some(line))
}

fn lookup<'a>(
    assets: &'a BTreeMap<String, AssetDescriptor>,
    asset_id: &str,
) -> Result<&'a AssetDescriptor, PublishError> {
    assets.get(asset_id).ok_or_else(|| PublishError::AssetResolution {
        asset_id: asset_id.to_string(),
        reason: "not resolved for this publish".to_string(),
    })
}

/// A JSON string literal is a valid JS string literal.
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use scene_graph::{Change, LockedOnEdit, Name, SceneGraph, Script};
    use scene_math::{Transform3D, Vec3};

    use super::*;

    fn asset(id: &str, script: Option<&str>) -> AssetDescriptor {
        AssetDescriptor {
            id: id.to_string(),
            name: id.to_string(),
            model: "models/tree.glb".to_string(),
            category: "nature".to_string(),
            contents: BTreeMap::new(),
            script: script.map(str::to_string),
        }
    }

    #[test]
    fn test_generates_entities_and_components() {
        let mut graph = SceneGraph::new();
        graph
            .apply(&Change::set(
                "E1",
                ComponentValue::Transform(Transform3D::from_position(Vec3::new(8.0, 0.0, 8.0))),
            ))
            .unwrap();
        graph.apply(&Change::set("E1", ComponentValue::gltf("tree"))).unwrap();
        graph
            .apply(&Change::set(
                "E1",
                ComponentValue::Name(Name {
                    value: "Big \"oak\"".to_string(),
                }),
            ))
            .unwrap();
        graph
            .apply(&Change::set("E1", ComponentValue::LockedOnEdit(LockedOnEdit { value: true })))
            .unwrap();

        let assets = BTreeMap::from([("tree".to_string(), asset("tree", None))]);
        let js = generate(&graph.snapshot(), &assets).unwrap();

        assert!(js.contains(r#"const entity0 = new Entity("E1");"#));
        assert!(js.contains("new Vector3(8, 0, 8)"));
        assert!(js.contains(r#"new GLTFShape("assets/tree/models/tree.glb")"#));
        assert!(js.contains(r#"entity0.name = "Big \"oak\"";"#));
        assert!(!js.contains("LockedOnEdit"));
        assert!(js.contains("engine.addEntity(entity0);"));
    }

    #[test]
    fn test_script_references_asset_script() {
        let mut graph = SceneGraph::new();
        graph
            .apply(&Change::set(
                "door",
                ComponentValue::Script(Script {
                    asset_id: "door-item".to_string(),
                    values: json!({ "open": false }),
                }),
            ))
            .unwrap();
        let assets = BTreeMap::from([("door-item".to_string(), asset("door-item", Some("src/item.js")))]);
        let js = generate(&graph.snapshot(), &assets).unwrap();
        assert!(js.contains(r#""src":"assets/door-item/src/item.js""#));
    }

    #[test]
    fn test_unresolved_asset_fails() {
        let mut graph = SceneGraph::new();
        graph.apply(&Change::set("E1", ComponentValue::gltf("ghost"))).unwrap();
        let err = generate(&graph.snapshot(), &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, PublishError::AssetResolution { asset_id, .. } if asset_id == "ghost"));
    }
}
