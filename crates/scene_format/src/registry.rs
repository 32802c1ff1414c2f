//! Per-kind translation table between scene components and editor manifest
//! components.
//!
//! Every [`ComponentKind`] has exactly one entry, so the scene → manifest
//! direction is total. The manifest → scene direction looks entries up by
//! descriptor name and may miss: callers decide what to do with unknown
//! descriptors.

use scene_graph::{ComponentKind, ComponentValue, GltfShape, LockedOnEdit, Name, NftShape, Script};
use scene_math::{CoordinateFrame, Quat, Transform3D, Vec3};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::FormatError;

type ToManifest = fn(&ComponentValue, &CoordinateFrame) -> Result<Value, FormatError>;
type FromManifest = fn(Value, &CoordinateFrame) -> Result<ComponentValue, String>;

/// Translation functions for one component kind.
pub struct KindEntry {
    pub kind: ComponentKind,
    /// The editor backend's name for this kind.
    pub descriptor: &'static str,
    pub to_manifest: ToManifest,
    pub from_manifest: FromManifest,
}

static ENTRIES: [KindEntry; 6] = [
    KindEntry {
        kind: ComponentKind::Transform,
        descriptor: "Transform",
        to_manifest: transform_to_manifest,
        from_manifest: transform_from_manifest,
    },
    KindEntry {
        kind: ComponentKind::NftShape,
        descriptor: "NFTShape",
        to_manifest: nft_to_manifest,
        from_manifest: nft_from_manifest,
    },
    KindEntry {
        kind: ComponentKind::GltfShape,
        descriptor: "GLTFShape",
        to_manifest: passthrough_to_manifest,
        from_manifest: gltf_from_manifest,
    },
    KindEntry {
        kind: ComponentKind::Name,
        descriptor: "Name",
        to_manifest: passthrough_to_manifest,
        from_manifest: name_from_manifest,
    },
    KindEntry {
        kind: ComponentKind::LockedOnEdit,
        descriptor: "LockedOnEdit",
        to_manifest: passthrough_to_manifest,
        from_manifest: locked_from_manifest,
    },
    KindEntry {
        kind: ComponentKind::Script,
        descriptor: "Script",
        to_manifest: passthrough_to_manifest,
        from_manifest: script_from_manifest,
    },
];

/// The entry for `kind`. Total over [`ComponentKind`].
#[must_use]
pub fn entry_for_kind(kind: ComponentKind) -> &'static KindEntry {
    let index = match kind {
        ComponentKind::Transform => 0,
        ComponentKind::NftShape => 1,
        ComponentKind::GltfShape => 2,
        ComponentKind::Name => 3,
        ComponentKind::LockedOnEdit => 4,
        ComponentKind::Script => 5,
    };
    &ENTRIES[index]
}

/// The entry whose descriptor is `descriptor`, if the kind is known.
#[must_use]
pub fn entry_for_descriptor(descriptor: &str) -> Option<&'static KindEntry> {
    ENTRIES.iter().find(|entry| entry.descriptor == descriptor)
}

fn decode<T: for<'de> Deserialize<'de>>(data: Value) -> Result<T, String> {
    serde_json::from_value(data).map_err(|e| e.to_string())
}

fn passthrough_to_manifest(
    value: &ComponentValue,
    _frame: &CoordinateFrame,
) -> Result<Value, FormatError> {
    Ok(value.to_json()?)
}

fn gltf_from_manifest(data: Value, _frame: &CoordinateFrame) -> Result<ComponentValue, String> {
    decode::<GltfShape>(data).map(ComponentValue::GltfShape)
}

fn name_from_manifest(data: Value, _frame: &CoordinateFrame) -> Result<ComponentValue, String> {
    decode::<Name>(data).map(ComponentValue::Name)
}

fn locked_from_manifest(data: Value, _frame: &CoordinateFrame) -> Result<ComponentValue, String> {
    decode::<LockedOnEdit>(data).map(ComponentValue::LockedOnEdit)
}

fn script_from_manifest(data: Value, _frame: &CoordinateFrame) -> Result<ComponentValue, String> {
    decode::<Script>(data).map(ComponentValue::Script)
}

// -- Transform --

#[derive(Serialize, Deserialize)]
struct EditorVec3 {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Serialize, Deserialize)]
struct EditorQuat {
    x: f32,
    y: f32,
    z: f32,
    w: f32,
}

#[derive(Serialize, Deserialize)]
struct EditorTransform {
    position: EditorVec3,
    rotation: EditorQuat,
    scale: EditorVec3,
}

fn transform_to_manifest(
    value: &ComponentValue,
    frame: &CoordinateFrame,
) -> Result<Value, FormatError> {
    let ComponentValue::Transform(local) = value else {
        return passthrough_to_manifest(value, frame);
    };
    let t = frame.to_editor(local);
    let editor = EditorTransform {
        position: EditorVec3 {
            x: t.position.x,
            y: t.position.y,
            z: t.position.z,
        },
        rotation: EditorQuat {
            x: t.rotation.x,
            y: t.rotation.y,
            z: t.rotation.z,
            w: t.rotation.w,
        },
        scale: EditorVec3 {
            x: t.scale.x,
            y: t.scale.y,
            z: t.scale.z,
        },
    };
    Ok(serde_json::to_value(editor)?)
}

fn transform_from_manifest(data: Value, frame: &CoordinateFrame) -> Result<ComponentValue, String> {
    let editor: EditorTransform = decode(data)?;
    let t = Transform3D {
        position: Vec3::new(editor.position.x, editor.position.y, editor.position.z),
        rotation: Quat::from_xyzw(
            editor.rotation.x,
            editor.rotation.y,
            editor.rotation.z,
            editor.rotation.w,
        ),
        scale: Vec3::new(editor.scale.x, editor.scale.y, editor.scale.z),
    };
    Ok(ComponentValue::Transform(frame.to_scene(&t)))
}

// -- NFT shape --

fn nft_to_manifest(value: &ComponentValue, frame: &CoordinateFrame) -> Result<Value, FormatError> {
    let ComponentValue::NftShape(nft) = value else {
        return passthrough_to_manifest(value, frame);
    };
    let mut data = json!({ "url": nft.src });
    if let Some(color) = nft.color {
        data["color"] = json!(color);
    }
    Ok(data)
}

fn nft_from_manifest(data: Value, _frame: &CoordinateFrame) -> Result<ComponentValue, String> {
    #[derive(Deserialize)]
    struct EditorNft {
        url: String,
        #[serde(default)]
        color: Option<[f32; 3]>,
    }
    let nft: EditorNft = decode(data)?;
    Ok(ComponentValue::NftShape(NftShape {
        src: nft.url,
        color: nft.color,
    }))
}

#[cfg(test)]
mod tests {
    use scene_math::{LandRotation, Parcel};

    use super::*;

    #[test]
    fn test_every_kind_has_an_entry() {
        for kind in ComponentKind::ALL {
            let entry = entry_for_kind(kind);
            assert_eq!(entry.kind, kind);
            assert_eq!(entry_for_descriptor(entry.descriptor).map(|e| e.kind), Some(kind));
        }
    }

    #[test]
    fn test_unknown_descriptor_misses() {
        assert!(entry_for_descriptor("AudioSource").is_none());
    }

    #[test]
    fn test_transform_written_in_editor_space() {
        let frame = CoordinateFrame::for_placement(Parcel::new(1, 2), LandRotation::North);
        let value = ComponentValue::Transform(Transform3D::IDENTITY);
        let data = (entry_for_kind(ComponentKind::Transform).to_manifest)(&value, &frame).unwrap();
        assert_eq!(data["position"], json!({ "x": 16.0, "y": 0.0, "z": 32.0 }));
        let back = (entry_for_kind(ComponentKind::Transform).from_manifest)(data, &frame).unwrap();
        let ComponentValue::Transform(t) = back else {
            panic!("expected transform");
        };
        assert!(t.abs_diff_eq(&Transform3D::IDENTITY, 1e-4));
    }

    #[test]
    fn test_nft_uses_editor_key() {
        let value = ComponentValue::NftShape(NftShape {
            src: "ethereum://0xabc/1".to_string(),
            color: None,
        });
        let frame = CoordinateFrame::IDENTITY;
        let data = (entry_for_kind(ComponentKind::NftShape).to_manifest)(&value, &frame).unwrap();
        assert_eq!(data, json!({ "url": "ethereum://0xabc/1" }));
        let back = (entry_for_kind(ComponentKind::NftShape).from_manifest)(data, &frame).unwrap();
        assert_eq!(back, value);
    }
}
