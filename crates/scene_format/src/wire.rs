//! Wire format: the save/load payload exchanged with the host.
//!
//! A flat list of entities, each an ordered list of `(type code, value)`
//! components. Values are the JSON payloads produced by
//! [`ComponentValue::to_json`]; no coordinate transform is applied.

use scene_graph::{EntityId, SceneGraph, SceneSnapshot};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FormatError;

/// One component of a serialised entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedComponent {
    #[serde(rename = "type")]
    pub type_code: u32,
    pub value: Value,
}

/// One entity of a [`SerializedSceneState`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedEntity {
    pub id: String,
    pub components: Vec<SerializedComponent>,
}

/// The wire representation of a whole scene.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SerializedSceneState {
    pub entities: Vec<SerializedEntity>,
}

impl SerializedSceneState {
    /// Project a snapshot into wire format, preserving its order.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Json`] if a payload cannot be encoded.
    pub fn from_snapshot(snapshot: &SceneSnapshot) -> Result<Self, FormatError> {
        let entities = snapshot
            .entities()
            .iter()
            .map(|entity| {
                let components = entity
                    .components
                    .iter()
                    .map(|c| {
                        Ok(SerializedComponent {
                            type_code: c.kind().code(),
                            value: c.to_json()?,
                        })
                    })
                    .collect::<Result<Vec<_>, FormatError>>()?;
                Ok(SerializedEntity {
                    id: entity.id.to_string(),
                    components,
                })
            })
            .collect::<Result<Vec<_>, FormatError>>()?;
        Ok(Self { entities })
    }

    /// Decode into a snapshot. Later duplicates of the same component on the
    /// same entity replace earlier ones.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Scene`] if any component has an unknown type
    /// code or a malformed payload.
    pub fn to_snapshot(&self) -> Result<SceneSnapshot, FormatError> {
        let mut graph = SceneGraph::new();
        for entity in &self.entities {
            let id = EntityId::new(entity.id.clone());
            for component in &entity.components {
                graph.apply_raw(&id, component.type_code, Some(component.value.clone()))?;
            }
        }
        Ok(graph.snapshot())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use scene_graph::{Change, ComponentKind, ComponentValue, SceneError};
    use scene_math::{Transform3D, Vec3};
    use serde_json::json;

    use super::*;

    fn two_entity_scene() -> SceneSnapshot {
        let mut graph = SceneGraph::new();
        graph
            .apply(&Change::set(
                "E1",
                ComponentValue::Transform(Transform3D::from_position(Vec3::ZERO)),
            ))
            .unwrap();
        graph.apply(&Change::set("E2", ComponentValue::gltf("abc"))).unwrap();
        graph.snapshot()
    }

    #[test]
    fn test_roundtrip_preserves_scene() {
        let snapshot = two_entity_scene();
        let wire = SerializedSceneState::from_snapshot(&snapshot).unwrap();
        assert_eq!(wire.to_snapshot().unwrap(), snapshot);
    }

    #[test]
    fn test_json_shape() {
        let wire = SerializedSceneState::from_snapshot(&two_entity_scene()).unwrap();
        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["entities"][1]["id"], "E2");
        assert_eq!(
            json["entities"][1]["components"][0],
            json!({ "type": 54, "value": { "assetId": "abc" } })
        );
    }

    #[test]
    fn test_unknown_type_code_rejected() {
        let wire: SerializedSceneState = serde_json::from_value(json!({
            "entities": [{ "id": "E1", "components": [{ "type": 9999, "value": {} }] }]
        }))
        .unwrap();
        let err = wire.to_snapshot().unwrap_err();
        assert!(matches!(
            err,
            FormatError::Scene(SceneError::MalformedMutation { .. })
        ));
    }

    #[test]
    fn test_duplicate_component_last_write_wins() {
        let code = ComponentKind::GltfShape.code();
        let wire: SerializedSceneState = serde_json::from_value(json!({
            "entities": [{ "id": "E1", "components": [
                { "type": code, "value": { "assetId": "first" } },
                { "type": code, "value": { "assetId": "second" } },
            ] }]
        }))
        .unwrap();
        let snapshot = wire.to_snapshot().unwrap();
        assert_eq!(snapshot.entities()[0].components, vec![ComponentValue::gltf("second")]);
    }
}
