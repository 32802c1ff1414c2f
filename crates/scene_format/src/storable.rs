//! Storable format: the scene definition persisted inside a deployment.
//!
//! Entities are keyed by id in a sorted map and components are sorted by
//! type code, so two logically identical scenes always produce the same
//! bytes from [`StorableSceneState::to_canonical_bytes`].

use std::collections::BTreeMap;

use scene_graph::{EntityId, SceneGraph, SceneSnapshot};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::canonical::to_canonical_vec;
use crate::error::FormatError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorableComponent {
    #[serde(rename = "type")]
    pub type_code: u32,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StorableEntity {
    pub components: Vec<StorableComponent>,
}

/// The deployment representation of a scene.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StorableSceneState {
    pub entities: BTreeMap<String, StorableEntity>,
}

impl StorableSceneState {
    /// Project a snapshot into storable form.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Json`] if a payload cannot be encoded.
    pub fn from_snapshot(snapshot: &SceneSnapshot) -> Result<Self, FormatError> {
        let mut entities = BTreeMap::new();
        for entity in snapshot.entities() {
            let mut components = entity
                .components
                .iter()
                .map(|c| {
                    Ok(StorableComponent {
                        type_code: c.kind().code(),
                        value: c.to_json()?,
                    })
                })
                .collect::<Result<Vec<_>, FormatError>>()?;
            components.sort_by_key(|c| c.type_code);
            entities.insert(entity.id.to_string(), StorableEntity { components });
        }
        Ok(Self { entities })
    }

    /// Decode into a snapshot (entities in id order).
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Scene`] for unknown type codes or malformed
    /// payloads.
    pub fn to_snapshot(&self) -> Result<SceneSnapshot, FormatError> {
        let mut graph = SceneGraph::new();
        for (id, entity) in &self.entities {
            let id = EntityId::new(id.clone());
            for component in &entity.components {
                graph.apply_raw(&id, component.type_code, Some(component.value.clone()))?;
            }
        }
        Ok(graph.snapshot())
    }

    /// Deterministic serialisation used for content addressing.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Json`] if serialisation fails.
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>, FormatError> {
        to_canonical_vec(self)
    }

    /// Parse a stored scene definition document.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Json`] if the bytes are not a valid document.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FormatError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
