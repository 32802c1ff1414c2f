//! Editor manifest format: the remote editor backend's project schema.
//!
//! A manifest holds project information (title, description, placement)
//! and the scene itself as two maps: entities listing their component ids,
//! and components keyed by id with a descriptor name and editor-space data.

use std::collections::BTreeMap;

use scene_graph::{EntityId, SceneGraph, SceneSnapshot};
use scene_math::{CoordinateFrame, LandRotation, Parcel};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::asset::AssetDescriptor;
use crate::error::FormatError;
use crate::registry::{entry_for_descriptor, entry_for_kind};

/// Manifest schema version written by this engine.
pub const MANIFEST_VERSION: u32 = 10;

/// Parcel grid occupied by a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub rows: u32,
    pub cols: u32,
}

impl Default for Layout {
    fn default() -> Self {
        Self { rows: 1, cols: 1 }
    }
}

/// Project information stored alongside the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub scene_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_coords: Option<Parcel>,
    #[serde(default)]
    pub rotation: LandRotation,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntity {
    pub id: String,
    pub components: Vec<String>,
    #[serde(default)]
    pub disable_gizmos: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestComponent {
    pub id: String,
    #[serde(rename = "type")]
    pub descriptor: String,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ManifestScene {
    pub id: String,
    #[serde(default)]
    pub entities: BTreeMap<String, ManifestEntity>,
    #[serde(default)]
    pub components: BTreeMap<String, ManifestComponent>,
    #[serde(default)]
    pub assets: BTreeMap<String, AssetDescriptor>,
}

/// A complete editor backend project record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub project: Project,
    pub scene: ManifestScene,
}

/// Result of decoding a manifest into scene content.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestImport {
    pub snapshot: SceneSnapshot,
    /// Descriptors of components that were dropped because no component kind
    /// maps to them.
    pub dropped: Vec<String>,
}

impl Manifest {
    /// A new, empty project placed at `coords`.
    #[must_use]
    pub fn new_project(project_id: impl Into<String>, scene_id: impl Into<String>, coords: Parcel) -> Self {
        let project_id = project_id.into();
        let scene_id = scene_id.into();
        Self {
            version: MANIFEST_VERSION,
            project: Project {
                id: project_id,
                scene_id: scene_id.clone(),
                title: format!("Scene {coords}"),
                description: String::new(),
                thumbnail: None,
                layout: Layout::default(),
                creation_coords: Some(coords),
                rotation: LandRotation::North,
                is_public: false,
            },
            scene: ManifestScene {
                id: scene_id,
                ..ManifestScene::default()
            },
        }
    }

    /// The coordinate frame implied by the project's placement, if it was
    /// created at known coordinates.
    #[must_use]
    pub fn frame(&self) -> Option<CoordinateFrame> {
        self.project
            .creation_coords
            .map(|coords| CoordinateFrame::for_placement(coords, self.project.rotation))
    }

    /// Replace the manifest's scene content with `snapshot`, converting
    /// transforms into editor space. Project information and the asset
    /// catalogue are kept.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Json`] if a payload cannot be encoded.
    pub fn set_scene(&mut self, snapshot: &SceneSnapshot, frame: &CoordinateFrame) -> Result<(), FormatError> {
        let mut entities = BTreeMap::new();
        let mut components = BTreeMap::new();

        for entity in snapshot.entities() {
            let mut component_ids = Vec::with_capacity(entity.components.len());
            for value in &entity.components {
                let entry = entry_for_kind(value.kind());
                let id = format!("{}/{}", entity.id, entry.descriptor);
                components.insert(
                    id.clone(),
                    ManifestComponent {
                        id: id.clone(),
                        descriptor: entry.descriptor.to_string(),
                        data: (entry.to_manifest)(value, frame)?,
                    },
                );
                component_ids.push(id);
            }
            entities.insert(
                entity.id.to_string(),
                ManifestEntity {
                    id: entity.id.to_string(),
                    components: component_ids,
                    disable_gizmos: false,
                },
            );
        }

        self.scene.entities = entities;
        self.scene.components = components;
        Ok(())
    }

    /// Decode the manifest's scene content, converting transforms back into
    /// scene-local coordinates. Components with unknown descriptors, and
    /// component ids that reference nothing, are dropped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Manifest`] when a known descriptor carries data
    /// of the wrong shape, or [`FormatError::Scene`] when the decoded value
    /// fails scene validation.
    pub fn to_snapshot(&self, frame: &CoordinateFrame) -> Result<ManifestImport, FormatError> {
        let mut graph = SceneGraph::new();
        let mut dropped = Vec::new();

        for entity in self.scene.entities.values() {
            let entity_id = EntityId::new(entity.id.clone());
            for component_id in &entity.components {
                let Some(component) = self.scene.components.get(component_id) else {
                    warn!(entity = %entity.id, component = %component_id, "manifest entity references a missing component");
                    continue;
                };
                let Some(entry) = entry_for_descriptor(&component.descriptor) else {
                    warn!(
                        entity = %entity.id,
                        descriptor = %component.descriptor,
                        "dropping component with unknown descriptor"
                    );
                    dropped.push(component.descriptor.clone());
                    continue;
                };
                let value = (entry.from_manifest)(component.data.clone(), frame).map_err(|reason| {
                    FormatError::Manifest {
                        component: component.id.clone(),
                        reason,
                    }
                })?;
                graph.apply_change(&entity_id, entry.kind, Some(value))?;
            }
        }

        Ok(ManifestImport {
            snapshot: graph.snapshot(),
            dropped,
        })
    }
}
