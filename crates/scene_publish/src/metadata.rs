//! The `scene.json` metadata document of a deployment.

use scene_format::{Layout, Project};
use scene_math::{LandRotation, Parcel};
use serde::{Deserialize, Serialize};

use crate::bundle::{GAME_PATH, THUMBNAIL_PATH};

/// Where a scene is deployed on the land grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub base: Parcel,
    /// Every parcel the scene occupies, base included.
    pub parcels: Vec<Parcel>,
    #[serde(default)]
    pub rotation: LandRotation,
}

impl Placement {
    /// A single-parcel placement.
    #[must_use]
    pub fn single(base: Parcel, rotation: LandRotation) -> Self {
        Self {
            base,
            parcels: vec![base],
            rotation,
        }
    }

    /// Deployment pointers: one per parcel, base first, without duplicates.
    #[must_use]
    pub fn pointers(&self) -> Vec<String> {
        let mut pointers = vec![self.base.pointer()];
        for parcel in &self.parcels {
            let pointer = parcel.pointer();
            if !pointers.contains(&pointer) {
                pointers.push(pointer);
            }
        }
        pointers
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDisplay {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navmap_thumbnail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneParcels {
    pub base: String,
    pub parcels: Vec<String>,
}

/// Where the deployment came from, so the editor can reopen it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneSource {
    pub version: u32,
    pub origin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub point: Parcel,
    pub rotation: LandRotation,
    pub layout: Layout,
}

/// Contents of `scene.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneMetadata {
    pub display: SceneDisplay,
    #[serde(default)]
    pub owner: String,
    pub scene: SceneParcels,
    pub main: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub source: SceneSource,
}

impl SceneMetadata {
    #[must_use]
    pub fn new(
        title: &str,
        description: &str,
        has_thumbnail: bool,
        placement: &Placement,
        project: Option<&Project>,
    ) -> Self {
        let pointers = placement.pointers();
        Self {
            display: SceneDisplay {
                title: title.to_string(),
                description: description.to_string(),
                navmap_thumbnail: has_thumbnail.then(|| THUMBNAIL_PATH.to_string()),
            },
            owner: String::new(),
            scene: SceneParcels {
                base: placement.base.pointer(),
                parcels: pointers,
            },
            main: GAME_PATH.to_string(),
            tags: Vec::new(),
            source: SceneSource {
                version: 1,
                origin: "builder".to_string(),
                project_id: project.map(|p| p.id.clone()),
                point: placement.base,
                rotation: placement.rotation,
                layout: project.map(|p| p.layout).unwrap_or_default(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointers_base_first_without_duplicates() {
        let placement = Placement {
            base: Parcel::new(1, 1),
            parcels: vec![Parcel::new(0, 1), Parcel::new(1, 1)],
            rotation: LandRotation::North,
        };
        assert_eq!(placement.pointers(), vec!["1,1".to_string(), "0,1".to_string()]);
    }

    #[test]
    fn test_metadata_document_shape() {
        let placement = Placement::single(Parcel::new(-3, 7), LandRotation::East);
        let metadata = SceneMetadata::new("Garden", "A garden", true, &placement, None);
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["display"]["title"], "Garden");
        assert_eq!(json["display"]["navmapThumbnail"], THUMBNAIL_PATH);
        assert_eq!(json["scene"]["base"], "-3,7");
        assert_eq!(json["main"], GAME_PATH);
        assert_eq!(json["source"]["point"], "-3,7");
        assert_eq!(json["source"]["rotation"], "east");
    }
}
