//! The deployment bundle: logical path → bytes for one publish attempt.

use std::collections::BTreeMap;

use scene_format::canonical::to_canonical_vec;
use scene_format::{AssetDescriptor, StorableSceneState};
use scene_graph::SceneSnapshot;

use crate::error::PublishError;
use crate::game;
use crate::metadata::SceneMetadata;

pub const STATE_DEFINITION_PATH: &str = "scene-state-definition.json";
pub const GAME_PATH: &str = "bin/game.js";
pub const METADATA_PATH: &str = "scene.json";
pub const THUMBNAIL_PATH: &str = "scene-thumbnail.png";
pub const ASSETS_MANIFEST_PATH: &str = "assets.json";

/// Files of one deployment, keyed by logical path.
///
/// A bundle is only ever built from fully downloaded content, so it never
/// exists in a partial state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeploymentBundle {
    files: BTreeMap<String, Vec<u8>>,
}

impl DeploymentBundle {
    /// Assemble the bundle.
    ///
    /// `downloads` maps each asset file's deployment path to its bytes and
    /// must cover every file of every asset in `assets`.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Build`] if an asset file is missing from
    /// `downloads`, or the error of the failing document.
    pub fn assemble(
        snapshot: &SceneSnapshot,
        metadata: &SceneMetadata,
        thumbnail: Option<&[u8]>,
        assets: &BTreeMap<String, AssetDescriptor>,
        mut downloads: BTreeMap<String, Vec<u8>>,
    ) -> Result<Self, PublishError> {
        let mut files = BTreeMap::new();

        let storable = StorableSceneState::from_snapshot(snapshot)?;
        files.insert(STATE_DEFINITION_PATH.to_string(), storable.to_canonical_bytes()?);
        files.insert(GAME_PATH.to_string(), game::generate(snapshot, assets)?.into_bytes());
        files.insert(METADATA_PATH.to_string(), to_canonical_vec(metadata)?);
        if let Some(thumbnail) = thumbnail {
            files.insert(THUMBNAIL_PATH.to_string(), thumbnail.to_vec());
        }
        files.insert(ASSETS_MANIFEST_PATH.to_string(), to_canonical_vec(assets)?);

        for asset in assets.values() {
            for relative in asset.contents.keys() {
                let path = asset.deployment_path(relative)?;
                let Some(bytes) = downloads.remove(&path) else {
                    return Err(PublishError::Build(format!("missing downloaded file '{path}'")));
                };
                files.insert(path, bytes);
            }
        }

        Ok(Self { files })
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    #[must_use]
    pub fn files(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.files
    }
}
