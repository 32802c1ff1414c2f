//! The remote editor backend: project manifests, thumbnails and the asset
//! catalogue.

use async_trait::async_trait;
use scene_format::{AssetDescriptor, Manifest};
use scene_math::Parcel;
use scene_net::{NatsConnection, subjects};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::SyncError;
use crate::identity::Identity;

/// How a project is looked up on the editor backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProjectLocator {
    ProjectId(String),
    /// The project created at these coordinates.
    Coordinates(Parcel),
}

impl std::fmt::Display for ProjectLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProjectId(id) => write!(f, "project {id}"),
            Self::Coordinates(coords) => write!(f, "project at {coords}"),
        }
    }
}

/// Operations the engine needs from the editor backend.
///
/// Implementations report transport failures as
/// [`SyncError::BackendUnavailable`]. A missing project is `Ok(None)`, not
/// an error.
#[async_trait]
pub trait EditorBackend: Send + Sync {
    async fn fetch_manifest(
        &self,
        locator: &ProjectLocator,
        identity: Option<&Identity>,
    ) -> Result<Option<Manifest>, SyncError>;

    async fn create_project(&self, manifest: &Manifest, identity: &Identity) -> Result<(), SyncError>;

    async fn update_manifest(&self, manifest: &Manifest, identity: &Identity) -> Result<(), SyncError>;

    async fn update_thumbnail(
        &self,
        project_id: &str,
        image: &[u8],
        identity: &Identity,
    ) -> Result<(), SyncError>;

    /// Descriptors for the given asset ids. Ids the catalogue does not know
    /// are absent from the result.
    async fn asset_metadata(&self, ids: &[String]) -> Result<Vec<AssetDescriptor>, SyncError>;
}

/// [`EditorBackend`] reached over NATS request/reply.
pub struct NatsEditorBackend {
    conn: NatsConnection,
}

impl NatsEditorBackend {
    #[must_use]
    pub fn new(conn: NatsConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl EditorBackend for NatsEditorBackend {
    async fn fetch_manifest(
        &self,
        locator: &ProjectLocator,
        identity: Option<&Identity>,
    ) -> Result<Option<Manifest>, SyncError> {
        self.conn
            .request(
                subjects::EDITOR_FETCH_MANIFEST,
                &json!({ "locator": locator, "identity": identity }),
            )
            .await
            .map_err(SyncError::unavailable)
    }

    async fn create_project(&self, manifest: &Manifest, identity: &Identity) -> Result<(), SyncError> {
        self.conn
            .request(
                subjects::EDITOR_CREATE_PROJECT,
                &json!({ "manifest": manifest, "identity": identity }),
            )
            .await
            .map_err(SyncError::unavailable)
    }

    async fn update_manifest(&self, manifest: &Manifest, identity: &Identity) -> Result<(), SyncError> {
        self.conn
            .request(
                subjects::EDITOR_UPDATE_MANIFEST,
                &json!({ "manifest": manifest, "identity": identity }),
            )
            .await
            .map_err(SyncError::unavailable)
    }

    async fn update_thumbnail(
        &self,
        project_id: &str,
        image: &[u8],
        identity: &Identity,
    ) -> Result<(), SyncError> {
        self.conn
            .request(
                subjects::EDITOR_UPDATE_THUMBNAIL,
                &json!({ "projectId": project_id, "image": image, "identity": identity }),
            )
            .await
            .map_err(SyncError::unavailable)
    }

    async fn asset_metadata(&self, ids: &[String]) -> Result<Vec<AssetDescriptor>, SyncError> {
        self.conn
            .request(subjects::EDITOR_ASSET_METADATA, &json!({ "ids": ids }))
            .await
            .map_err(SyncError::unavailable)
    }
}
