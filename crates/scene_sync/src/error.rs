//! Synchronisation error types.

use scene_format::FormatError;
use scene_graph::SceneError;
use scene_net::NetError;

/// Errors raised by the sync actors and collaborator adapters.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The editor backend could not be reached or failed.
    #[error("editor backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The requested project or manifest does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// One referenced asset could not be resolved.
    #[error("asset '{asset_id}' could not be resolved: {reason}")]
    AssetResolution { asset_id: String, reason: String },

    /// The identity provider failed to sign.
    #[error("identity provider error: {0}")]
    Identity(String),

    /// The initial state was pushed twice to the same renderer.
    #[error("renderer already initialised")]
    AlreadyInitialized,

    /// A renderer event could not be applied to the graph.
    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Net(#[from] NetError),
}

impl SyncError {
    pub(crate) fn unavailable(e: impl ToString) -> Self {
        Self::BackendUnavailable(e.to_string())
    }
}
