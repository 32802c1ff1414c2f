//! Publishing error types.

use scene_format::FormatError;
use scene_sync::SyncError;

/// Errors that end a publish attempt or a content store call.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// A referenced asset is unknown to the asset catalogue.
    #[error("asset '{asset_id}' could not be resolved: {reason}")]
    AssetResolution { asset_id: String, reason: String },

    /// Fetching the bytes of one asset file failed.
    #[error("download of '{path}' ({hash}) failed: {reason}")]
    Download {
        path: String,
        hash: String,
        reason: String,
    },

    #[error("Identity not found. Sign in before publishing")]
    IdentityUnavailable,

    #[error("signing failed: {0}")]
    Signing(String),

    /// The bundle or entity could not be assembled.
    #[error("bundle build failed: {0}")]
    Build(String),

    /// The store rejected or failed the deployment.
    #[error("upload failed: {0}")]
    Upload(String),

    /// A read from the content store failed.
    #[error("content store unavailable: {0}")]
    Store(String),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}
