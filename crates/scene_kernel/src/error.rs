//! Kernel error types.

use scene_format::FormatError;
use scene_net::NetError;
use scene_publish::PublishError;
use scene_sync::SyncError;

#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    /// The initial state could not be loaded.
    #[error("bootstrap failed: {0}")]
    Bootstrap(#[source] SyncError),

    #[error("Identity not found. Sign in to continue")]
    IdentityUnavailable,

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Net(#[from] NetError),
}
