//! Translator error types.

use scene_graph::SceneError;

/// Errors raised while translating between the scene graph and an external
/// format.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// JSON (de)serialisation failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The decoded content was rejected by the scene graph.
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// A manifest component carried data that does not match its descriptor.
    #[error("malformed manifest component '{component}': {reason}")]
    Manifest { component: String, reason: String },

    /// An asset file path escapes the asset's folder or names no file.
    #[error("invalid path '{path}' in asset '{asset_id}'")]
    AssetPath { asset_id: String, path: String },
}
