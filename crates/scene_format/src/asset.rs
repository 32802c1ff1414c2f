//! Asset descriptors returned by the editor backend.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::FormatError;

/// Metadata of an externally stored 3D asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDescriptor {
    pub id: String,
    pub name: String,
    /// Relative path of the main model file inside `contents`.
    pub model: String,
    #[serde(default)]
    pub category: String,
    /// Relative file path → content hash.
    pub contents: BTreeMap<String, String>,
    /// Relative path of the smart-item script, if the asset has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
}

impl AssetDescriptor {
    /// Logical path of one of this asset's files inside a deployment.
    ///
    /// Empty and `.` segments are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::AssetPath`] if `relative` has a `..` segment
    /// or names no file.
    pub fn deployment_path(&self, relative: &str) -> Result<String, FormatError> {
        let invalid = || FormatError::AssetPath {
            asset_id: self.id.clone(),
            path: relative.to_string(),
        };
        let mut segments = Vec::new();
        for segment in relative.split(['/', '\\']) {
            match segment {
                "" | "." => {}
                ".." => return Err(invalid()),
                _ => segments.push(segment),
            }
        }
        if segments.is_empty() {
            return Err(invalid());
        }
        Ok(format!("assets/{}/{}", self.id, segments.join("/")))
    }
}
