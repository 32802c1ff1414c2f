//! Entity identifiers.
//!
//! Entities are addressed by an opaque string id that is stable for the
//! lifetime of the scene and shared by the editor, the renderer and every
//! stored format.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A stable entity identifier, unique within one [`SceneGraph`](crate::SceneGraph).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the id can address an entity. Empty ids are rejected
    /// by every mutation.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.0.trim().is_empty()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity() {
        assert!(EntityId::new("E1").is_valid());
        assert!(!EntityId::new("").is_valid());
        assert!(!EntityId::new("  ").is_valid());
    }

    #[test]
    fn test_serializes_transparently() {
        let json = serde_json::to_string(&EntityId::new("E1")).unwrap();
        assert_eq!(json, "\"E1\"");
    }
}
