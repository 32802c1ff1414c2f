//! Content-addressed entities.
//!
//! Every file is addressed by the SHA-256 of its bytes. The entity document
//! lists the files it references by logical path and hash; the SHA-256 of
//! its canonical JSON (without the id itself) is the entity id. Identical
//! logical content therefore always yields the same id.

use std::collections::BTreeMap;

use scene_format::canonical::to_canonical_vec;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::PublishError;

/// Entity type of scene deployments.
pub const SCENE_ENTITY_TYPE: &str = "scene";

/// Hex SHA-256 of `bytes`.
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// One file referenced by an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentFile {
    pub file: String,
    pub hash: String,
}

/// A deployed (or about to be deployed) entity document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEntity {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub pointers: Vec<String>,
    pub timestamp: u64,
    /// Sorted by logical path.
    pub content: Vec<ContentFile>,
    #[serde(default)]
    pub metadata: Value,
}

impl ContentEntity {
    /// Hash of the file stored under `path`.
    #[must_use]
    pub fn content_hash(&self, path: &str) -> Option<&str> {
        self.content
            .iter()
            .find(|f| f.file == path)
            .map(|f| f.hash.as_str())
    }

    /// Recompute the id from the document's content.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Format`] if the metadata cannot be
    /// serialised.
    pub fn compute_id(&self) -> Result<String, PublishError> {
        #[derive(Serialize)]
        struct Unsigned<'a> {
            #[serde(rename = "type")]
            entity_type: &'a str,
            pointers: &'a [String],
            timestamp: u64,
            content: &'a [ContentFile],
            metadata: &'a Value,
        }
        let bytes = to_canonical_vec(&Unsigned {
            entity_type: &self.entity_type,
            pointers: &self.pointers,
            timestamp: self.timestamp,
            content: &self.content,
            metadata: &self.metadata,
        })?;
        Ok(hash_bytes(&bytes))
    }
}

/// An entity ready for deployment, with its files keyed by hash.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltEntity {
    pub entity: ContentEntity,
    pub files: BTreeMap<String, Vec<u8>>,
}

impl BuiltEntity {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.entity.id
    }
}

/// Build the entity document for `files` (logical path → bytes).
///
/// Files with identical bytes are stored once.
///
/// # Errors
///
/// Returns [`PublishError::Build`] if there is nothing to deploy or no
/// pointer, or [`PublishError::Format`] if the document cannot be
/// serialised.
pub fn build_entity(
    entity_type: &str,
    pointers: &[String],
    timestamp: u64,
    files: &BTreeMap<String, Vec<u8>>,
    metadata: Value,
) -> Result<BuiltEntity, PublishError> {
    if pointers.is_empty() {
        return Err(PublishError::Build("entity has no pointers".to_string()));
    }
    if files.is_empty() {
        return Err(PublishError::Build("entity has no files".to_string()));
    }

    let mut content = Vec::with_capacity(files.len());
    let mut by_hash = BTreeMap::new();
    for (path, bytes) in files {
        let hash = hash_bytes(bytes);
        content.push(ContentFile {
            file: path.clone(),
            hash: hash.clone(),
        });
        by_hash.entry(hash).or_insert_with(|| bytes.clone());
    }

    let mut entity = ContentEntity {
        id: String::new(),
        entity_type: entity_type.to_string(),
        pointers: pointers.to_vec(),
        timestamp,
        content,
        metadata,
    };
    entity.id = entity.compute_id()?;
    Ok(BuiltEntity {
        entity,
        files: by_hash,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn files() -> BTreeMap<String, Vec<u8>> {
        BTreeMap::from([
            ("scene.json".to_string(), b"{}".to_vec()),
            ("bin/game.js".to_string(), b"// game".to_vec()),
            ("assets/a/copy.glb".to_string(), b"// game".to_vec()),
        ])
    }

    fn pointers() -> Vec<String> {
        vec!["0,0".to_string()]
    }

    #[test]
    fn test_hash_is_sha256_hex() {
        assert_eq!(
            hash_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_same_content_same_id() {
        let a = build_entity(SCENE_ENTITY_TYPE, &pointers(), 1, &files(), json!({ "t": 1 })).unwrap();
        let b = build_entity(SCENE_ENTITY_TYPE, &pointers(), 1, &files(), json!({ "t": 1 })).unwrap();
        assert_eq!(a.id(), b.id());
        assert_eq!(a.id().len(), 64);
    }

    #[test]
    fn test_any_change_changes_id() {
        let base = build_entity(SCENE_ENTITY_TYPE, &pointers(), 1, &files(), json!({})).unwrap();

        let later = build_entity(SCENE_ENTITY_TYPE, &pointers(), 2, &files(), json!({})).unwrap();
        assert_ne!(base.id(), later.id());

        let mut edited = files();
        edited.insert("scene.json".to_string(), b"{\"x\":1}".to_vec());
        let edited = build_entity(SCENE_ENTITY_TYPE, &pointers(), 1, &edited, json!({})).unwrap();
        assert_ne!(base.id(), edited.id());
    }

    #[test]
    fn test_duplicate_bytes_stored_once() {
        let built = build_entity(SCENE_ENTITY_TYPE, &pointers(), 1, &files(), json!({})).unwrap();
        assert_eq!(built.entity.content.len(), 3);
        assert_eq!(built.files.len(), 2);
        assert_eq!(
            built.entity.content_hash("bin/game.js"),
            built.entity.content_hash("assets/a/copy.glb")
        );
    }

    #[test]
    fn test_recomputed_id_matches() {
        let built = build_entity(SCENE_ENTITY_TYPE, &pointers(), 7, &files(), json!({ "k": [1, 2] })).unwrap();
        assert_eq!(built.entity.compute_id().unwrap(), built.entity.id);
    }

    #[test]
    fn test_requires_pointers_and_files() {
        assert!(matches!(
            build_entity(SCENE_ENTITY_TYPE, &[], 1, &files(), json!({})),
            Err(PublishError::Build(_))
        ));
        assert!(matches!(
            build_entity(SCENE_ENTITY_TYPE, &pointers(), 1, &BTreeMap::new(), json!({})),
            Err(PublishError::Build(_))
        ));
    }
}
