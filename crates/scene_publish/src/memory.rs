//! In-memory content store, for local runs and tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};

use crate::entity::{ContentEntity, hash_bytes};
use crate::error::PublishError;
use crate::store::{ContentStore, Deployment};

/// A [`ContentStore`] keeping entities and content in memory.
///
/// Enforces the all-or-nothing deployment contract and the entity id
/// derivation, and counts deploy calls.
#[derive(Default)]
pub struct MemoryContentStore {
    entities: DashMap<String, ContentEntity>,
    /// Pointer → active entity id.
    pointers: DashMap<String, String>,
    content: DashMap<String, Vec<u8>>,
    failing_hashes: DashSet<String>,
    reject_deploys: AtomicBool,
    deploy_calls: AtomicUsize,
}

impl MemoryContentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw content, returning its hash.
    pub fn insert_content(&self, bytes: Vec<u8>) -> String {
        let hash = hash_bytes(&bytes);
        self.content.insert(hash.clone(), bytes);
        hash
    }

    /// Make downloads of `hash` fail.
    pub fn fail_download(&self, hash: &str) {
        self.failing_hashes.insert(hash.to_string());
    }

    pub fn set_reject_deploys(&self, reject: bool) {
        self.reject_deploys.store(reject, Ordering::SeqCst);
    }

    #[must_use]
    pub fn deploy_calls(&self) -> usize {
        self.deploy_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn entity(&self, id: &str) -> Option<ContentEntity> {
        self.entities.get(id).map(|e| e.clone())
    }

    #[must_use]
    pub fn active_entity_id(&self, pointer: &str) -> Option<String> {
        self.pointers.get(pointer).map(|id| id.clone())
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn deploy_entity(&self, deployment: &Deployment) -> Result<(), PublishError> {
        self.deploy_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_deploys.load(Ordering::SeqCst) {
            return Err(PublishError::Upload("deployment rejected by the store".to_string()));
        }

        let entity = &deployment.entity;
        if entity.compute_id()? != deployment.entity_id || entity.id != deployment.entity_id {
            return Err(PublishError::Upload("entity id does not match its content".to_string()));
        }
        if deployment.signature.payload != deployment.entity_id {
            return Err(PublishError::Upload("signature does not cover the entity id".to_string()));
        }
        for (hash, bytes) in &deployment.files {
            if &hash_bytes(bytes) != hash {
                return Err(PublishError::Upload(format!("file content does not match hash {hash}")));
            }
        }
        if let Some(missing) = entity
            .content
            .iter()
            .find(|f| !deployment.files.contains_key(&f.hash) && !self.content.contains_key(&f.hash))
        {
            return Err(PublishError::Upload(format!("missing file '{}'", missing.file)));
        }

        for (hash, bytes) in &deployment.files {
            self.content.insert(hash.clone(), bytes.clone());
        }
        for pointer in &entity.pointers {
            self.pointers.insert(pointer.clone(), entity.id.clone());
        }
        self.entities.insert(entity.id.clone(), entity.clone());
        Ok(())
    }

    async fn fetch_entity_by_id(
        &self,
        entity_type: &str,
        id: &str,
    ) -> Result<Option<ContentEntity>, PublishError> {
        Ok(self.entity(id).filter(|e| e.entity_type == entity_type))
    }

    async fn fetch_entities_by_pointers(
        &self,
        entity_type: &str,
        pointers: &[String],
    ) -> Result<Vec<ContentEntity>, PublishError> {
        let mut found: Vec<ContentEntity> = Vec::new();
        for pointer in pointers {
            let Some(entity) = self.active_entity_id(pointer).and_then(|id| self.entity(&id)) else {
                continue;
            };
            if entity.entity_type == entity_type && !found.iter().any(|e| e.id == entity.id) {
                found.push(entity);
            }
        }
        Ok(found)
    }

    async fn download_content(&self, hash: &str) -> Result<Vec<u8>, PublishError> {
        if self.failing_hashes.contains(hash) {
            return Err(PublishError::Store(format!("content {hash} unavailable")));
        }
        self.content
            .get(hash)
            .map(|bytes| bytes.clone())
            .ok_or_else(|| PublishError::Store(format!("content {hash} not found")))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use scene_sync::Signature;
    use serde_json::json;

    use super::*;
    use crate::entity::SCENE_ENTITY_TYPE;

    fn signed(store: &MemoryContentStore, files: &BTreeMap<String, Vec<u8>>) -> Deployment {
        let built = store
            .build_entity(SCENE_ENTITY_TYPE, &["0,0".to_string()], 1, files, json!({}))
            .unwrap();
        let signature = Signature {
            signer: "0xabc".to_string(),
            payload: built.entity.id.clone(),
            signature: "sig".to_string(),
        };
        Deployment::new(built, signature)
    }

    #[tokio::test]
    async fn test_deploy_then_fetch() {
        let store = MemoryContentStore::new();
        let files = BTreeMap::from([("scene.json".to_string(), b"{}".to_vec())]);
        let deployment = signed(&store, &files);
        store.deploy_entity(&deployment).await.unwrap();

        let by_id = store
            .fetch_entity_by_id(SCENE_ENTITY_TYPE, &deployment.entity_id)
            .await
            .unwrap();
        assert_eq!(by_id.as_ref().map(|e| e.id.as_str()), Some(deployment.entity_id.as_str()));

        let active = store
            .fetch_entities_by_pointers(SCENE_ENTITY_TYPE, &["0,0".to_string()])
            .await
            .unwrap();
        assert_eq!(active.len(), 1);

        let hash = active[0].content_hash("scene.json").unwrap().to_string();
        assert_eq!(store.download_content(&hash).await.unwrap(), b"{}".to_vec());
    }

    #[tokio::test]
    async fn test_deploy_missing_file_rejected_entirely() {
        let store = MemoryContentStore::new();
        let files = BTreeMap::from([
            ("scene.json".to_string(), b"{}".to_vec()),
            ("bin/game.js".to_string(), b"//".to_vec()),
        ]);
        let mut deployment = signed(&store, &files);
        let dropped = deployment.entity.content_hash("bin/game.js").unwrap().to_string();
        deployment.files.remove(&dropped);

        let err = store.deploy_entity(&deployment).await.unwrap_err();
        assert!(matches!(err, PublishError::Upload(_)));
        assert!(store.entity(&deployment.entity_id).is_none());
        assert!(store.active_entity_id("0,0").is_none());
        assert_eq!(store.deploy_calls(), 1);
    }

    #[tokio::test]
    async fn test_tampered_entity_rejected() {
        let store = MemoryContentStore::new();
        let files = BTreeMap::from([("scene.json".to_string(), b"{}".to_vec())]);
        let mut deployment = signed(&store, &files);
        deployment.entity.timestamp = 2;
        assert!(store.deploy_entity(&deployment).await.is_err());
    }
}
