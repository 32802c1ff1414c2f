//! The content-addressed store collaborator.

use std::collections::BTreeMap;

use async_trait::async_trait;
use scene_net::{NatsConnection, subjects};
use scene_sync::Signature;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::entity::{self, BuiltEntity, ContentEntity};
use crate::error::PublishError;

/// One atomic deployment: the entity, every file it needs, and the
/// signature over its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub entity_id: String,
    pub entity: ContentEntity,
    /// Hash → bytes.
    pub files: BTreeMap<String, Vec<u8>>,
    pub signature: Signature,
}

impl Deployment {
    #[must_use]
    pub fn new(built: BuiltEntity, signature: Signature) -> Self {
        Self {
            entity_id: built.entity.id.clone(),
            entity: built.entity,
            files: built.files,
            signature,
        }
    }
}

/// Operations the pipeline needs from the content-addressed store.
///
/// Deployments are all-or-nothing: a store must reject a deployment whose
/// entity references a hash it neither has nor receives.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Build the entity for `files` (logical path → bytes).
    ///
    /// # Errors
    ///
    /// See [`entity::build_entity`].
    fn build_entity(
        &self,
        entity_type: &str,
        pointers: &[String],
        timestamp: u64,
        files: &BTreeMap<String, Vec<u8>>,
        metadata: Value,
    ) -> Result<BuiltEntity, PublishError> {
        entity::build_entity(entity_type, pointers, timestamp, files, metadata)
    }

    async fn deploy_entity(&self, deployment: &Deployment) -> Result<(), PublishError>;

    async fn fetch_entity_by_id(
        &self,
        entity_type: &str,
        id: &str,
    ) -> Result<Option<ContentEntity>, PublishError>;

    /// The active entities at `pointers`.
    async fn fetch_entities_by_pointers(
        &self,
        entity_type: &str,
        pointers: &[String],
    ) -> Result<Vec<ContentEntity>, PublishError>;

    async fn download_content(&self, hash: &str) -> Result<Vec<u8>, PublishError>;
}

/// [`ContentStore`] reached over NATS request/reply.
pub struct NatsContentStore {
    conn: NatsConnection,
}

impl NatsContentStore {
    #[must_use]
    pub fn new(conn: NatsConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl ContentStore for NatsContentStore {
    async fn deploy_entity(&self, deployment: &Deployment) -> Result<(), PublishError> {
        self.conn
            .request(subjects::CONTENT_DEPLOY, deployment)
            .await
            .map_err(|e| PublishError::Upload(e.to_string()))
    }

    async fn fetch_entity_by_id(
        &self,
        entity_type: &str,
        id: &str,
    ) -> Result<Option<ContentEntity>, PublishError> {
        self.conn
            .request(
                subjects::CONTENT_ENTITY_BY_ID,
                &json!({ "type": entity_type, "id": id }),
            )
            .await
            .map_err(|e| PublishError::Store(e.to_string()))
    }

    async fn fetch_entities_by_pointers(
        &self,
        entity_type: &str,
        pointers: &[String],
    ) -> Result<Vec<ContentEntity>, PublishError> {
        self.conn
            .request(
                subjects::CONTENT_ENTITIES_BY_POINTER,
                &json!({ "type": entity_type, "pointers": pointers }),
            )
            .await
            .map_err(|e| PublishError::Store(e.to_string()))
    }

    async fn download_content(&self, hash: &str) -> Result<Vec<u8>, PublishError> {
        self.conn
            .request(subjects::CONTENT_DOWNLOAD, &json!({ "hash": hash }))
            .await
            .map_err(|e| PublishError::Store(e.to_string()))
    }
}
