//! The signing identity used for authenticated backend calls and
//! deployments.

use async_trait::async_trait;
use scene_net::{NatsConnection, subjects};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::SyncError;

/// An authenticated user identity as handed out by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Public address of the signer.
    pub address: String,
    /// Expiry as a unix timestamp in milliseconds, if the identity expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<u64>,
}

impl Identity {
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            expiration: None,
        }
    }
}

/// A signature over a payload, attached to a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub signer: String,
    pub payload: String,
    pub signature: String,
}

/// Source of the current identity and of signatures made with it.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The identity of the signed-in user, or `None` if nobody is signed in.
    async fn current_identity(&self) -> Option<Identity>;

    /// Sign `payload` with `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Identity`] if the provider refuses or fails.
    async fn sign(&self, identity: &Identity, payload: &str) -> Result<Signature, SyncError>;
}

/// [`IdentityProvider`] reached over NATS request/reply.
pub struct NatsIdentityProvider {
    conn: NatsConnection,
}

impl NatsIdentityProvider {
    #[must_use]
    pub fn new(conn: NatsConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl IdentityProvider for NatsIdentityProvider {
    async fn current_identity(&self) -> Option<Identity> {
        match self
            .conn
            .request::<_, Option<Identity>>(subjects::IDENTITY_CURRENT, &json!({}))
            .await
        {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(error = %e, "identity provider unreachable");
                None
            }
        }
    }

    async fn sign(&self, identity: &Identity, payload: &str) -> Result<Signature, SyncError> {
        self.conn
            .request(
                subjects::IDENTITY_SIGN,
                &json!({ "identity": identity, "payload": payload }),
            )
            .await
            .map_err(|e| SyncError::Identity(e.to_string()))
    }
}
