//! Message types exchanged with the renderer and over request/reply.
//!
//! Renderer messages are MessagePack-encoded and travel on the per-scene
//! renderer subjects (see [`subjects`](crate::subjects)). Request/reply
//! traffic is JSON wrapped in a [`Reply`] envelope.

use scene_format::AssetDescriptor;
use scene_graph::{ComponentKind, ComponentValue, EntityId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::NetError;

// ── Renderer commands ───────────────────────────────────────────────────────

/// A call issued to the renderer. Published on
/// [`subjects::renderer_command`](crate::subjects::renderer_command).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RendererCommand {
    /// Create or update one component (creating the entity if needed).
    UpdateComponent { entity: EntityId, value: ComponentValue },
    /// Remove one component.
    RemoveComponent { entity: EntityId, kind: ComponentKind },
    /// Remove an entity with all of its components.
    RemoveEntity { entity: EntityId },
    /// The initial scene state has been fully pushed. Sent exactly once per
    /// session.
    InitDone,
    /// Resolved descriptors of the assets the scene references.
    SendAssets { assets: Vec<AssetDescriptor> },
    /// Outcome of a publish attempt, for the editor UI.
    PublishResult(OperationResult),
}

// ── Renderer events ─────────────────────────────────────────────────────────

/// A renderer-originated change. Published by the renderer on
/// [`subjects::renderer_event`](crate::subjects::renderer_event).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RendererEvent {
    EntityCreated { entity: EntityId },
    EntityRemoved { entity: EntityId },
    ComponentUpdated { entity: EntityId, value: ComponentValue },
    ComponentRemoved { entity: EntityId, kind: ComponentKind },
}

// ── Results ─────────────────────────────────────────────────────────────────

/// `{ok, error?}` result returned by operations that must never fail past
/// their boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationResult {
    #[must_use]
    pub fn success() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
        }
    }
}

/// JSON reply envelope for request/reply subjects: `{"ok": <value>}` or
/// `{"error": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Reply {
    #[serde(default)]
    pub ok: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Reply {
    /// Wrap a successful value.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Json`] if `value` cannot be represented as JSON.
    pub fn ok<T: Serialize>(value: &T) -> Result<Self, NetError> {
        Ok(Self {
            ok: serde_json::to_value(value)?,
            error: None,
        })
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: Value::Null,
            error: Some(message.into()),
        }
    }

    /// Unwrap the envelope into the expected value type.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Remote`] if the envelope carries an error, or
    /// [`NetError::Json`] if the value has the wrong shape.
    pub fn into_result<T: DeserializeOwned>(self) -> Result<T, NetError> {
        if let Some(error) = self.error {
            return Err(NetError::Remote(error));
        }
        Ok(serde_json::from_value(self.ok)?)
    }
}
