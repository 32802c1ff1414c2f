//! Scene graph error types.

use crate::component::ComponentKind;

/// Errors raised while mutating or decoding scene content.
///
/// A failed mutation always leaves the graph unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    /// A mutation was rejected because its input was not well-formed.
    #[error("malformed mutation on entity '{entity}': {reason}")]
    MalformedMutation { entity: String, reason: String },

    /// A numeric component type code outside the known set.
    #[error("unknown component type {0}")]
    UnknownComponentType(u32),

    /// A payload that does not match the shape of its component kind.
    #[error("malformed {kind} payload: {reason}")]
    MalformedPayload { kind: ComponentKind, reason: String },
}

impl SceneError {
    pub(crate) fn malformed(entity: impl ToString, reason: impl ToString) -> Self {
        Self::MalformedMutation {
            entity: entity.to_string(),
            reason: reason.to_string(),
        }
    }
}
