//! Codec helpers.
//!
//! Renderer traffic uses MessagePack for compact binary serialisation.
//! Request/reply traffic with the host and the external collaborators uses
//! JSON so it can be produced by any client.

use serde::{Deserialize, Serialize};

use crate::error::NetError;

/// Encode a value to MessagePack bytes.
///
/// # Errors
///
/// Returns [`NetError::Encode`] if serialisation fails.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, NetError> {
    rmp_serde::to_vec(value).map_err(NetError::Encode)
}

/// Decode a value from MessagePack bytes.
///
/// # Errors
///
/// Returns [`NetError::Decode`] if deserialisation fails.
pub fn decode<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T, NetError> {
    rmp_serde::from_slice(bytes).map_err(NetError::Decode)
}

/// Encode a value to JSON bytes.
///
/// # Errors
///
/// Returns [`NetError::Json`] if serialisation fails.
pub fn encode_json<T: Serialize>(value: &T) -> Result<Vec<u8>, NetError> {
    serde_json::to_vec(value).map_err(NetError::Json)
}

/// Decode a value from JSON bytes.
///
/// # Errors
///
/// Returns [`NetError::Json`] if deserialisation fails.
pub fn decode_json<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T, NetError> {
    serde_json::from_slice(bytes).map_err(NetError::Json)
}

#[cfg(test)]
mod tests {
    use scene_graph::{ComponentKind, EntityId};

    use super::*;
    use crate::messages::{Reply, RendererEvent};

    #[test]
    fn test_renderer_event_over_msgpack() {
        let event = RendererEvent::ComponentRemoved {
            entity: EntityId::new("E7"),
            kind: ComponentKind::GltfShape,
        };
        let bytes = encode(&event).unwrap();
        assert_eq!(decode::<RendererEvent>(&bytes).unwrap(), event);
    }

    #[test]
    fn test_truncated_msgpack_rejected() {
        let bytes = encode(&RendererEvent::EntityCreated {
            entity: EntityId::new("E1"),
        })
        .unwrap();
        let result = decode::<RendererEvent>(&bytes[..bytes.len() - 1]);
        assert!(matches!(result, Err(NetError::Decode(_))));
    }

    #[test]
    fn test_reply_envelope_is_json() {
        let bytes = encode_json(&Reply::error("no project")).unwrap();
        assert_eq!(bytes, br#"{"ok":null,"error":"no project"}"#);
        let reply: Reply = decode_json(&bytes).unwrap();
        assert_eq!(reply.error.as_deref(), Some("no project"));
    }

    #[test]
    fn test_decode_json_invalid() {
        let result: Result<Reply, _> = decode_json(b"{\"ok\":");
        assert!(matches!(result, Err(NetError::Json(_))));
    }
}
