//! Canonical JSON output.
//!
//! Content addressing hashes serialised bytes, so logically identical
//! documents must serialise identically. Canonical output sorts every object
//! key recursively and emits no insignificant whitespace.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::FormatError;

/// Serialise `value` to canonical JSON bytes.
///
/// # Errors
///
/// Returns [`FormatError::Json`] if `value` cannot be represented as JSON.
pub fn to_canonical_vec<T: Serialize>(value: &T) -> Result<Vec<u8>, FormatError> {
    let value = canonicalize(serde_json::to_value(value)?);
    Ok(serde_json::to_vec(&value)?)
}

/// Rebuild `value` with every object's keys in sorted order.
#[must_use]
pub fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (key, value) in entries {
                sorted.insert(key, canonicalize(value));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_keys_sorted_recursively() {
        let bytes = to_canonical_vec(&json!({ "b": 1, "a": { "d": [ { "z": 0, "y": 1 } ], "c": 2 } }))
            .unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"a":{"c":2,"d":[{"y":1,"z":0}]},"b":1}"#
        );
    }
}
