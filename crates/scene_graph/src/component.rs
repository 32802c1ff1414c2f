//! Component kinds and payloads.
//!
//! The set of component kinds is closed: every kind has a stable numeric
//! code shared with the renderer and the wire format, and a typed payload.
//! Anything outside this set is rejected at the decoding boundary rather
//! than carried around as an untyped blob.

use std::fmt;

use scene_math::Transform3D;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SceneError;

/// The kind of a component. At most one component of each kind can be
/// attached to an entity.
///
/// Variants are declared in code order so the derived `Ord` sorts them the
/// same way the wire codes do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentKind {
    Transform,
    NftShape,
    GltfShape,
    Name,
    LockedOnEdit,
    Script,
}

impl ComponentKind {
    /// Every kind, in code order.
    pub const ALL: [ComponentKind; 6] = [
        Self::Transform,
        Self::NftShape,
        Self::GltfShape,
        Self::Name,
        Self::LockedOnEdit,
        Self::Script,
    ];

    /// The numeric code used by the renderer and the wire format.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::Transform => 1,
            Self::NftShape => 22,
            Self::GltfShape => 54,
            Self::Name => 1000,
            Self::LockedOnEdit => 1001,
            Self::Script => 1200,
        }
    }

    /// Look up a kind by its numeric code.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownComponentType`] for codes outside the set.
    pub fn from_code(code: u32) -> Result<Self, SceneError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.code() == code)
            .ok_or(SceneError::UnknownComponentType(code))
    }

    /// Returns `true` for kinds that render a 3D model from an asset.
    #[must_use]
    pub fn is_shape(self) -> bool {
        matches!(self, Self::GltfShape)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Transform => "transform",
            Self::NftShape => "nft-shape",
            Self::GltfShape => "gltf-shape",
            Self::Name => "name",
            Self::LockedOnEdit => "locked-on-edit",
            Self::Script => "script",
        };
        f.write_str(name)
    }
}

/// A 3D model loaded from an externally stored asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GltfShape {
    pub asset_id: String,
}

/// A framed picture of an NFT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NftShape {
    /// The NFT url, e.g. `ethereum://<contract>/<token>`.
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<[f32; 3]>,
}

/// Display name of an entity in the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Name {
    pub value: String,
}

/// Whether the editor prevents the entity from being moved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockedOnEdit {
    pub value: bool,
}

/// A smart-item script and the parameter values configured for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    pub asset_id: String,
    #[serde(default = "empty_object")]
    pub values: Value,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// A typed component payload. The variant determines the component kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ComponentValue {
    Transform(Transform3D),
    NftShape(NftShape),
    GltfShape(GltfShape),
    Name(Name),
    LockedOnEdit(LockedOnEdit),
    Script(Script),
}

impl ComponentValue {
    #[must_use]
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Transform(_) => ComponentKind::Transform,
            Self::NftShape(_) => ComponentKind::NftShape,
            Self::GltfShape(_) => ComponentKind::GltfShape,
            Self::Name(_) => ComponentKind::Name,
            Self::LockedOnEdit(_) => ComponentKind::LockedOnEdit,
            Self::Script(_) => ComponentKind::Script,
        }
    }

    /// Shorthand for a `GltfShape` referencing `asset_id`.
    #[must_use]
    pub fn gltf(asset_id: impl Into<String>) -> Self {
        Self::GltfShape(GltfShape {
            asset_id: asset_id.into(),
        })
    }

    /// The asset this payload references, if any.
    #[must_use]
    pub fn asset_id(&self) -> Option<&str> {
        match self {
            Self::GltfShape(shape) => Some(&shape.asset_id),
            Self::Script(script) => Some(&script.asset_id),
            _ => None,
        }
    }

    /// Encode the payload as the JSON value carried by the wire and storable
    /// formats.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] if serialisation fails.
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::Transform(v) => serde_json::to_value(v),
            Self::NftShape(v) => serde_json::to_value(v),
            Self::GltfShape(v) => serde_json::to_value(v),
            Self::Name(v) => serde_json::to_value(v),
            Self::LockedOnEdit(v) => serde_json::to_value(v),
            Self::Script(v) => serde_json::to_value(v),
        }
    }

    /// Decode a JSON payload for the given kind and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::MalformedPayload`] if the value does not have
    /// the shape of `kind` or fails validation.
    pub fn from_json(kind: ComponentKind, value: Value) -> Result<Self, SceneError> {
        let err = |reason: String| SceneError::MalformedPayload { kind, reason };
        let decoded = match kind {
            ComponentKind::Transform => serde_json::from_value(value).map(Self::Transform),
            ComponentKind::NftShape => serde_json::from_value(value).map(Self::NftShape),
            ComponentKind::GltfShape => serde_json::from_value(value).map(Self::GltfShape),
            ComponentKind::Name => serde_json::from_value(value).map(Self::Name),
            ComponentKind::LockedOnEdit => serde_json::from_value(value).map(Self::LockedOnEdit),
            ComponentKind::Script => serde_json::from_value(value).map(Self::Script),
        }
        .map_err(|e| err(e.to_string()))?;
        decoded.validate().map_err(err)?;
        Ok(decoded)
    }

    /// Check payload invariants that the type system does not capture.
    pub(crate) fn validate(&self) -> Result<(), String> {
        match self {
            Self::Transform(t) => {
                let finite = t.position.is_finite() && t.rotation.is_finite() && t.scale.is_finite();
                if !finite {
                    return Err("transform contains non-finite values".to_string());
                }
            }
            Self::GltfShape(shape) if shape.asset_id.trim().is_empty() => {
                return Err("empty asset id".to_string());
            }
            Self::NftShape(nft) if nft.src.trim().is_empty() => {
                return Err("empty nft src".to_string());
            }
            Self::Script(script) => {
                if script.asset_id.trim().is_empty() {
                    return Err("empty asset id".to_string());
                }
                if !script.values.is_object() {
                    return Err("script values must be an object".to_string());
                }
            }
            _ => {}
        }
        Ok(())
    }
}
