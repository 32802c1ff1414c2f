//! # scene_math
//!
//! Spatial types for the scene sync engine. Re-exports [`glam`] for linear
//! algebra and defines the scene-specific types every translator shares:
//!
//! - [`Transform3D`] — position, rotation and scale of an entity.
//! - [`Parcel`] — a land parcel coordinate, also used as a deployment pointer.
//! - [`CoordinateFrame`] — the offset/rotation between scene-local parcel
//!   coordinates and editor-space coordinates.

pub mod frame;
pub mod parcel;
pub mod transform;

// Re-export glam types for convenience.
pub use glam::{EulerRot, Quat, Vec3};

pub use frame::{CoordinateFrame, LandRotation};
pub use parcel::{PARCEL_SIZE, Parcel, ParcelParseError};
pub use transform::Transform3D;
