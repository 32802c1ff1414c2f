//! Scene-local ↔ editor-space coordinate frame.
//!
//! The scene graph stores transforms in scene-local parcel coordinates. The
//! editor backend stores them in editor space, which is offset by the world
//! position of the base parcel and rotated by the land's placement. Every
//! translation that crosses this boundary goes through [`CoordinateFrame`] so
//! both directions stay exact inverses of each other.

use std::fmt;
use std::str::FromStr;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::parcel::{PARCEL_SIZE, Parcel};
use crate::transform::Transform3D;

/// Orientation of the land a scene is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LandRotation {
    #[default]
    North,
    East,
    South,
    West,
}

impl LandRotation {
    /// The rotation around the up axis, in degrees.
    #[must_use]
    pub fn degrees(self) -> f32 {
        match self {
            Self::North => 0.0,
            Self::East => 90.0,
            Self::South => 180.0,
            Self::West => 270.0,
        }
    }

    #[must_use]
    pub fn to_quat(self) -> Quat {
        Quat::from_rotation_y(self.degrees().to_radians())
    }
}

impl fmt::Display for LandRotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::North => "north",
            Self::East => "east",
            Self::South => "south",
            Self::West => "west",
        };
        f.write_str(s)
    }
}

impl FromStr for LandRotation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "north" => Ok(Self::North),
            "east" => Ok(Self::East),
            "south" => Ok(Self::South),
            "west" => Ok(Self::West),
            other => Err(format!("unknown land rotation '{other}'")),
        }
    }
}

/// The transform between scene-local and editor-space coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateFrame {
    /// Editor-space position of the scene-local origin.
    origin: Vec3,
    /// Rotation applied when going from scene-local to editor space.
    rotation: Quat,
}

impl CoordinateFrame {
    /// A frame where both spaces coincide.
    pub const IDENTITY: Self = Self {
        origin: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    /// Build the frame for a scene whose base parcel is `base`, placed with
    /// the given land rotation.
    #[must_use]
    pub fn for_placement(base: Parcel, rotation: LandRotation) -> Self {
        Self {
            origin: Vec3::new(base.x as f32 * PARCEL_SIZE, 0.0, base.y as f32 * PARCEL_SIZE),
            rotation: rotation.to_quat(),
        }
    }

    #[must_use]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Map a scene-local transform into editor space.
    #[must_use]
    pub fn to_editor(&self, local: &Transform3D) -> Transform3D {
        Transform3D {
            position: self.rotation * local.position + self.origin,
            rotation: self.rotation * local.rotation,
            scale: local.scale,
        }
    }

    /// Map an editor-space transform back into scene-local coordinates.
    /// Exact inverse of [`CoordinateFrame::to_editor`].
    #[must_use]
    pub fn to_scene(&self, editor: &Transform3D) -> Transform3D {
        let inverse = self.rotation.inverse();
        Transform3D {
            position: inverse * (editor.position - self.origin),
            rotation: inverse * editor.rotation,
            scale: editor.scale,
        }
    }
}

impl Default for CoordinateFrame {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn sample() -> Transform3D {
        Transform3D {
            position: Vec3::new(3.5, 1.0, -7.25),
            rotation: Quat::from_euler(glam::EulerRot::YXZ, 0.3, 1.1, -0.4),
            scale: Vec3::new(1.0, 2.0, 0.5),
        }
    }

    #[test]
    fn test_identity_frame_is_noop() {
        let t = sample();
        assert_eq!(CoordinateFrame::IDENTITY.to_editor(&t), t);
        assert_eq!(CoordinateFrame::IDENTITY.to_scene(&t), t);
    }

    #[test]
    fn test_origin_offset_from_base_parcel() {
        let frame = CoordinateFrame::for_placement(Parcel::new(2, -1), LandRotation::North);
        let editor = frame.to_editor(&Transform3D::IDENTITY);
        assert!(editor.position.abs_diff_eq(Vec3::new(32.0, 0.0, -16.0), EPS));
    }

    #[test]
    fn test_round_trip_every_rotation() {
        for rotation in [
            LandRotation::North,
            LandRotation::East,
            LandRotation::South,
            LandRotation::West,
        ] {
            let frame = CoordinateFrame::for_placement(Parcel::new(-12, 40), rotation);
            let original = sample();
            let back = frame.to_scene(&frame.to_editor(&original));
            assert!(
                original.abs_diff_eq(&back, EPS),
                "round trip drifted for {rotation}: {original:?} vs {back:?}"
            );
        }
    }

    #[test]
    fn test_east_rotation_turns_position() {
        let frame = CoordinateFrame::for_placement(Parcel::new(0, 0), LandRotation::East);
        let editor = frame.to_editor(&Transform3D::from_position(Vec3::X));
        // +90° around Y maps +X onto -Z.
        assert!(editor.position.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), EPS));
    }

    #[test]
    fn test_parse_rotation() {
        assert_eq!("West".parse::<LandRotation>().unwrap(), LandRotation::West);
        assert!("up".parse::<LandRotation>().is_err());
    }
}
