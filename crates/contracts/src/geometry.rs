//! World-space geometry: transforms, locations, rotations.
//!
//! Left-handed simulator convention: x forward, y right, z up,
//! rotations in degrees.

use serde::{Deserialize, Serialize};

use crate::Vec3;

/// 3D transform: position + rotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Position (x, y, z) in meters
    pub location: Location,

    /// Rotation (pitch, yaw, roll) in degrees
    pub rotation: Rotation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

impl Rotation {
    /// Unit vector pointing along this rotation's forward axis.
    pub fn forward_vector(&self) -> Vec3 {
        let pitch = self.pitch.to_radians();
        let yaw = self.yaw.to_radians();
        Vec3 {
            x: pitch.cos() * yaw.cos(),
            y: pitch.cos() * yaw.sin(),
            z: pitch.sin(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_vector_axes() {
        let east = Rotation {
            pitch: 0.0,
            yaw: 0.0,
            roll: 0.0,
        }
        .forward_vector();
        assert!((east.x - 1.0).abs() < 1e-12);
        assert!(east.y.abs() < 1e-12);

        let south = Rotation {
            pitch: 0.0,
            yaw: 90.0,
            roll: 0.0,
        }
        .forward_vector();
        assert!(south.x.abs() < 1e-12);
        assert!((south.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_forward_vector_is_unit_length() {
        let v = Rotation {
            pitch: 30.0,
            yaw: 135.0,
            roll: 10.0,
        }
        .forward_vector();
        assert!((v.magnitude() - 1.0).abs() < 1e-12);
    }
}
