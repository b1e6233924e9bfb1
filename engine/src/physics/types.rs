//! Physics type re-exports from glam
//!
//! This module provides the core mathematical types used throughout
//! the runtime, re-exported from the glam library, plus the euler/quaternion
//! conversions the scene transform model needs.
//!
//! Scene rotations are stored as XYZ euler angles in radians so that
//! per-axis animation (spin, rotate-by) is a plain addition.

pub use glam::{EulerRot, Mat3, Quat, Vec2, Vec3};

/// Convert XYZ euler angles (radians) to a quaternion.
pub fn euler_to_quat(euler: Vec3) -> Quat {
    Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z)
}

/// Convert a quaternion back to XYZ euler angles (radians).
pub fn quat_to_euler(rotation: Quat) -> Vec3 {
    let (x, y, z) = rotation.to_euler(EulerRot::XYZ);
    Vec3::new(x, y, z)
}

/// Rotation axis selector used by spin/rotate/patrol style operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    #[default]
    Y,
    Z,
}

impl Axis {
    /// Parse an axis label (`"x"`, `"Y"`, ...). Unknown labels map to Y.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "x" => Axis::X,
            "z" => Axis::Z,
            _ => Axis::Y,
        }
    }

    /// Unit vector along this axis.
    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }

    /// Mutable access to this axis' component of a vector.
    pub fn component_mut(self, v: &mut Vec3) -> &mut f32 {
        match self {
            Axis::X => &mut v.x,
            Axis::Y => &mut v.y,
            Axis::Z => &mut v.z,
        }
    }
}

/// Yaw angle (radians) that faces from `from` toward `to` on the XZ plane,
/// using the engine convention `forward = (sin yaw, 0, -cos yaw)`.
pub fn yaw_towards(from: Vec3, to: Vec3) -> f32 {
    let d = to - from;
    d.x.atan2(-d.z)
}

/// Classic smoothstep easing on `t` clamped to [0, 1].
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euler_round_trip_single_axis() {
        let euler = Vec3::new(0.0, 1.2, 0.0);
        let back = quat_to_euler(euler_to_quat(euler));
        assert!((back - euler).length() < 1e-4, "got {:?}", back);
    }

    #[test]
    fn test_yaw_towards_negative_z_is_zero() {
        let yaw = yaw_towards(Vec3::ZERO, Vec3::new(0.0, 0.0, -5.0));
        assert!(yaw.abs() < 1e-6);
        let forward = Vec3::new(yaw.sin(), 0.0, -yaw.cos());
        assert!((forward - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn test_axis_from_label() {
        assert_eq!(Axis::from_label("X"), Axis::X);
        assert_eq!(Axis::from_label(" z "), Axis::Z);
        assert_eq!(Axis::from_label("sideways"), Axis::Y);
    }

    #[test]
    fn test_smoothstep_endpoints() {
        assert_eq!(smoothstep(-1.0), 0.0);
        assert_eq!(smoothstep(0.5), 0.5);
        assert_eq!(smoothstep(2.0), 1.0);
    }
}
