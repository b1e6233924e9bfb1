//! Collision primitives
//!
//! Axis-aligned bounding boxes, ray/segment tests and plane intersection.
//! Everything here is pure math over glam vectors; the scene-aware
//! collision passes live in `game::systems::collision_system`.
//!
//! # Ray-AABB Intersection
//!
//! The slab method is used for ray-AABB intersection, which finds the
//! intersection points by computing entry and exit times for each axis.
//!
//! # Example
//!
//! ```ignore
//! use blockplay_engine::physics::collision::{Aabb, ray_aabb_intersect};
//! use glam::Vec3;
//!
//! let aabb = Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0));
//! if let Some(t) = ray_aabb_intersect(Vec3::new(0.0, 0.0, -5.0), Vec3::Z, aabb.min, aabb.max) {
//!     println!("Hit at distance {}", t);
//! }
//! ```

use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};

use super::types::euler_to_quat;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Build a box from its center and half extents.
    pub fn from_center_half(center: Vec3, half: Vec3) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Bounds of a unit primitive (edge length 1) after scale and euler rotation.
    ///
    /// The rotated half extents are `|R| * (scale / 2)`, which is the tightest
    /// axis-aligned box around the oriented box.
    pub fn from_transform(position: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        let half = scale.abs() * 0.5;
        if rotation == Vec3::ZERO {
            return Self::from_center_half(position, half);
        }
        let m = Mat3::from_quat(euler_to_quat(rotation));
        let abs = Mat3::from_cols(m.x_axis.abs(), m.y_axis.abs(), m.z_axis.abs());
        Self::from_center_half(position, abs * half)
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Whether `point` is inside or on the boundary of the box.
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Whether two boxes overlap (touching counts).
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && self.max.cmpge(other.min).all()
    }

    /// Closest point on (or in) the box to `point`.
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        point.clamp(self.min, self.max)
    }

    /// Distance from `point` to the box surface (0 when inside).
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        (self.closest_point(point) - point).length()
    }

    /// Box grown by `amount` on every side.
    pub fn expanded(&self, amount: f32) -> Self {
        Self {
            min: self.min - Vec3::splat(amount),
            max: self.max + Vec3::splat(amount),
        }
    }
}

/// Performs ray-AABB (Axis-Aligned Bounding Box) intersection test using the slab method.
///
/// # Arguments
///
/// * `ray_origin` - Starting point of the ray
/// * `ray_dir` - Direction of the ray (must be normalized)
/// * `aabb_min` - Minimum corner of the AABB
/// * `aabb_max` - Maximum corner of the AABB
///
/// # Returns
///
/// * `Some(t)` - Distance along the ray to the intersection point (t >= 0)
/// * `None` - No intersection or intersection is behind the ray origin
pub fn ray_aabb_intersect(
    ray_origin: Vec3,
    ray_dir: Vec3,
    aabb_min: Vec3,
    aabb_max: Vec3,
) -> Option<f32> {
    let inv = |d: f32| {
        if d.abs() > 1e-10 {
            1.0 / d
        } else if d.is_sign_negative() {
            f32::MIN
        } else {
            f32::MAX
        }
    };
    let inv_dir = Vec3::new(inv(ray_dir.x), inv(ray_dir.y), inv(ray_dir.z));

    let t1 = (aabb_min - ray_origin) * inv_dir;
    let t2 = (aabb_max - ray_origin) * inv_dir;

    let t_min = t1.min(t2).max_element();
    let t_max = t1.max(t2).min_element();

    if t_max >= t_min && t_max >= 0.0 {
        if t_min >= 0.0 {
            Some(t_min)
        } else {
            // Ray starts inside the AABB
            Some(t_max)
        }
    } else {
        None
    }
}

/// Tests the segment `from -> to` against a box.
///
/// Returns the first point of contact. A segment that starts inside the box
/// reports its start point.
pub fn segment_aabb_intersect(from: Vec3, to: Vec3, aabb: &Aabb) -> Option<Vec3> {
    if aabb.contains(from) {
        return Some(from);
    }
    let delta = to - from;
    let length = delta.length();
    if length < 1e-6 {
        return None;
    }
    let dir = delta / length;
    ray_aabb_intersect(from, dir, aabb.min, aabb.max)
        .filter(|&t| t <= length)
        .map(|t| from + dir * t)
}

/// Computes the surface normal for a point on an AABB surface.
///
/// Determines which face of the AABB the point is on and returns the outward normal.
pub fn aabb_surface_normal(point: Vec3, aabb_min: Vec3, aabb_max: Vec3) -> Vec3 {
    let center = (aabb_min + aabb_max) * 0.5;
    let half_extents = ((aabb_max - aabb_min) * 0.5).max(Vec3::splat(1e-6));
    let normalized = (point - center) / half_extents;
    let abs_normalized = normalized.abs();

    if abs_normalized.x >= abs_normalized.y && abs_normalized.x >= abs_normalized.z {
        Vec3::new(normalized.x.signum(), 0.0, 0.0)
    } else if abs_normalized.y >= abs_normalized.x && abs_normalized.y >= abs_normalized.z {
        Vec3::new(0.0, normalized.y.signum(), 0.0)
    } else {
        Vec3::new(0.0, 0.0, normalized.z.signum())
    }
}

/// Intersect a ray with a plane given by a point and a normal.
///
/// Returns the ray parameter `t >= 0`, or `None` when the ray is parallel
/// to the plane or the plane is behind the origin.
pub fn ray_plane_intersect(
    ray_origin: Vec3,
    ray_dir: Vec3,
    plane_point: Vec3,
    plane_normal: Vec3,
) -> Option<f32> {
    let denom = plane_normal.dot(ray_dir);
    if denom.abs() < 1e-4 {
        return None;
    }
    let t = (plane_point - ray_origin).dot(plane_normal) / denom;
    (t >= 0.0).then_some(t)
}
