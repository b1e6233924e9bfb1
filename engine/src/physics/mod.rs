//! Physics module
//!
//! Spatial math and kinematics for the play-mode runtime. Built without an
//! external physics library: the game only needs boxes, rays, planes and
//! straight-flying projectiles.
//!
//! # Unit System
//!
//! **1 unit = 1 meter**, seconds for time, radians for angles.
//!
//! # Submodules
//!
//! - [`types`] - glam re-exports, euler/quaternion conversion, axis helpers
//! - [`collision`] - AABBs, ray/segment/plane intersection
//! - [`ballistics`] - Projectile integration and lifetime

pub mod ballistics;
pub mod collision;
pub mod types;

pub use ballistics::{BallisticsConfig, Projectile, ProjectileState, Shooter};
pub use collision::{
    Aabb, aabb_surface_normal, ray_aabb_intersect, ray_plane_intersect, segment_aabb_intersect,
};
pub use types::{Axis, Quat, Vec3, euler_to_quat, quat_to_euler, smoothstep, yaw_towards};
