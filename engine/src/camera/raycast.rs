//! Raycast Module
//!
//! Turns a pointer position into a world-space ray, and intersects that ray
//! with horizontal planes. Used for click-to-pick and point-click movement.

use glam::{Vec2, Vec3};

use crate::physics::collision::ray_plane_intersect;
use crate::world::scene::Camera;

/// A world-space ray from the camera through a screen point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenRay {
    pub origin: Vec3,
    /// Normalized direction
    pub direction: Vec3,
}

impl ScreenRay {
    /// Point along the ray at distance `t`.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Intersection with the horizontal plane `y = height`, in front of the origin.
    pub fn hit_plane(&self, height: f32) -> Option<Vec3> {
        ray_plane_intersect(self.origin, self.direction, Vec3::new(0.0, height, 0.0), Vec3::Y)
            .map(|t| self.at(t))
    }
}

/// Calculate ray direction from screen UV coordinates
///
/// # Arguments
/// * `camera_pos` - Camera position in world space
/// * `camera_target` - Point the camera is looking at
/// * `uv` - Normalized screen coordinates (0-1, 0-1) where (0,0) is bottom-left
/// * `aspect_ratio` - Screen aspect ratio (width / height)
/// * `fov` - Vertical field of view in radians
pub fn get_ray_direction(
    camera_pos: Vec3,
    camera_target: Vec3,
    uv: Vec2,
    aspect_ratio: f32,
    fov: f32,
) -> Vec3 {
    let ndc = uv * 2.0 - Vec2::ONE;
    let half_fov = (fov * 0.5).tan();

    let forward = (camera_target - camera_pos).normalize_or_zero();
    let forward = if forward == Vec3::ZERO { Vec3::NEG_Z } else { forward };

    // Looking straight up or down: use world X as the right reference
    let (right, up) = if forward.y.abs() > 0.99 {
        let right = Vec3::X;
        (right, right.cross(forward).normalize())
    } else {
        let right = forward.cross(Vec3::Y).normalize();
        (right, right.cross(forward))
    };

    (forward + right * ndc.x * aspect_ratio * half_fov + up * ndc.y * half_fov).normalize()
}

/// Build the ray through `uv` for a scene camera (fov in degrees).
pub fn screen_ray(camera: &Camera, uv: Vec2) -> ScreenRay {
    ScreenRay {
        origin: camera.position,
        direction: get_ray_direction(
            camera.position,
            camera.target,
            uv,
            camera.aspect,
            camera.fov.to_radians(),
        ),
    }
}

/// Raycast from screen UV coordinates to a horizontal plane at a given height
///
/// Returns `None` when the ray is parallel to the plane or the hit is
/// behind the camera.
pub fn raycast_to_plane(camera: &Camera, uv: Vec2, plane_height: f32) -> Option<Vec3> {
    screen_ray(camera, uv).hit_plane(plane_height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_at(position: Vec3, target: Vec3) -> Camera {
        Camera {
            position,
            target,
            ..Camera::default()
        }
    }

    #[test]
    fn test_center_ray_is_forward() {
        let dir = get_ray_direction(Vec3::ZERO, Vec3::new(0.0, 0.0, -5.0), Vec2::splat(0.5), 1.0, 1.2);
        assert!((dir - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn test_right_edge_points_right() {
        let dir = get_ray_direction(Vec3::ZERO, Vec3::NEG_Z, Vec2::new(1.0, 0.5), 1.0, 1.2);
        assert!(dir.x > 0.0);
        let dir = get_ray_direction(Vec3::ZERO, Vec3::NEG_Z, Vec2::new(0.5, 1.0), 1.0, 1.2);
        assert!(dir.y > 0.0);
    }

    #[test]
    fn test_overhead_click_hits_ground_below() {
        let camera = camera_at(Vec3::new(2.0, 10.0, 3.0), Vec3::new(2.0, 0.0, 3.0));
        let hit = raycast_to_plane(&camera, Vec2::splat(0.5), 0.0).expect("ground hit");
        assert!((hit - Vec3::new(2.0, 0.0, 3.0)).length() < 1e-3);
    }

    #[test]
    fn test_sky_click_misses_ground() {
        let camera = camera_at(Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.0, 3.0, -5.0));
        assert!(raycast_to_plane(&camera, Vec2::new(0.5, 0.9), 0.0).is_none());
    }
}
