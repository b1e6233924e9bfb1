//! Heightmap terrain
//!
//! A square grid of height samples centered on `origin`, spanning `size`
//! world units along X and Z. Heights are relative to `origin.y`.
//!
//! Sampling is bilinear between the four surrounding grid points, which is
//! what the player controller stands on when terrain collision is enabled.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Heightmap metadata and samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heightmap {
    /// World-space center of the terrain; `origin.y` is the zero height
    #[serde(default)]
    pub origin: Vec3,
    /// Edge length of the square terrain in world units
    pub size: f32,
    /// Samples per edge (grid is `resolution x resolution`, row-major in Z)
    pub resolution: usize,
    /// Row-major heights, `heights[z * resolution + x]`
    pub heights: Vec<f32>,
    /// Whether the player collides with the surface
    #[serde(default = "default_collision")]
    pub collision: bool,
}

fn default_collision() -> bool {
    true
}

impl Heightmap {
    /// Flat terrain at constant height.
    pub fn flat(size: f32, resolution: usize, height: f32) -> Self {
        let resolution = resolution.max(2);
        Self {
            origin: Vec3::ZERO,
            size,
            resolution,
            heights: vec![height; resolution * resolution],
            collision: true,
        }
    }

    /// Terrain with heights produced by `f(x, z)` at each grid point (world coords).
    pub fn from_fn(size: f32, resolution: usize, f: impl Fn(f32, f32) -> f32) -> Self {
        let resolution = resolution.max(2);
        let step = size / (resolution - 1) as f32;
        let half = size * 0.5;
        let mut heights = Vec::with_capacity(resolution * resolution);
        for zi in 0..resolution {
            for xi in 0..resolution {
                heights.push(f(xi as f32 * step - half, zi as f32 * step - half));
            }
        }
        Self {
            origin: Vec3::ZERO,
            size,
            resolution,
            heights,
            collision: true,
        }
    }

    fn sample(&self, xi: usize, zi: usize) -> f32 {
        self.heights
            .get(zi * self.resolution + xi)
            .copied()
            .unwrap_or(0.0)
    }

    /// Bilinearly interpolated world height at `(x, z)`.
    ///
    /// Returns `None` outside the terrain footprint or for a degenerate grid.
    pub fn height_at(&self, x: f32, z: f32) -> Option<f32> {
        if self.resolution < 2 || self.size <= 0.0 {
            return None;
        }
        let cells = (self.resolution - 1) as f32;
        let u = ((x - self.origin.x) / self.size + 0.5) * cells;
        let v = ((z - self.origin.z) / self.size + 0.5) * cells;
        if !(0.0..=cells).contains(&u) || !(0.0..=cells).contains(&v) {
            return None;
        }

        let x0 = (u.floor() as usize).min(self.resolution - 2);
        let z0 = (v.floor() as usize).min(self.resolution - 2);
        let fx = u - x0 as f32;
        let fz = v - z0 as f32;

        let h00 = self.sample(x0, z0);
        let h10 = self.sample(x0 + 1, z0);
        let h01 = self.sample(x0, z0 + 1);
        let h11 = self.sample(x0 + 1, z0 + 1);

        let top = h00 + (h10 - h00) * fx;
        let bottom = h01 + (h11 - h01) * fx;
        Some(self.origin.y + top + (bottom - top) * fz)
    }
}
