//! Projectile lifecycle management system.
//!
//! Owns the collection of active projectiles and their physics config,
//! providing fire / update / remove / iterate operations. Hit testing
//! against scene objects and the player is done by the caller from the
//! returned [`ProjectileUpdate`]s.

use glam::Vec3;

use crate::physics::ballistics::{BallisticsConfig, Projectile, ProjectileState};
use crate::physics::{Aabb, segment_aabb_intersect};

/// Default cap on simultaneously active projectiles.
pub const MAX_PROJECTILES: usize = 64;

/// Distance from the player's body center at which a projectile hits the player.
pub const PLAYER_HIT_RADIUS: f32 = 0.8;

/// Per-projectile data returned by [`ProjectileSystem::update`] so the caller
/// can run collision checks against the world without reaching into the system.
#[derive(Debug, Clone, Copy)]
pub struct ProjectileUpdate {
    /// Index into the internal projectile list (valid until next mutation).
    pub index: usize,
    /// Position before this frame's integration step.
    pub prev_pos: Vec3,
    /// Position after this frame's integration step.
    pub new_pos: Vec3,
    /// Physics state after integration.
    pub state: ProjectileState,
}

/// Manages the full lifecycle of projectiles.
pub struct ProjectileSystem {
    projectiles: Vec<Projectile>,
    config: BallisticsConfig,
    /// Maximum number of simultaneously active projectiles.
    pub max_projectiles: usize,
}

impl ProjectileSystem {
    /// Create a new system with the given ballistics configuration.
    pub fn new(config: BallisticsConfig) -> Self {
        Self {
            projectiles: Vec::new(),
            config,
            max_projectiles: MAX_PROJECTILES,
        }
    }

    /// Spawn a pre-built projectile if under the active limit.
    ///
    /// Returns `true` if the projectile was added.
    pub fn fire(&mut self, projectile: Projectile) -> bool {
        if self.projectiles.len() >= self.max_projectiles {
            tracing::debug!("projectile cap {} reached, shot dropped", self.max_projectiles);
            return false;
        }
        self.projectiles.push(projectile);
        true
    }

    /// Integrate every active projectile.
    ///
    /// Returns a [`ProjectileUpdate`] for every projectile. Callers own the
    /// remove policy so indices remain valid for a full frame.
    pub fn update(&mut self, delta: f32) -> Vec<ProjectileUpdate> {
        self.projectiles
            .iter_mut()
            .enumerate()
            .map(|(index, projectile)| {
                let prev_pos = projectile.position;
                let state = projectile.integrate(&self.config, delta);
                ProjectileUpdate {
                    index,
                    prev_pos,
                    new_pos: projectile.position,
                    state,
                }
            })
            .collect()
    }

    /// Remove a set of projectiles by index.
    ///
    /// Indices are removed highest first so `swap_remove` never moves an
    /// entry that is still pending removal.
    pub fn remove_all(&mut self, mut indices: Vec<usize>) {
        indices.sort_unstable_by(|a, b| b.cmp(a));
        indices.dedup();
        for index in indices {
            self.remove(index);
        }
    }

    /// Remove a projectile by index (after external collision detection).
    pub fn remove(&mut self, index: usize) {
        if index < self.projectiles.len() {
            self.projectiles.swap_remove(index);
        }
    }

    pub fn get(&self, index: usize) -> Option<&Projectile> {
        self.projectiles.get(index)
    }

    /// Remove all projectiles.
    pub fn clear(&mut self) {
        self.projectiles.clear();
    }

    /// Number of currently active projectiles.
    pub fn active_count(&self) -> usize {
        self.projectiles.len()
    }

    /// Iterate over active projectiles (e.g. for presentation).
    pub fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.iter()
    }
}

/// Nearest hit of the segment `from -> to` against `targets`, with the
/// projectile radius folded into each box.
pub fn nearest_box_hit<T: Copy>(
    from: Vec3,
    to: Vec3,
    radius: f32,
    targets: impl IntoIterator<Item = (T, Aabb)>,
) -> Option<(T, Vec3)> {
    targets
        .into_iter()
        .filter_map(|(id, bounds)| {
            segment_aabb_intersect(from, to, &bounds.expanded(radius)).map(|point| (id, point))
        })
        .min_by(|(_, a), (_, b)| from.distance_squared(*a).total_cmp(&from.distance_squared(*b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::Shooter;

    #[test]
    fn test_fire_respects_cap() {
        let mut system = ProjectileSystem::new(BallisticsConfig::default());
        system.max_projectiles = 2;
        let bolt = Projectile::spawn(Vec3::Y, Vec3::X, 10.0, Shooter::Player);
        assert!(system.fire(bolt));
        assert!(system.fire(bolt));
        assert!(!system.fire(bolt));
        assert_eq!(system.active_count(), 2);
    }

    #[test]
    fn test_update_reports_segments() {
        let mut system = ProjectileSystem::new(BallisticsConfig::default());
        system.fire(Projectile::spawn(Vec3::Y, Vec3::X, 60.0, Shooter::Player));
        let updates = system.update(0.5);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].prev_pos, Vec3::Y);
        assert!((updates[0].new_pos.x - 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_remove_all_descending() {
        let mut system = ProjectileSystem::new(BallisticsConfig::default());
        for i in 0..4 {
            system.fire(Projectile::spawn(Vec3::new(i as f32, 1.0, 0.0), Vec3::X, 1.0, Shooter::Player));
        }
        system.remove_all(vec![0, 3, 3]);
        let xs: Vec<f32> = system.iter().map(|p| p.position.x).collect();
        assert_eq!(xs.len(), 2);
        assert!(xs.contains(&1.0) && xs.contains(&2.0));
    }

    #[test]
    fn test_nearest_box_hit() {
        let near = Aabb::from_center_half(Vec3::new(0.0, 1.0, -5.0), Vec3::splat(0.5));
        let far = Aabb::from_center_half(Vec3::new(0.0, 1.0, -10.0), Vec3::splat(0.5));
        let hit = nearest_box_hit(Vec3::Y, Vec3::new(0.0, 1.0, -20.0), 0.2, [(2, far), (1, near)]);
        assert_eq!(hit.map(|(id, _)| id), Some(1));
        assert!(nearest_box_hit(Vec3::Y, Vec3::new(0.0, 1.0, -2.0), 0.2, [(1, near)]).is_none());
    }
}
