//! Projectile kinematics
//!
//! Game projectiles are fast, straight-flying bolts: they advance by
//! `velocity * dt` with an optional gravity term, expire after a fixed
//! lifetime, die on ground contact, and despawn when they leave a bounded
//! radius around the world origin.
//!
//! # Example
//!
//! ```ignore
//! use blockplay_engine::physics::ballistics::{Projectile, BallisticsConfig, Shooter};
//! use glam::Vec3;
//!
//! let config = BallisticsConfig::default();
//! let mut bolt = Projectile::spawn(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Z, 30.0, Shooter::Player);
//! let state = bolt.integrate(&config, 1.0 / 60.0);
//! ```

use glam::Vec3;

use crate::world::ObjectId;

/// Default projectile speed (units/second).
pub const DEFAULT_PROJECTILE_SPEED: f32 = 30.0;
/// Default damage dealt on hit.
pub const DEFAULT_PROJECTILE_DAMAGE: f32 = 10.0;
/// Default lifetime in seconds.
pub const DEFAULT_PROJECTILE_LIFETIME: f32 = 3.0;
/// Default collision radius.
pub const DEFAULT_PROJECTILE_SIZE: f32 = 0.2;

/// Who fired a projectile. Used for owner exclusion and fire-rate bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Shooter {
    Player,
    Object(ObjectId),
}

/// A projectile in flight.
#[derive(Debug, Clone, Copy)]
pub struct Projectile {
    /// Current position in world space
    pub position: Vec3,
    /// Current velocity (units/second)
    pub velocity: Vec3,
    /// Damage applied to whatever it hits
    pub damage: f32,
    /// Collision radius
    pub radius: f32,
    /// Seconds until the projectile expires
    pub lifetime: f32,
    /// Seconds since spawn
    pub elapsed: f32,
    /// Firing entity
    pub owner: Shooter,
    /// RGB color for presentation
    pub color: [f32; 3],
    /// Whether the projectile is still being simulated
    pub active: bool,
}

impl Projectile {
    /// Spawn a projectile with default tuning.
    ///
    /// `direction` is normalized; a zero direction yields a stationary
    /// projectile that simply expires.
    pub fn spawn(position: Vec3, direction: Vec3, speed: f32, owner: Shooter) -> Self {
        Self {
            position,
            velocity: direction.normalize_or_zero() * speed,
            damage: DEFAULT_PROJECTILE_DAMAGE,
            radius: DEFAULT_PROJECTILE_SIZE,
            lifetime: DEFAULT_PROJECTILE_LIFETIME,
            elapsed: 0.0,
            owner,
            color: [1.0, 0.9, 0.2],
            active: true,
        }
    }

    /// Advance the projectile by one time step.
    ///
    /// Semi-implicit Euler: velocity first (gravity), then position.
    pub fn integrate(&mut self, config: &BallisticsConfig, dt: f32) -> ProjectileState {
        if !self.active {
            return ProjectileState::Expired;
        }

        self.velocity += config.gravity * dt;
        self.position += self.velocity * dt;
        self.elapsed += dt;

        if self.elapsed >= self.lifetime {
            self.active = false;
            return ProjectileState::Expired;
        }

        if let Some(ground_y) = config.ground_height {
            if self.position.y <= ground_y {
                self.active = false;
                self.position.y = ground_y;
                return ProjectileState::GroundHit {
                    position: self.position,
                };
            }
        }

        if self.is_beyond_distance(config.max_distance) {
            self.active = false;
            return ProjectileState::OutOfBounds;
        }

        ProjectileState::Flying
    }

    /// Whether the projectile is farther than `max_distance` from the world origin.
    pub fn is_beyond_distance(&self, max_distance: f32) -> bool {
        self.position.length() > max_distance
    }
}

/// Result of one integration step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectileState {
    /// Still flying
    Flying,
    /// Lifetime elapsed
    Expired,
    /// Touched the ground plane
    GroundHit { position: Vec3 },
    /// Left the bounded world radius
    OutOfBounds,
}

impl ProjectileState {
    pub fn is_alive(&self) -> bool {
        matches!(self, ProjectileState::Flying)
    }
}

/// Global projectile environment.
#[derive(Debug, Clone, Copy)]
pub struct BallisticsConfig {
    /// Gravity applied to projectiles (zero for straight bolts)
    pub gravity: Vec3,
    /// Ground plane height, or `None` when there is no ground plane
    pub ground_height: Option<f32>,
    /// Radius around the origin beyond which projectiles despawn
    pub max_distance: f32,
}

impl Default for BallisticsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::ZERO,
            ground_height: Some(0.0),
            max_distance: 300.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_normalizes_direction() {
        let p = Projectile::spawn(Vec3::ZERO, Vec3::new(0.0, 0.0, -4.0), 30.0, Shooter::Player);
        assert!((p.velocity.length() - 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_expires_after_lifetime() {
        let config = BallisticsConfig::default();
        let mut p = Projectile::spawn(Vec3::new(0.0, 1.0, 0.0), Vec3::X, 1.0, Shooter::Player);
        p.lifetime = 0.5;
        let mut state = ProjectileState::Flying;
        for _ in 0..40 {
            state = p.integrate(&config, 1.0 / 60.0);
            if !state.is_alive() {
                break;
            }
        }
        assert_eq!(state, ProjectileState::Expired);
        assert!(!p.active);
    }

    #[test]
    fn test_ground_contact() {
        let config = BallisticsConfig::default();
        let mut p = Projectile::spawn(Vec3::new(0.0, 0.1, 0.0), Vec3::NEG_Y, 30.0, Shooter::Player);
        let state = p.integrate(&config, 1.0 / 60.0);
        assert!(matches!(state, ProjectileState::GroundHit { .. }));
        assert_eq!(p.position.y, 0.0);
    }

    #[test]
    fn test_out_of_bounds() {
        let config = BallisticsConfig {
            max_distance: 10.0,
            ..BallisticsConfig::default()
        };
        let mut p = Projectile::spawn(Vec3::new(9.9, 1.0, 0.0), Vec3::X, 30.0, Shooter::Player);
        assert_eq!(p.integrate(&config, 1.0 / 60.0), ProjectileState::OutOfBounds);
    }
}
