//! Play Settings
//!
//! Everything the host chooses when entering play mode. Serialized as the
//! `settings` block of a project file; missing fields take the defaults
//! below.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::tuning::CollisionTuning;
use crate::game::error::RuntimeError;
use crate::input::KeyBindings;
use crate::player::ControlScheme;

/// Length of one simulation step in seconds, before time scaling.
pub const FIXED_STEP: f32 = 1.0 / 60.0;

/// Per-session configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlaySettings {
    pub scheme: ControlScheme,
    /// Walk speed (units/second)
    pub speed: f32,
    /// Jump launch velocity (units/second)
    pub jump_force: f32,
    /// Gravity (units/second squared, applied downward)
    pub gravity: f32,
    /// Mouse look sensitivity (radians per pixel)
    pub sensitivity: f32,
    pub key_bindings: KeyBindings,
    /// Orbit distance for the third-person camera
    pub third_person_distance: f32,
    /// Simulation speed multiplier
    pub time_scale: f32,
    /// Seed for every random draw in the session
    pub seed: u64,
    /// Solid floor at y = 0
    pub ground_plane: bool,
    /// Falling below this height respawns the player
    pub death_plane_y: f32,
    pub starting_health: f32,
    pub max_health: f32,
    /// Starting lives; `None` disables the lives counter
    pub lives: Option<i32>,
    /// Player fire cooldown (seconds)
    pub fire_cooldown: f32,
    /// Damage immunity after taking a hit (seconds)
    pub invincibility: f32,
    /// Fallback spawn point when the scene has no spawn marker
    pub spawn_point: Option<Vec3>,
    pub tuning: CollisionTuning,
}

impl Default for PlaySettings {
    fn default() -> Self {
        Self {
            scheme: ControlScheme::FirstPerson,
            speed: 6.0,
            jump_force: 8.0,
            gravity: 20.0,
            sensitivity: 0.003,
            key_bindings: KeyBindings::default(),
            third_person_distance: 6.0,
            time_scale: 1.0,
            seed: 0,
            ground_plane: true,
            death_plane_y: -50.0,
            starting_health: 100.0,
            max_health: 100.0,
            lives: None,
            fire_cooldown: 0.3,
            invincibility: 1.0,
            spawn_point: None,
            tuning: CollisionTuning::default(),
        }
    }
}

impl PlaySettings {
    /// Reject settings the simulation cannot run with.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        fn check(ok: bool, what: &str) -> Result<(), RuntimeError> {
            if ok {
                Ok(())
            } else {
                Err(RuntimeError::InvalidSettings(what.to_string()))
            }
        }

        check(self.time_scale.is_finite() && self.time_scale > 0.0, "timeScale must be positive")?;
        check(self.speed.is_finite() && self.speed >= 0.0, "speed must be non-negative")?;
        check(self.jump_force.is_finite() && self.jump_force >= 0.0, "jumpForce must be non-negative")?;
        check(self.gravity.is_finite() && self.gravity >= 0.0, "gravity must be non-negative")?;
        check(self.max_health > 0.0, "maxHealth must be positive")?;
        check(
            self.starting_health > 0.0 && self.starting_health <= self.max_health,
            "startingHealth must be in (0, maxHealth]",
        )?;
        check(self.lives.is_none_or(|l| l > 0), "lives must be positive when enabled")?;
        check(self.fire_cooldown >= 0.0, "fireCooldown must be non-negative")?;
        check(
            self.tuning.player_height > 0.0 && self.tuning.player_radius > 0.0,
            "player dimensions must be positive",
        )?;
        Ok(())
    }

    /// Simulated seconds per update.
    pub fn step(&self) -> f32 {
        FIXED_STEP * self.time_scale
    }
}
