//! Collision Tuning
//!
//! Player dimensions and the tolerance bands used by collision resolution.
//! `Default` returns the values the runtime ships with.

use serde::{Deserialize, Serialize};

/// Tolerance bands and player dimensions for collision resolution.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CollisionTuning {
    /// Horizontal player radius (meters)
    pub player_radius: f32,
    /// Feet to head (meters)
    pub player_height: f32,
    /// Feet to eye (meters)
    pub eye_height: f32,
    /// How far above a box top the feet may be and still land on it
    pub land_above: f32,
    /// How far below a box top the feet may have sunk and still land on it
    pub land_below: f32,
    /// Head penetration allowed before a ceiling hit clamps the jump
    pub ceiling_band: f32,
    /// Terrain snap tolerance above the sampled surface
    pub terrain_band: f32,
    /// Player-to-box distance that counts as touching
    pub proximity_radius: f32,
    /// Terminal fall speed (meters/second)
    pub max_fall_speed: f32,
}

impl Default for CollisionTuning {
    fn default() -> Self {
        Self {
            player_radius: 0.4,
            player_height: 1.8,
            eye_height: 1.6,
            land_above: 0.3,
            land_below: 0.5,
            ceiling_band: 0.3,
            terrain_band: 0.3,
            proximity_radius: 0.6,
            max_fall_speed: 50.0,
        }
    }
}
