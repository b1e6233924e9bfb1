//! Game systems
//!
//! Stateful subsystems stepped by the play session each frame.

pub mod collision_system;
pub mod combat_system;
pub mod projectile_system;

pub use collision_system::{BoundsCache, CollisionSystem, ContactTracker, PlayerResolution};
pub use combat_system::{
    CombatMaps, EnemyHit, Pickup, PickupEffect, PickupKind, ProjectileTuning, RangedAttack,
};
pub use projectile_system::{ProjectileSystem, ProjectileUpdate};
