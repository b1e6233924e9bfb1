//! Player Module
//!
//! The play-mode avatar: kinematic movement, control schemes and look.

pub mod movement_controller;

pub use movement_controller::{ControlScheme, MovementInput, PlayerController};
