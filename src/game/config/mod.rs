//! Config Module
//!
//! Play-session settings and collision tuning.

pub mod play_settings;
pub mod tuning;

pub use play_settings::{FIXED_STEP, PlaySettings};
pub use tuning::CollisionTuning;
