//! Input Module
//!
//! Platform-agnostic input state for play mode. The host feeds discrete
//! key and pointer events in; the runtime reads held keys through the
//! action binding table and consumes accumulated mouse-look deltas once per
//! frame.
//!
//! # Example
//!
//! ```rust,ignore
//! use blockplay_engine::input::{InputState, KeyCode, KeyBindings, InputAction};
//!
//! let mut input = InputState::new();
//! let bindings = KeyBindings::default();
//! input.keyboard.handle_key(KeyCode::W, true);
//! assert!(input.is_action_active(&bindings, InputAction::MoveForward));
//! ```

pub mod bindings;
pub mod keyboard;

pub use bindings::{InputAction, KeyBindings};
pub use keyboard::{KeyCode, KeyboardState};

use glam::Vec2;

/// Combined keyboard and pointer state.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pub keyboard: KeyboardState,
    /// Mouse motion accumulated since the last frame (pixels)
    pub look_delta: Vec2,
    /// Last pointer click in normalized screen coordinates, bottom-left origin
    pub last_click: Option<Vec2>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the key bound to `action` is held.
    pub fn is_action_active(&self, bindings: &KeyBindings, action: InputAction) -> bool {
        bindings.is_action_pressed(action, self.keyboard.pressed())
    }

    /// Signed axis from two opposing actions (-1, 0 or 1).
    pub fn axis(&self, bindings: &KeyBindings, positive: InputAction, negative: InputAction) -> f32 {
        let p = self.is_action_active(bindings, positive) as i32;
        let n = self.is_action_active(bindings, negative) as i32;
        (p - n) as f32
    }

    /// Accumulate raw mouse motion.
    pub fn add_look_delta(&mut self, dx: f32, dy: f32) {
        self.look_delta += Vec2::new(dx, dy);
    }

    /// Take and clear the accumulated mouse motion.
    pub fn take_look_delta(&mut self) -> Vec2 {
        std::mem::take(&mut self.look_delta)
    }

    /// Reset all input state to defaults.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
