//! Input Bindings Module
//!
//! Maps physical keys to logical actions so game code only ever asks about
//! actions. The binding table comes from the play settings and can be
//! remapped per session.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::KeyCode;

/// Logical input actions that can be bound to physical keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputAction {
    /// Move forward (default: W)
    MoveForward,
    /// Move backward (default: S)
    MoveBack,
    /// Strafe left (default: A)
    MoveLeft,
    /// Strafe right (default: D)
    MoveRight,
    /// Jump (default: Space)
    Jump,
    /// Sprint modifier (default: Shift)
    Sprint,
    /// Turn left (default: Left arrow)
    LookLeft,
    /// Turn right (default: Right arrow)
    LookRight,
    /// Look up (default: Up arrow)
    LookUp,
    /// Look down (default: Down arrow)
    LookDown,
    /// Fire a projectile (default: F)
    Fire,
    /// Acknowledge dialogs (default: Enter)
    Interact,
}

/// Maps physical keys to logical actions, supporting customizable key bindings.
///
/// Serialized as an `action -> key` map, e.g. `{"moveForward": "w"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<InputAction, KeyCode>", into = "BTreeMap<InputAction, KeyCode>")]
pub struct KeyBindings {
    /// Map from physical key to logical action
    key_to_action: HashMap<KeyCode, InputAction>,
    /// Map from logical action to physical key
    action_to_key: HashMap<InputAction, KeyCode>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyBindings {
    /// Create a new KeyBindings instance with default key mappings.
    ///
    /// Default bindings: WASD movement, Space jump, Shift sprint, arrow keys
    /// look, F fire, Enter interact.
    pub fn new() -> Self {
        let mut bindings = Self::empty();

        bindings.bind(KeyCode::W, InputAction::MoveForward);
        bindings.bind(KeyCode::S, InputAction::MoveBack);
        bindings.bind(KeyCode::A, InputAction::MoveLeft);
        bindings.bind(KeyCode::D, InputAction::MoveRight);
        bindings.bind(KeyCode::Space, InputAction::Jump);
        bindings.bind(KeyCode::ShiftLeft, InputAction::Sprint);
        bindings.bind(KeyCode::ArrowLeft, InputAction::LookLeft);
        bindings.bind(KeyCode::ArrowRight, InputAction::LookRight);
        bindings.bind(KeyCode::ArrowUp, InputAction::LookUp);
        bindings.bind(KeyCode::ArrowDown, InputAction::LookDown);
        bindings.bind(KeyCode::F, InputAction::Fire);
        bindings.bind(KeyCode::Enter, InputAction::Interact);

        bindings
    }

    /// Bindings with nothing bound.
    pub fn empty() -> Self {
        Self {
            key_to_action: HashMap::new(),
            action_to_key: HashMap::new(),
        }
    }

    /// Bind a physical key to a logical action.
    ///
    /// Any previous binding of either the key or the action is removed.
    pub fn bind(&mut self, key: KeyCode, action: InputAction) {
        if let Some(old_action) = self.key_to_action.remove(&key) {
            self.action_to_key.remove(&old_action);
        }
        if let Some(old_key) = self.action_to_key.remove(&action) {
            self.key_to_action.remove(&old_key);
        }
        self.key_to_action.insert(key, action);
        self.action_to_key.insert(action, key);
    }

    /// Remove the binding for a specific action.
    pub fn unbind_action(&mut self, action: InputAction) {
        if let Some(key) = self.action_to_key.remove(&action) {
            self.key_to_action.remove(&key);
        }
    }

    /// Get the action bound to a physical key, if any.
    pub fn get_action(&self, key: KeyCode) -> Option<InputAction> {
        self.key_to_action.get(&key).copied()
    }

    /// Get the key bound to a logical action, if any.
    pub fn get_key(&self, action: InputAction) -> Option<KeyCode> {
        self.action_to_key.get(&action).copied()
    }

    /// Check if a specific action is currently pressed, given a set of pressed keys.
    pub fn is_action_pressed(&self, action: InputAction, pressed_keys: &HashSet<KeyCode>) -> bool {
        self.action_to_key
            .get(&action)
            .is_some_and(|key| pressed_keys.contains(key))
    }
}

impl From<BTreeMap<InputAction, KeyCode>> for KeyBindings {
    /// Overrides on top of the defaults, so a settings file only needs the
    /// actions it remaps.
    fn from(map: BTreeMap<InputAction, KeyCode>) -> Self {
        let mut bindings = Self::new();
        for (action, key) in map {
            bindings.bind(key, action);
        }
        bindings
    }
}

impl From<KeyBindings> for BTreeMap<InputAction, KeyCode> {
    fn from(bindings: KeyBindings) -> Self {
        bindings.action_to_key.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bindings() {
        let bindings = KeyBindings::new();
        assert_eq!(bindings.get_action(KeyCode::W), Some(InputAction::MoveForward));
        assert_eq!(bindings.get_action(KeyCode::Space), Some(InputAction::Jump));
        assert_eq!(bindings.get_key(InputAction::Fire), Some(KeyCode::F));
        assert_eq!(bindings.get_key(InputAction::LookLeft), Some(KeyCode::ArrowLeft));
    }

    #[test]
    fn test_rebind_key() {
        let mut bindings = KeyBindings::new();
        bindings.bind(KeyCode::ArrowUp, InputAction::MoveForward);

        assert_eq!(bindings.get_action(KeyCode::W), None);
        assert_eq!(bindings.get_action(KeyCode::ArrowUp), Some(InputAction::MoveForward));
        // Arrow up used to look up; that binding is gone now
        assert_eq!(bindings.get_key(InputAction::LookUp), None);
    }

    #[test]
    fn test_is_action_pressed() {
        let bindings = KeyBindings::new();
        let pressed: HashSet<KeyCode> = [KeyCode::W, KeyCode::ShiftLeft].into_iter().collect();

        assert!(bindings.is_action_pressed(InputAction::MoveForward, &pressed));
        assert!(bindings.is_action_pressed(InputAction::Sprint, &pressed));
        assert!(!bindings.is_action_pressed(InputAction::Jump, &pressed));
    }

    #[test]
    fn test_unbound_action_not_pressed() {
        let mut bindings = KeyBindings::new();
        bindings.unbind_action(InputAction::MoveForward);
        let pressed: HashSet<KeyCode> = [KeyCode::W].into_iter().collect();
        assert!(!bindings.is_action_pressed(InputAction::MoveForward, &pressed));
    }

    #[test]
    fn test_settings_overrides_merge_with_defaults() {
        let bindings: KeyBindings =
            serde_json::from_str(r#"{"jump": "k", "fire": "KeyJ"}"#).expect("valid bindings");
        assert_eq!(bindings.get_key(InputAction::Jump), Some(KeyCode::K));
        assert_eq!(bindings.get_key(InputAction::Fire), Some(KeyCode::J));
        assert_eq!(bindings.get_key(InputAction::MoveForward), Some(KeyCode::W));
    }
}
