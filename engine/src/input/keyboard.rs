//! Keyboard Input Module
//!
//! Generic key codes independent of any windowing system, plus the set of
//! currently held keys. Keys are named by short labels (`"w"`, `"space"`,
//! `"arrowup"`, `"1"`) because that is how compiled scripts and settings
//! files refer to them.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Generic key codes, independent of the host windowing system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum KeyCode {
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    Space,
    Enter,
    Escape,
    Tab,
    Backspace,
    ShiftLeft,
    ShiftRight,
    ControlLeft,
    ControlRight,
}

const LETTERS: [KeyCode; 26] = [
    KeyCode::A, KeyCode::B, KeyCode::C, KeyCode::D, KeyCode::E, KeyCode::F, KeyCode::G,
    KeyCode::H, KeyCode::I, KeyCode::J, KeyCode::K, KeyCode::L, KeyCode::M, KeyCode::N,
    KeyCode::O, KeyCode::P, KeyCode::Q, KeyCode::R, KeyCode::S, KeyCode::T, KeyCode::U,
    KeyCode::V, KeyCode::W, KeyCode::X, KeyCode::Y, KeyCode::Z,
];

const DIGITS: [KeyCode; 10] = [
    KeyCode::Digit0, KeyCode::Digit1, KeyCode::Digit2, KeyCode::Digit3, KeyCode::Digit4,
    KeyCode::Digit5, KeyCode::Digit6, KeyCode::Digit7, KeyCode::Digit8, KeyCode::Digit9,
];

impl KeyCode {
    /// Parse a key label.
    ///
    /// Accepts single characters (`"w"`, `"W"`, `"5"`, `" "`), DOM-style
    /// codes (`"KeyW"`, `"Digit5"`, `"ArrowUp"`) and short names
    /// (`"space"`, `"up"`, `"shift"`, `"ctrl"`). Case-insensitive.
    pub fn from_label(label: &str) -> Option<Self> {
        if label == " " {
            return Some(KeyCode::Space);
        }
        let lower = label.trim().to_ascii_lowercase();
        let bare = lower
            .strip_prefix("key")
            .filter(|rest| rest.len() == 1)
            .or_else(|| lower.strip_prefix("digit"))
            .unwrap_or(&lower);

        if bare.len() == 1 {
            let c = bare.as_bytes()[0];
            return match c {
                b'a'..=b'z' => Some(LETTERS[(c - b'a') as usize]),
                b'0'..=b'9' => Some(DIGITS[(c - b'0') as usize]),
                _ => None,
            };
        }

        match bare {
            "arrowup" | "up" => Some(KeyCode::ArrowUp),
            "arrowdown" | "down" => Some(KeyCode::ArrowDown),
            "arrowleft" | "left" => Some(KeyCode::ArrowLeft),
            "arrowright" | "right" => Some(KeyCode::ArrowRight),
            "space" | "spacebar" => Some(KeyCode::Space),
            "enter" | "return" => Some(KeyCode::Enter),
            "escape" | "esc" => Some(KeyCode::Escape),
            "tab" => Some(KeyCode::Tab),
            "backspace" => Some(KeyCode::Backspace),
            "shift" | "shiftleft" => Some(KeyCode::ShiftLeft),
            "shiftright" => Some(KeyCode::ShiftRight),
            "ctrl" | "control" | "controlleft" => Some(KeyCode::ControlLeft),
            "controlright" => Some(KeyCode::ControlRight),
            _ => None,
        }
    }

    /// Canonical lowercase label.
    pub fn label(self) -> String {
        if let Some(i) = LETTERS.iter().position(|&k| k == self) {
            return char::from(b'a' + i as u8).to_string();
        }
        if let Some(i) = DIGITS.iter().position(|&k| k == self) {
            return char::from(b'0' + i as u8).to_string();
        }
        match self {
            KeyCode::ArrowUp => "arrowup",
            KeyCode::ArrowDown => "arrowdown",
            KeyCode::ArrowLeft => "arrowleft",
            KeyCode::ArrowRight => "arrowright",
            KeyCode::Space => "space",
            KeyCode::Enter => "enter",
            KeyCode::Escape => "escape",
            KeyCode::Tab => "tab",
            KeyCode::Backspace => "backspace",
            KeyCode::ShiftLeft => "shiftleft",
            KeyCode::ShiftRight => "shiftright",
            KeyCode::ControlLeft => "controlleft",
            KeyCode::ControlRight => "controlright",
            _ => "",
        }
        .to_string()
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl TryFrom<String> for KeyCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        KeyCode::from_label(&value).ok_or_else(|| format!("unknown key label: {value:?}"))
    }
}

impl From<KeyCode> for String {
    fn from(key: KeyCode) -> Self {
        key.label()
    }
}

/// Set of currently held keys.
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    pressed: HashSet<KeyCode>,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key press or release.
    ///
    /// Returns `true` when the key state changed, so held-key auto-repeat
    /// does not count as a fresh press.
    pub fn handle_key(&mut self, key: KeyCode, pressed: bool) -> bool {
        if pressed {
            self.pressed.insert(key)
        } else {
            self.pressed.remove(&key)
        }
    }

    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }

    pub fn any_pressed(&self) -> bool {
        !self.pressed.is_empty()
    }

    pub fn pressed(&self) -> &HashSet<KeyCode> {
        &self.pressed
    }

    pub fn reset(&mut self) {
        self.pressed.clear();
    }
}
