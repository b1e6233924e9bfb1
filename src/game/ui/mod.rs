//! UI Module
//!
//! Data-only play-mode output: overlay items, HUD snapshot and custom screens.

pub mod overlay;
pub mod screens;

pub use overlay::{
    Announcement, Dialog, EndScreen, Fade, FloatingText, HealthBar, HudSnapshot, Presentation,
    ScreenTint, SpeechBubble,
};
pub use screens::{UiElement, UiScreenDef, UiScreens};
