//! Play-mode overlay
//!
//! Everything the presentation layer draws on top of the scene, produced as
//! plain data: HUD snapshot, speech bubbles, floating texts, announcement
//! banner, screen tint and fade, dialog queue, end screen and sound cues.
//! Every transient item carries an explicit expiry time and is dropped by
//! [`Presentation::expire`].

use std::collections::VecDeque;

use glam::Vec3;

use crate::game::state::Outcome;
use crate::world::ObjectId;

/// Seconds a floating text stays up
pub const FLOAT_TEXT_LIFETIME: f32 = 1.5;

/// Rise speed of floating texts (units/second)
pub const FLOAT_TEXT_RISE: f32 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechBubble {
    /// Speaker; `None` for global scripts (drawn over the player)
    pub speaker: Option<ObjectId>,
    pub text: String,
    pub until: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FloatingText {
    pub text: String,
    pub origin: Vec3,
    pub color: [f32; 3],
    pub born: f32,
}

impl FloatingText {
    pub fn position(&self, now: f32) -> Vec3 {
        self.origin + Vec3::Y * (now - self.born) * FLOAT_TEXT_RISE
    }

    pub fn opacity(&self, now: f32) -> f32 {
        (1.0 - (now - self.born) / FLOAT_TEXT_LIFETIME).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Announcement {
    pub text: String,
    pub until: f32,
}

/// Full-screen color wash fading out over its duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenTint {
    pub color: [f32; 3],
    pub opacity: f32,
    pub start: f32,
    pub until: f32,
}

impl ScreenTint {
    pub fn current_opacity(&self, now: f32) -> f32 {
        let span = (self.until - self.start).max(1e-6);
        self.opacity * (1.0 - ((now - self.start) / span).clamp(0.0, 1.0))
    }
}

/// Fade to black and back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    pub start: f32,
    pub until: f32,
}

impl Fade {
    pub fn current_opacity(&self, now: f32) -> f32 {
        let span = (self.until - self.start).max(1e-6);
        let t = ((now - self.start) / span).clamp(0.0, 1.0);
        1.0 - (2.0 * t - 1.0).abs()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dialog {
    pub id: u64,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndScreen {
    pub outcome: Outcome,
    pub score: f64,
}

/// Floating health bar over an enemy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthBar {
    pub object: ObjectId,
    pub position: Vec3,
    /// Remaining health, 0..1
    pub fraction: f32,
}

/// Per-frame HUD values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HudSnapshot {
    pub health: f32,
    pub max_health: f32,
    pub lives: Option<i32>,
    /// Remaining countdown seconds while the timer runs
    pub timer: Option<f32>,
    pub score: f64,
    /// Variables marked visible with `showVar`, in name order
    pub variables: Vec<(String, f64)>,
    pub inventory: Vec<(String, u32)>,
    pub health_bars: Vec<HealthBar>,
    pub outcome: Option<Outcome>,
}

/// Transient output of a play session.
#[derive(Debug, Default)]
pub struct Presentation {
    pub bubbles: Vec<SpeechBubble>,
    pub floating: Vec<FloatingText>,
    pub announcement: Option<Announcement>,
    pub tint: Option<ScreenTint>,
    pub fade: Option<Fade>,
    pub dialogs: VecDeque<Dialog>,
    pub end_screen: Option<EndScreen>,
    sounds: Vec<String>,
    next_dialog: u64,
}

impl Presentation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show a bubble, replacing the speaker's previous one.
    pub fn say(&mut self, speaker: Option<ObjectId>, text: String, until: f32) {
        self.bubbles.retain(|b| b.speaker != speaker);
        self.bubbles.push(SpeechBubble { speaker, text, until });
    }

    pub fn float_text(&mut self, text: String, origin: Vec3, color: [f32; 3], now: f32) {
        self.floating.push(FloatingText { text, origin, color, born: now });
    }

    pub fn announce(&mut self, text: String, until: f32) {
        self.announcement = Some(Announcement { text, until });
    }

    pub fn tint(&mut self, color: [f32; 3], opacity: f32, now: f32, duration: f32) {
        self.tint = Some(ScreenTint { color, opacity, start: now, until: now + duration });
    }

    pub fn fade(&mut self, now: f32, duration: f32) {
        self.fade = Some(Fade { start: now, until: now + duration });
    }

    /// Queue a dialog; returns the id its acknowledgement will carry.
    pub fn open_dialog(&mut self, text: String) -> u64 {
        self.next_dialog += 1;
        let id = self.next_dialog;
        self.dialogs.push_back(Dialog { id, text });
        id
    }

    /// Dialog currently shown to the player.
    pub fn current_dialog(&self) -> Option<&Dialog> {
        self.dialogs.front()
    }

    /// Close the front dialog, returning its id.
    pub fn acknowledge(&mut self) -> Option<u64> {
        self.dialogs.pop_front().map(|d| d.id)
    }

    pub fn play_sound(&mut self, cue: impl Into<String>) {
        self.sounds.push(cue.into());
    }

    /// Drain the sound cues raised since the last call.
    pub fn take_sounds(&mut self) -> Vec<String> {
        std::mem::take(&mut self.sounds)
    }

    pub fn show_end_screen(&mut self, outcome: Outcome, score: f64) {
        self.end_screen = Some(EndScreen { outcome, score });
    }

    /// Drop a speaker's bubble (e.g. when it is removed).
    pub fn forget_speaker(&mut self, speaker: ObjectId) {
        self.bubbles.retain(|b| b.speaker != Some(speaker));
    }

    /// Drop everything that expired by `now`.
    pub fn expire(&mut self, now: f32) {
        self.bubbles.retain(|b| b.until > now);
        self.floating.retain(|f| now - f.born < FLOAT_TEXT_LIFETIME);
        if self.announcement.as_ref().is_some_and(|a| a.until <= now) {
            self.announcement = None;
        }
        if self.tint.is_some_and(|t| t.until <= now) {
            self.tint = None;
        }
        if self.fade.is_some_and(|f| f.until <= now) {
            self.fade = None;
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transients_expire() {
        let mut p = Presentation::new();
        p.say(Some(ObjectId(1)), "hi".into(), 2.0);
        p.float_text("+1".into(), Vec3::ZERO, [1.0; 3], 0.0);
        p.announce("Go!".into(), 1.0);
        p.tint([1.0, 0.0, 0.0], 0.5, 0.0, 0.5);

        p.expire(1.0);
        assert_eq!(p.bubbles.len(), 1);
        assert_eq!(p.floating.len(), 1);
        assert!(p.announcement.is_none());
        assert!(p.tint.is_none());

        p.expire(2.0);
        assert!(p.bubbles.is_empty());
        assert!(p.floating.is_empty());
    }

    #[test]
    fn test_bubble_replaces_same_speaker() {
        let mut p = Presentation::new();
        p.say(None, "one".into(), 5.0);
        p.say(None, "two".into(), 5.0);
        assert_eq!(p.bubbles.len(), 1);
        assert_eq!(p.bubbles[0].text, "two");
    }

    #[test]
    fn test_dialogs_acknowledged_in_order() {
        let mut p = Presentation::new();
        let a = p.open_dialog("first".into());
        let b = p.open_dialog("second".into());
        assert_eq!(p.current_dialog().map(|d| d.text.as_str()), Some("first"));
        assert_eq!(p.acknowledge(), Some(a));
        assert_eq!(p.acknowledge(), Some(b));
        assert_eq!(p.acknowledge(), None);
    }

    #[test]
    fn test_fade_peaks_midway() {
        let fade = Fade { start: 0.0, until: 2.0 };
        assert_eq!(fade.current_opacity(0.0), 0.0);
        assert_eq!(fade.current_opacity(1.0), 1.0);
        assert_eq!(fade.current_opacity(2.0), 0.0);
    }

    #[test]
    fn test_sounds_drain() {
        let mut p = Presentation::new();
        p.play_sound("hit");
        assert_eq!(p.take_sounds(), vec!["hit".to_string()]);
        assert!(p.take_sounds().is_empty());
    }
}
