//! Game State
//!
//! Counters and bookkeeping the scripts read and write: health, lives,
//! countdown timer, inventory, variables, HUD selection and the outcome.
//! Zero crossings of health, lives and the timer are edge-triggered through
//! [`ZeroLatch`].

use std::collections::BTreeMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// How a finished session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Won,
    Lost,
}

/// Edge detector for a counter reaching zero.
///
/// Fires once when the value drops to zero or below, and re-arms only after
/// the value goes positive again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZeroLatch {
    armed: bool,
}

impl ZeroLatch {
    pub fn new(initial: f32) -> Self {
        Self { armed: initial > 0.0 }
    }

    /// Feed the current value; `true` on a positive-to-zero crossing.
    pub fn check(&mut self, value: f32) -> bool {
        if value > 0.0 {
            self.armed = true;
            false
        } else if self.armed {
            self.armed = false;
            true
        } else {
            false
        }
    }
}

/// Countdown started by `startTimer`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Countdown {
    pub remaining: f32,
    pub running: bool,
}

/// Counters that crossed zero this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZeroCrossings {
    pub health: bool,
    pub lives: bool,
    pub timer: bool,
}

/// Session-scoped game counters.
#[derive(Debug, Clone)]
pub struct GameState {
    pub health: f32,
    pub max_health: f32,
    /// Session time until which damage is ignored
    pub invincible_until: f32,
    /// Damage immunity window after a hit (seconds)
    pub invincibility: f32,
    pub lives: Option<i32>,
    pub timer: Option<Countdown>,
    /// Item name -> count
    pub inventory: BTreeMap<String, u32>,
    /// Global script variables
    pub variables: BTreeMap<String, f64>,
    /// Variables shown on the HUD, in display order
    pub hud_vars: Vec<String>,
    pub spawn_point: Vec3,
    pub outcome: Option<Outcome>,
    health_latch: ZeroLatch,
    lives_latch: ZeroLatch,
    timer_latch: ZeroLatch,
}

impl GameState {
    pub fn new(health: f32, max_health: f32, lives: Option<i32>, spawn_point: Vec3) -> Self {
        Self {
            health,
            max_health,
            invincible_until: 0.0,
            invincibility: 1.0,
            lives,
            timer: None,
            inventory: BTreeMap::new(),
            variables: BTreeMap::new(),
            hud_vars: Vec::new(),
            spawn_point,
            outcome: None,
            health_latch: ZeroLatch::new(health),
            lives_latch: ZeroLatch::new(lives.unwrap_or(0) as f32),
            timer_latch: ZeroLatch::new(0.0),
        }
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Set the outcome; the first call wins.
    pub fn finish(&mut self, outcome: Outcome) {
        if self.outcome.is_none() {
            self.outcome = Some(outcome);
        }
    }

    // === Health ===

    /// Any positive value re-arms the zero-crossing latch, so a later drop
    /// within the same frame still counts as a new crossing.
    pub fn set_health(&mut self, value: f32) {
        self.health = value.clamp(0.0, self.max_health);
        if self.health > 0.0 {
            self.health_latch.check(self.health);
        }
    }

    pub fn change_health(&mut self, delta: f32) {
        self.set_health(self.health + delta);
    }

    pub fn set_max_health(&mut self, value: f32) {
        self.max_health = value.max(1.0);
        self.health = self.health.min(self.max_health);
    }

    /// Apply damage unless invincible. Returns `true` when the hit landed.
    pub fn damage(&mut self, amount: f32, now: f32) -> bool {
        if amount <= 0.0 || now < self.invincible_until || self.health <= 0.0 {
            return false;
        }
        self.change_health(-amount);
        self.invincible_until = now + self.invincibility;
        true
    }

    pub fn heal(&mut self, amount: f32) {
        self.change_health(amount.max(0.0));
    }

    // === Lives ===

    pub fn set_lives(&mut self, value: i32) {
        let lives = value.max(0);
        self.lives = Some(lives);
        if lives > 0 {
            self.lives_latch.check(lives as f32);
        }
    }

    pub fn change_lives(&mut self, delta: i32) {
        let current = self.lives.unwrap_or(0);
        self.set_lives(current.saturating_add(delta));
    }

    // === Timer ===

    pub fn start_timer(&mut self, seconds: f32) {
        self.timer = Some(Countdown {
            remaining: seconds.max(0.0),
            running: true,
        });
        self.timer_latch = ZeroLatch::new(seconds);
    }

    pub fn stop_timer(&mut self) {
        if let Some(timer) = &mut self.timer {
            timer.running = false;
        }
    }

    /// Count the timer down by `dt`.
    pub fn tick_timer(&mut self, dt: f32) {
        if let Some(timer) = &mut self.timer {
            if timer.running {
                timer.remaining = (timer.remaining - dt).max(0.0);
                if timer.remaining <= 0.0 {
                    timer.running = false;
                }
            }
        }
    }

    /// Check every counter for a zero crossing since the last call.
    pub fn zero_crossings(&mut self) -> ZeroCrossings {
        let timer_value = self.timer.map(|t| t.remaining).unwrap_or(0.0);
        ZeroCrossings {
            health: self.health_latch.check(self.health),
            lives: self.lives.is_some() && self.lives_latch.check(self.lives.unwrap_or(0) as f32),
            timer: self.timer_latch.check(timer_value),
        }
    }

    // === Inventory ===

    pub fn add_item(&mut self, name: &str, count: u32) {
        let held = self.inventory.entry(name.to_string()).or_insert(0);
        *held = held.saturating_add(count);
    }

    pub fn remove_item(&mut self, name: &str, count: u32) {
        if let Some(held) = self.inventory.get_mut(name) {
            *held = held.saturating_sub(count);
            if *held == 0 {
                self.inventory.remove(name);
            }
        }
    }

    pub fn has_item(&self, name: &str) -> bool {
        self.inventory.get(name).is_some_and(|&n| n > 0)
    }

    // === Variables ===

    pub fn var(&self, name: &str) -> f64 {
        self.variables.get(name).copied().unwrap_or(0.0)
    }

    pub fn set_var(&mut self, name: &str, value: f64) {
        self.variables.insert(name.to_string(), value);
    }

    pub fn change_var(&mut self, name: &str, delta: f64) {
        *self.variables.entry(name.to_string()).or_insert(0.0) += delta;
    }

    pub fn show_var(&mut self, name: &str) {
        if !self.hud_vars.iter().any(|v| v == name) {
            self.hud_vars.push(name.to_string());
        }
    }

    pub fn hide_var(&mut self, name: &str) {
        self.hud_vars.retain(|v| v != name);
    }

    pub fn score(&self) -> f64 {
        self.var("score")
    }
}
