//! Player Movement Controller
//!
//! Kinematic controller for the play-mode avatar. One frame of movement is:
//!
//! 1. look (yaw/pitch) from mouse delta and look keys,
//! 2. desired horizontal velocity from input, mapped through the control scheme,
//! 3. jump and gravity on the vertical velocity, then integration.
//!
//! Collision resolution against the scene happens afterwards in the game's
//! collision system, which is why [`PlayerController::step`] clears
//! `is_grounded` and returns the previous feet position.
//!
//! # Usage
//!
//! ```rust,ignore
//! use blockplay_engine::player::{PlayerController, MovementInput, ControlScheme};
//! use glam::Vec3;
//!
//! let mut player = PlayerController::new(ControlScheme::FirstPerson, Vec3::ZERO);
//! let prev = player.step(&MovementInput::default(), 1.0 / 60.0, 0.0);
//! // ... resolve collisions using `prev` ...
//! ```

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Walk speed in units per second
pub const DEFAULT_SPEED: f32 = 6.0;

/// Sprint speed multiplier
pub const SPRINT_MULTIPLIER: f32 = 1.6;

/// Jump velocity in units per second
pub const DEFAULT_JUMP_FORCE: f32 = 8.0;

/// Gravity acceleration in units per second squared
pub const DEFAULT_GRAVITY: f32 = 20.0;

/// Terminal fall speed
pub const MAX_FALL_SPEED: f32 = 50.0;

/// Turn rate for look keys (radians per second)
pub const KEY_LOOK_SPEED: f32 = 2.5;

/// Point-click arrival distance
pub const ARRIVE_DISTANCE: f32 = 0.15;

/// Pitch limit in radians (about 80 degrees)
pub const PITCH_LIMIT: f32 = 1.4;

/// Player input/camera mode, fixed for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlScheme {
    #[default]
    FirstPerson,
    ThirdPerson,
    TopDown,
    PointClick,
}

impl ControlScheme {
    /// Whether yaw/pitch look input applies in this scheme.
    pub fn uses_look(self) -> bool {
        matches!(self, ControlScheme::FirstPerson | ControlScheme::ThirdPerson)
    }
}

/// Per-frame movement intent, already mapped from physical keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct MovementInput {
    /// Forward/back axis (-1..1)
    pub forward: f32,
    /// Strafe axis (-1..1), positive is right
    pub right: f32,
    /// Look keys: positive turns right
    pub turn: f32,
    /// Look keys: positive looks up
    pub tilt: f32,
    /// Mouse motion in pixels since last frame
    pub look_delta: Vec2,
    pub jump: bool,
    pub sprint: bool,
}

/// Kinematic player state.
#[derive(Debug, Clone)]
pub struct PlayerController {
    /// Feet position in world space
    pub position: Vec3,
    /// Full velocity; `y` is vertical
    pub velocity: Vec3,
    /// Base horizontal speed
    pub speed: f32,
    /// Jump launch velocity
    pub jump_force: f32,
    /// Gravity acceleration (positive number, applied downward)
    pub gravity: f32,
    pub max_fall_speed: f32,
    /// Whether the player stood on something at the end of last frame
    pub is_grounded: bool,
    /// Horizontal facing (radians); forward is `(sin yaw, 0, -cos yaw)`
    pub yaw: f32,
    /// Vertical look angle (radians), positive is up
    pub pitch: f32,
    pub scheme: ControlScheme,
    /// Mouse look sensitivity (radians per pixel)
    pub sensitivity: f32,
    /// Point-click destination
    pub move_target: Option<Vec3>,
    /// Temporary speed multiplier from pickups
    pub speed_boost: f32,
    /// Session time at which the boost ends
    pub boost_until: f32,
}

impl PlayerController {
    pub fn new(scheme: ControlScheme, spawn: Vec3) -> Self {
        Self {
            position: spawn,
            velocity: Vec3::ZERO,
            speed: DEFAULT_SPEED,
            jump_force: DEFAULT_JUMP_FORCE,
            gravity: DEFAULT_GRAVITY,
            max_fall_speed: MAX_FALL_SPEED,
            is_grounded: false,
            yaw: 0.0,
            pitch: 0.0,
            scheme,
            sensitivity: 0.003,
            move_target: None,
            speed_boost: 1.0,
            boost_until: 0.0,
        }
    }

    /// Horizontal facing direction.
    pub fn forward(&self) -> Vec3 {
        Vec3::new(self.yaw.sin(), 0.0, -self.yaw.cos())
    }

    /// View direction including pitch.
    pub fn look_direction(&self) -> Vec3 {
        let (sp, cp) = self.pitch.sin_cos();
        Vec3::new(self.yaw.sin() * cp, sp, -self.yaw.cos() * cp)
    }

    pub fn eye_position(&self, eye_height: f32) -> Vec3 {
        self.position + Vec3::new(0.0, eye_height, 0.0)
    }

    /// Apply look input for schemes that have free look.
    pub fn apply_look(&mut self, input: &MovementInput, dt: f32) {
        if !self.scheme.uses_look() {
            return;
        }
        self.yaw += input.look_delta.x * self.sensitivity + input.turn * KEY_LOOK_SPEED * dt;
        self.pitch -= input.look_delta.y * self.sensitivity;
        self.pitch += input.tilt * KEY_LOOK_SPEED * dt;
        self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Effective horizontal speed at `now`, including sprint and boosts.
    pub fn current_speed(&self, sprint: bool, now: f32) -> f32 {
        let boost = if now < self.boost_until { self.speed_boost } else { 1.0 };
        let sprint = if sprint { SPRINT_MULTIPLIER } else { 1.0 };
        self.speed * boost * sprint
    }

    /// Desired horizontal velocity for this frame (stage 1).
    pub fn desired_horizontal(&mut self, input: &MovementInput, now: f32) -> Vec3 {
        let speed = self.current_speed(input.sprint, now);
        match self.scheme {
            ControlScheme::FirstPerson | ControlScheme::ThirdPerson => {
                let forward = self.forward();
                let right = Vec3::new(-forward.z, 0.0, forward.x);
                (forward * input.forward + right * input.right).normalize_or_zero() * speed
            }
            ControlScheme::TopDown => {
                Vec3::new(input.right, 0.0, -input.forward).normalize_or_zero() * speed
            }
            ControlScheme::PointClick => {
                let Some(target) = self.move_target else {
                    return Vec3::ZERO;
                };
                let mut to_target = target - self.position;
                to_target.y = 0.0;
                if to_target.length() <= ARRIVE_DISTANCE {
                    self.move_target = None;
                    return Vec3::ZERO;
                }
                self.yaw = to_target.x.atan2(-to_target.z);
                to_target.normalize() * speed
            }
        }
    }

    /// Advance one frame of movement (stages 1 and 2).
    ///
    /// Returns the feet position before integration, which the collision
    /// pass needs to tell landing from side contact.
    pub fn step(&mut self, input: &MovementInput, dt: f32, now: f32) -> Vec3 {
        let previous = self.position;

        self.apply_look(input, dt);
        let horizontal = self.desired_horizontal(input, now);
        self.velocity.x = horizontal.x;
        self.velocity.z = horizontal.z;

        if input.jump && self.is_grounded {
            self.velocity.y = self.jump_force;
        }
        self.velocity.y = (self.velocity.y - self.gravity * dt).max(-self.max_fall_speed);

        self.position += self.velocity * dt;
        self.is_grounded = false;

        previous
    }

    /// Put the player at `position` with no momentum.
    pub fn respawn(&mut self, position: Vec3) {
        self.position = position;
        self.velocity = Vec3::ZERO;
        self.is_grounded = false;
        self.move_target = None;
    }
}
