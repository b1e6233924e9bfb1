//! Camera Controller Module
//!
//! The play-mode camera rig. Each frame the rig computes a base placement
//! from the player and the control scheme, unless an override is active:
//!
//! - **Switched**: view from an object's position along its facing,
//! - **Pinned**: fixed position set by `moveTo` / `glideTo`,
//! - **Follow**: smoothed chase of an object at a distance.
//!
//! A look-at target, a shake offset and a FOV zoom layer on top of whichever
//! placement is active. The rig is window-system agnostic: it writes the
//! result into the scene's [`Camera`].

use glam::Vec3;

use crate::player::{ControlScheme, PlayerController};
use crate::world::scene::{Camera, ObjectId, Transform};

/// Default field of view in degrees
pub const DEFAULT_FOV: f32 = 75.0;

/// What the camera looks at when a look-at override is set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LookTarget {
    Player,
    Object(ObjectId),
    Point(Vec3),
}

/// Placement override that suspends the scheme's base placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CameraOverride {
    /// View from an object's position along its facing
    Switched(ObjectId),
    /// Fixed position
    Pinned,
    /// Smoothed chase of an object
    Follow { target: ObjectId, distance: f32 },
}

/// Placement parameters per scheme.
#[derive(Clone, Copy, Debug)]
pub struct RigConfig {
    /// Orbit distance behind the player (third person)
    pub third_person_distance: f32,
    /// Height above the player (top down)
    pub top_down_height: f32,
    /// Isometric offset from the player (point click)
    pub isometric_offset: Vec3,
    /// Exponential smoothing rate for follow placements (1/s)
    pub follow_smoothing: f32,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            third_person_distance: 6.0,
            top_down_height: 18.0,
            isometric_offset: Vec3::new(10.0, 12.0, 10.0),
            follow_smoothing: 5.0,
        }
    }
}

/// Camera rig state for one play session.
#[derive(Clone, Debug)]
pub struct CameraRig {
    pub scheme: ControlScheme,
    pub config: RigConfig,
    /// Placement before shake is applied
    pub position: Vec3,
    pub target: Vec3,
    pub override_mode: Option<CameraOverride>,
    pub look_at: Option<LookTarget>,
    /// FOV the session started with
    pub base_fov: f32,
    /// Current FOV in degrees
    pub fov: f32,
    /// Jitter added on output, written by shake tasks
    pub shake_offset: Vec3,
    /// Whether smoothed placements have a previous position to blend from
    settled: bool,
}

impl CameraRig {
    pub fn new(scheme: ControlScheme, config: RigConfig) -> Self {
        Self {
            scheme,
            config,
            position: Vec3::ZERO,
            target: Vec3::NEG_Z,
            override_mode: None,
            look_at: None,
            base_fov: DEFAULT_FOV,
            fov: DEFAULT_FOV,
            shake_offset: Vec3::ZERO,
            settled: false,
        }
    }

    /// Whether base placement is currently suspended.
    pub fn is_overridden(&self) -> bool {
        self.override_mode.is_some()
    }

    /// View from an object until [`CameraRig::switch_back`].
    pub fn switch_to(&mut self, object: ObjectId) {
        self.override_mode = Some(CameraOverride::Switched(object));
    }

    /// Drop every override and return to the scheme's placement.
    pub fn switch_back(&mut self) {
        self.override_mode = None;
        self.look_at = None;
        self.settled = false;
    }

    /// Pin the camera at a fixed position.
    pub fn pin(&mut self, position: Vec3) {
        self.override_mode = Some(CameraOverride::Pinned);
        self.position = position;
    }

    pub fn follow(&mut self, target: ObjectId, distance: f32) {
        self.override_mode = Some(CameraOverride::Follow { target, distance });
    }

    pub fn reset_fov(&mut self) {
        self.fov = self.base_fov;
    }

    /// Base placement for the control scheme: `(position, target)`.
    pub fn base_placement(&self, player: &PlayerController, eye_height: f32) -> (Vec3, Vec3) {
        let eye = player.eye_position(eye_height);
        match self.scheme {
            ControlScheme::FirstPerson => (eye, eye + player.look_direction()),
            ControlScheme::ThirdPerson => {
                let elevation = (0.3 - player.pitch).clamp(-0.2, 1.2);
                let distance = self.config.third_person_distance;
                let back = -player.forward() * distance * elevation.cos();
                let up = Vec3::Y * distance * elevation.sin();
                (eye + back + up, eye)
            }
            ControlScheme::TopDown => {
                // Tiny Z offset keeps the view basis well defined
                let position = player.position + Vec3::new(0.0, self.config.top_down_height, 0.01);
                (position, player.position)
            }
            ControlScheme::PointClick => (player.position + self.config.isometric_offset, player.position),
        }
    }

    /// Advance the rig one frame.
    ///
    /// `resolve` maps an object handle to its current transform; a missing
    /// object cancels the override that referenced it.
    pub fn update<F>(&mut self, player: &PlayerController, eye_height: f32, dt: f32, resolve: F)
    where
        F: Fn(ObjectId) -> Option<Transform>,
    {
        let blend = 1.0 - (-self.config.follow_smoothing * dt).exp();

        match self.override_mode {
            None => {
                let (position, target) = self.base_placement(player, eye_height);
                if self.scheme == ControlScheme::PointClick && self.settled {
                    self.position = self.position.lerp(position, blend);
                } else {
                    self.position = position;
                }
                self.target = target;
            }
            Some(CameraOverride::Switched(object)) => match resolve(object) {
                Some(transform) => {
                    let yaw = transform.rotation.y;
                    let facing = Vec3::new(yaw.sin(), 0.0, -yaw.cos());
                    self.position = transform.position + Vec3::Y * transform.scale.y * 0.5;
                    self.target = self.position + facing;
                }
                None => self.switch_back(),
            },
            Some(CameraOverride::Pinned) => {}
            Some(CameraOverride::Follow { target, distance }) => match resolve(target) {
                Some(transform) => {
                    let desired = transform.position + Vec3::new(0.0, distance * 0.5, distance);
                    self.position = if self.settled { self.position.lerp(desired, blend) } else { desired };
                    self.target = transform.position;
                }
                None => self.switch_back(),
            },
        }
        self.settled = true;

        match self.look_at {
            Some(LookTarget::Player) => self.target = player.eye_position(eye_height),
            Some(LookTarget::Point(point)) => self.target = point,
            Some(LookTarget::Object(object)) => match resolve(object) {
                Some(transform) => self.target = transform.position,
                None => self.look_at = None,
            },
            None => {}
        }
    }

    /// Write the rig's placement into the scene camera.
    pub fn apply(&self, camera: &mut Camera) {
        camera.position = self.position + self.shake_offset;
        camera.target = self.target + self.shake_offset;
        camera.fov = self.fov;
    }
}
