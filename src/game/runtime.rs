//! Play Runtime
//!
//! Host-facing entry point. Owns the scene and the script source, builds a
//! [`Session`] on [`PlayRuntime::start`] and tears it down on
//! [`PlayRuntime::stop`]. The host calls [`PlayRuntime::update`] once per
//! fixed step and forwards discrete input between updates.
//!
//! All methods except `start` are no-ops while stopped.

use glam::Vec2;

use crate::camera::screen_ray;
use crate::game::config::PlaySettings;
use crate::game::error::RuntimeError;
use crate::game::script::ast::ScriptSource;
use crate::game::script::dispatcher::GameEvent;
use crate::game::session::Session;
use crate::game::state::Outcome;
use crate::game::tasks::ParticleInstance;
use crate::game::tasks::animation::TrailPoint;
use crate::game::ui::{HudSnapshot, Presentation, UiScreenDef};
use crate::input::KeyCode;
use crate::physics::Projectile;
use crate::player::{ControlScheme, PlayerController};
use crate::world::{ObjectId, Scene};

/// Longest click pick distance (meters).
pub const CLICK_RANGE: f32 = 500.0;

/// A scene plus the scripts that run on it.
pub struct PlayRuntime<S: Scene> {
    scene: S,
    scripts: Box<dyn ScriptSource>,
    session: Option<Session>,
}

impl<S: Scene> PlayRuntime<S> {
    pub fn new(scene: S, scripts: impl ScriptSource + 'static) -> Self {
        Self {
            scene,
            scripts: Box::new(scripts),
            session: None,
        }
    }

    /// Enter play mode. A running session is stopped first.
    pub fn start(&mut self, settings: PlaySettings) -> Result<(), RuntimeError> {
        self.stop();

        let mut session = Session::new(&mut self.scene, self.scripts.as_ref(), settings)?;
        let started = session.dispatch(&self.scene, &GameEvent::Start, None);
        session.settle(&mut self.scene);
        session.update_camera(&mut self.scene, 0.0);

        tracing::info!(
            "play started: {:?}, {} onStart script(s), {} routine(s) live",
            session.settings.scheme,
            started,
            session.routines.len()
        );
        self.session = Some(session);
        Ok(())
    }

    /// Leave play mode and restore the scene. No-op when stopped.
    pub fn stop(&mut self) {
        let Some(mut session) = self.session.take() else { return };
        let spawned = session.spawned.len();
        session.teardown(&mut self.scene);
        tracing::info!(
            "play stopped after {} frame(s), {} spawned object(s) removed",
            session.tick,
            spawned
        );
    }

    /// Advance one fixed step.
    pub fn update(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.advance(&mut self.scene);
        }
    }

    pub fn key_down(&mut self, key: KeyCode) {
        let Some(session) = self.session.as_mut() else { return };
        // Auto-repeat of a held key is not a new press
        if !session.input.keyboard.handle_key(key, true) || session.game.is_over() {
            return;
        }
        session.dispatch(&self.scene, &GameEvent::KeyPress(key), None);
        session.settle(&mut self.scene);
    }

    pub fn key_up(&mut self, key: KeyCode) {
        if let Some(session) = self.session.as_mut() {
            session.input.keyboard.handle_key(key, false);
        }
    }

    /// Accumulate mouse look movement in pixels.
    pub fn mouse_motion(&mut self, dx: f32, dy: f32) {
        if let Some(session) = self.session.as_mut() {
            session.input.add_look_delta(dx, dy);
        }
    }

    /// Click at normalized screen coordinates, `(0, 0)` bottom-left.
    ///
    /// Fires `onClick` on the object under the cursor; in point-click mode
    /// also sets the player's walk target.
    pub fn click(&mut self, u: f32, v: f32) {
        let Some(session) = self.session.as_mut() else { return };
        let uv = Vec2::new(u, v);
        session.input.last_click = Some(uv);
        if session.game.is_over() {
            return;
        }

        let ray = screen_ray(self.scene.camera(), uv);
        let picked = self
            .scene
            .raycast(ray.origin, ray.direction, CLICK_RANGE)
            .and_then(|(id, _)| session.live_object(&self.scene, id));
        if let Some(id) = picked {
            session.dispatch(&self.scene, &GameEvent::Click, Some(id));
        }

        if session.settings.scheme == ControlScheme::PointClick {
            if let Some(point) = ray.hit_plane(session.player.position.y) {
                session.player.move_target = Some(point);
            }
        }
        session.settle(&mut self.scene);
    }

    /// Close the front dialog. Its waiting routine resumes on the next update.
    pub fn acknowledge_dialog(&mut self) -> bool {
        self.session
            .as_mut()
            .and_then(|s| s.presentation.acknowledge())
            .is_some()
    }

    /// Press button `index` on a visible UI screen; broadcasts its message.
    pub fn press_ui_button(&mut self, screen: &str, index: usize) -> bool {
        let Some(session) = self.session.as_mut() else { return false };
        let Some(message) = session.screens.press_button(screen, index) else {
            return false;
        };
        session.dispatch(&self.scene, &GameEvent::Message(message), None);
        session.settle(&mut self.scene);
        true
    }

    /// Raise an event from the host, optionally for one object only.
    ///
    /// Returns how many scripts it started.
    pub fn trigger_event(&mut self, event: GameEvent, target: Option<ObjectId>) -> usize {
        let Some(session) = self.session.as_mut() else { return 0 };
        if session.game.is_over() {
            return 0;
        }
        let started = session.dispatch(&self.scene, &event, target);
        session.settle(&mut self.scene);
        started
    }

    /// Fire a player shot now, cooldown permitting.
    pub fn fire(&mut self) -> bool {
        match self.session.as_mut() {
            Some(session) if !session.game.is_over() => session.fire_player(&self.scene),
            _ => false,
        }
    }

    // === Accessors ===

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn hud(&self) -> Option<HudSnapshot> {
        self.session.as_ref().map(|s| s.hud(&self.scene))
    }

    pub fn presentation(&self) -> Option<&Presentation> {
        self.session.as_ref().map(|s| &s.presentation)
    }

    pub fn visible_screens(&self) -> Vec<&UiScreenDef> {
        self.session.as_ref().map(|s| s.screens.visible()).unwrap_or_default()
    }

    pub fn player(&self) -> Option<&PlayerController> {
        self.session.as_ref().map(|s| &s.player)
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.session.as_ref().and_then(|s| s.game.outcome)
    }

    /// Simulated seconds since start.
    pub fn time(&self) -> f32 {
        self.session.as_ref().map_or(0.0, |s| s.time)
    }

    pub fn task_count(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.tasks.len())
    }

    pub fn particle_instances(&self) -> Vec<ParticleInstance> {
        self.session
            .as_ref()
            .map(|s| s.tasks.particle_instances())
            .unwrap_or_default()
    }

    /// Live projectiles, for drawing.
    pub fn projectiles(&self) -> Vec<Projectile> {
        self.session
            .as_ref()
            .map(|s| s.projectiles.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn trail_points(&self) -> Vec<TrailPoint> {
        self.session.as_ref().map(|s| s.tasks.trail_points()).unwrap_or_default()
    }

    /// Sound cues raised since the last call.
    pub fn take_sounds(&mut self) -> Vec<String> {
        self.session
            .as_mut()
            .map(|s| s.presentation.take_sounds())
            .unwrap_or_default()
    }
}
