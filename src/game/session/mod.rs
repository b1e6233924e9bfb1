//! Play session
//!
//! All state that exists only while play mode runs. A [`Session`] is built
//! on start and dropped on stop, so nothing leaks between runs. Its methods
//! take the scene as a separate `&mut dyn Scene` so the runtime can lend the
//! scene and the session out side by side.
//!
//! One call to [`Session::advance`] is one fixed simulation step:
//!
//! 1. player movement and collision
//! 2. tasks (animations, camera effects, particles)
//! 3. suspended routines whose wake condition holds
//! 4. `onTimer` triggers
//! 5. projectiles and ranged enemies
//! 6. proximity contacts, contact damage, pickups, object overlaps
//! 7. countdown and health/lives zero crossings
//! 8. camera rig
//! 9. overlay expiry, then queued events are drained

mod combat;
mod snapshot;

use std::collections::BTreeSet;

use glam::Vec3;
use rand::SeedableRng;
use rand::rngs::StdRng;

pub use snapshot::SceneSnapshot;

use crate::camera::{CameraRig, RigConfig};
use crate::game::config::{FIXED_STEP, PlaySettings};
use crate::game::error::RuntimeError;
use crate::game::script::ast::ScriptSource;
use crate::game::script::dispatcher::{Dispatcher, GameEvent, RunningScript};
use crate::game::script::ops::{LoweredScript, Trigger};
use crate::game::script::routine::{Owner, RoutineArena};
use crate::game::state::{GameState, Outcome};
use crate::game::systems::collision_system::{BoundsCache, CollisionSystem, ContactTracker};
use crate::game::systems::combat_system::CombatMaps;
use crate::game::systems::projectile_system::ProjectileSystem;
use crate::game::tasks::{Animation, TaskContext, TaskKind, TaskScheduler, TaskTarget};
use crate::game::ui::{HealthBar, HudSnapshot, Presentation, UiScreens};
use crate::input::{InputAction, InputState};
use crate::physics::{Axis, BallisticsConfig};
use crate::player::{MovementInput, PlayerController};
use crate::world::{ObjectId, ObjectKind, QuickAnimation, QuickAnimationKind, Scene, Transform};

/// Slowest and fastest allowed `setTimeScale` values.
pub const TIME_SCALE_RANGE: (f32, f32) = (0.05, 10.0);

/// An `onTimer` script and its next firing time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerTrigger {
    /// Index into the dispatcher's script list
    pub script: usize,
    pub interval: f32,
    pub next_at: f32,
}

/// State of one play-mode run.
pub struct Session {
    pub settings: PlaySettings,
    /// Simulated seconds since start
    pub time: f32,
    /// Completed simulation steps
    pub tick: u64,
    pub time_scale: f32,
    pub rng: StdRng,
    pub player: PlayerController,
    pub rig: CameraRig,
    pub input: InputState,
    pub game: GameState,
    pub tasks: TaskScheduler,
    pub routines: RoutineArena,
    pub dispatcher: Dispatcher,
    pub timers: Vec<TimerTrigger>,
    pub projectiles: ProjectileSystem,
    pub combat: CombatMaps,
    pub bounds: BoundsCache,
    pub player_contacts: ContactTracker<ObjectId>,
    pub object_contacts: ContactTracker<(ObjectId, ObjectId)>,
    pub presentation: Presentation,
    pub screens: UiScreens,
    pub snapshot: SceneSnapshot,
    /// Objects created during play; hard-deleted on stop
    pub spawned: Vec<ObjectId>,
    /// Objects removed by scripts; hidden until stop
    pub removed: BTreeSet<ObjectId>,
}

impl Session {
    /// Build a session for `scene`. Nothing in the scene changes until the
    /// first event is dispatched.
    pub fn new(scene: &mut dyn Scene, source: &dyn ScriptSource, settings: PlaySettings) -> Result<Self, RuntimeError> {
        settings.validate()?;

        let object_scripts = source.object_scripts();
        if let Some((missing, _)) = object_scripts.iter().find(|(id, _)| scene.object(*id).is_none()) {
            return Err(RuntimeError::MissingObject(*missing));
        }

        let snapshot = SceneSnapshot::capture(scene);
        let spawn = find_spawn(scene).or(settings.spawn_point).unwrap_or(Vec3::ZERO);

        let mut player = PlayerController::new(settings.scheme, spawn);
        player.speed = settings.speed;
        player.jump_force = settings.jump_force;
        player.gravity = settings.gravity;
        player.sensitivity = settings.sensitivity;
        player.max_fall_speed = settings.tuning.max_fall_speed;

        let mut rig = CameraRig::new(
            settings.scheme,
            RigConfig {
                third_person_distance: settings.third_person_distance,
                ..RigConfig::default()
            },
        );
        rig.base_fov = scene.camera().fov;
        rig.fov = rig.base_fov;

        let mut game = GameState::new(settings.starting_health, settings.max_health, settings.lives, spawn);
        game.invincibility = settings.invincibility;
        for name in source.custom_variables() {
            game.set_var(name, 0.0);
        }

        let mut scripts = Vec::new();
        for (id, compiled) in &object_scripts {
            scripts.extend(compiled.iter().map(|s| RunningScript::new(Owner::Object(*id), LoweredScript::lower(s))));
        }
        scripts.extend(
            source
                .global_scripts()
                .iter()
                .map(|s| RunningScript::new(Owner::Global, LoweredScript::lower(s))),
        );
        let timers = scripts
            .iter()
            .enumerate()
            .filter_map(|(script, s)| match s.trigger {
                Trigger::Timer { interval } => Some(TimerTrigger { script, interval, next_at: interval }),
                _ => None,
            })
            .collect();

        let ballistics = BallisticsConfig {
            ground_height: settings.ground_plane.then_some(0.0),
            ..BallisticsConfig::default()
        };

        tracing::debug!(
            "session: {} script(s), {} object(s), spawn at {:?}",
            scripts.len(),
            snapshot.len(),
            spawn
        );

        let mut session = Self {
            time: 0.0,
            tick: 0,
            time_scale: settings.time_scale,
            rng: StdRng::seed_from_u64(settings.seed),
            player,
            rig,
            input: InputState::new(),
            game,
            tasks: TaskScheduler::new(),
            routines: RoutineArena::new(),
            dispatcher: Dispatcher::new(scripts),
            timers,
            projectiles: ProjectileSystem::new(ballistics),
            combat: CombatMaps::new(),
            bounds: BoundsCache::new(),
            player_contacts: ContactTracker::new(),
            object_contacts: ContactTracker::new(),
            presentation: Presentation::new(),
            screens: UiScreens::new(source.ui_screens().to_vec()),
            snapshot,
            spawned: Vec::new(),
            removed: BTreeSet::new(),
            settings,
        };
        session.start_quick_animations(scene);
        session.update_camera(scene, 0.0);
        Ok(session)
    }

    /// Undo everything play changed in the scene.
    pub fn teardown(&mut self, scene: &mut dyn Scene) {
        self.snapshot.restore(scene);
        for id in self.spawned.drain(..) {
            scene.remove_object(id);
        }
        self.routines.clear();
        self.dispatcher.clear();
        self.tasks.clear();
        self.projectiles.clear();
        self.combat.clear();
        self.presentation.clear();
        self.bounds.clear();
        self.timers.clear();
        self.player_contacts.clear();
        self.object_contacts.clear();
    }

    /// Whether scripts owned by `owner` may still run.
    pub fn owner_alive(&self, scene: &dyn Scene, owner: Owner) -> bool {
        match owner {
            Owner::Global => true,
            Owner::Object(id) => scene.object(id).is_some() && !self.removed.contains(&id),
        }
    }

    /// Live object handle: present and not removed by a script.
    pub fn live_object(&self, scene: &dyn Scene, id: ObjectId) -> Option<ObjectId> {
        self.owner_alive(scene, Owner::Object(id)).then_some(id)
    }

    /// Hide an object for the rest of the session and drop its side state.
    pub fn soft_remove(&mut self, scene: &mut dyn Scene, id: ObjectId) {
        if let Some(object) = scene.object_mut(id) {
            object.visible = false;
            object.collidable = false;
        }
        self.removed.insert(id);
        self.tasks.cancel_target(TaskTarget::Object(id), &mut self.rig);
        self.combat.forget(id);
        self.presentation.forget_speaker(id);
        self.bounds.invalidate(id);
    }

    /// Record a new object as belonging to this session.
    pub fn track_spawned(&mut self, id: ObjectId) {
        self.spawned.push(id);
    }

    /// End the game with `outcome`.
    pub fn end(&mut self, outcome: Outcome) {
        if self.game.is_over() {
            return;
        }
        self.game.finish(outcome);
        let score = self.game.score();
        self.presentation.show_end_screen(outcome, score);
        self.presentation.play_sound(match outcome {
            Outcome::Won => "win",
            Outcome::Lost => "lose",
        });
        tracing::info!("game over: {:?} with score {}", outcome, score);
    }

    /// Advance the simulation by one fixed step.
    pub fn advance(&mut self, scene: &mut dyn Scene) {
        if self.game.is_over() {
            return;
        }
        let dt = FIXED_STEP * self.time_scale;
        self.time += dt;
        self.tick += 1;

        self.step_player(scene, dt);
        self.step_tasks(scene, dt);
        self.step_routines(scene);
        self.settle(scene);
        self.fire_timers(scene);
        self.step_projectiles(scene, dt);
        self.step_ranged(scene);
        self.step_contacts(scene);
        self.step_counters(scene, dt);
        self.update_camera(scene, dt);
        self.presentation.expire(self.time);
        self.settle(scene);
    }

    fn movement_input(&mut self) -> MovementInput {
        let look_delta = self.input.take_look_delta();
        let bindings = &self.settings.key_bindings;
        let input = &self.input;
        MovementInput {
            forward: input.axis(bindings, InputAction::MoveForward, InputAction::MoveBack),
            right: input.axis(bindings, InputAction::MoveRight, InputAction::MoveLeft),
            turn: input.axis(bindings, InputAction::LookRight, InputAction::LookLeft),
            tilt: input.axis(bindings, InputAction::LookUp, InputAction::LookDown),
            look_delta,
            jump: input.is_action_active(bindings, InputAction::Jump),
            sprint: input.is_action_active(bindings, InputAction::Sprint),
        }
    }

    fn step_player(&mut self, scene: &mut dyn Scene, dt: f32) {
        let input = self.movement_input();
        let previous = self.player.step(&input, dt, self.time);
        let resolution = CollisionSystem::resolve_player(
            &mut self.player,
            previous,
            scene,
            &mut self.bounds,
            &self.settings.tuning,
            self.settings.ground_plane,
            self.settings.death_plane_y,
        );
        if resolution.fell_out {
            tracing::debug!("player fell out of the world, respawning");
            self.player.respawn(self.game.spawn_point);
        }

        if self.input.is_action_active(&self.settings.key_bindings, InputAction::Fire) {
            self.fire_player(scene);
        }
    }

    fn step_tasks(&mut self, scene: &mut dyn Scene, dt: f32) {
        let mut ctx = TaskContext {
            scene,
            rig: &mut self.rig,
            rng: &mut self.rng,
            bounds: &mut self.bounds,
            ground_plane: self.settings.ground_plane,
        };
        self.tasks.step(&mut ctx, dt);
    }

    fn step_counters(&mut self, scene: &mut dyn Scene, dt: f32) {
        self.game.tick_timer(dt);
        let crossings = self.game.zero_crossings();

        if crossings.health {
            let handled = self.dispatch(scene, &GameEvent::HealthZero, None);
            match self.game.lives {
                Some(_) => {
                    self.game.change_lives(-1);
                    if self.game.lives.is_some_and(|l| l > 0) {
                        self.game.set_health(self.game.max_health);
                        self.player.respawn(self.game.spawn_point);
                    }
                }
                None if handled == 0 => self.end(Outcome::Lost),
                None => {}
            }
        }
        // Lives lost this frame are seen on the next check
        if crossings.lives && self.dispatch(scene, &GameEvent::LivesZero, None) == 0 {
            self.end(Outcome::Lost);
        }
        if crossings.timer {
            self.dispatch(scene, &GameEvent::TimerEnd, None);
        }
    }

    /// Advance the camera rig and write it into the scene camera.
    pub fn update_camera(&mut self, scene: &mut dyn Scene, dt: f32) {
        let removed = &self.removed;
        let view: &dyn Scene = scene;
        self.rig.update(&self.player, self.settings.tuning.eye_height, dt, |id| {
            if removed.contains(&id) {
                None
            } else {
                view.object(id).map(|o| o.transform)
            }
        });
        self.rig.apply(scene.camera_mut());
    }

    /// Start the declarative quick animations objects carry from the editor.
    fn start_quick_animations(&mut self, scene: &dyn Scene) {
        for id in scene.object_ids() {
            let Some(object) = scene.object(id) else { continue };
            let Some(quick) = object.quick_animation else { continue };
            let animation = quick_animation(quick, &object.transform);
            self.tasks.upsert(TaskTarget::Object(id), TaskKind::Animation(animation));
        }
    }

    /// Current HUD values.
    pub fn hud(&self, scene: &dyn Scene) -> HudSnapshot {
        let variables = self
            .game
            .hud_vars
            .iter()
            .map(|name| (name.clone(), self.game.var(name)))
            .collect();
        let health_bars = self
            .combat
            .enemies
            .iter()
            .filter_map(|(&id, enemy)| {
                let object = scene.object(id).filter(|o| o.visible)?;
                let top = object.transform.position + Vec3::Y * (object.transform.scale.y * 0.5 + 0.4);
                Some(HealthBar { object: id, position: top, fraction: enemy.fraction() })
            })
            .collect();
        HudSnapshot {
            health: self.game.health,
            max_health: self.game.max_health,
            lives: self.game.lives,
            timer: self.game.timer.filter(|t| t.running).map(|t| t.remaining),
            score: self.game.score(),
            variables,
            inventory: self.game.inventory.iter().map(|(k, &v)| (k.clone(), v)).collect(),
            health_bars,
            outcome: self.game.outcome,
        }
    }
}

/// Position of the first spawn marker.
fn find_spawn(scene: &dyn Scene) -> Option<Vec3> {
    scene
        .object_ids()
        .into_iter()
        .filter_map(|id| scene.object(id))
        .find(|o| o.kind == ObjectKind::Spawn)
        .map(|o| o.transform.position)
}

fn quick_animation(quick: QuickAnimation, pose: &Transform) -> Animation {
    let QuickAnimation { kind, speed, amount } = quick;
    match kind {
        QuickAnimationKind::Spin => Animation::spin(Axis::Y, speed),
        QuickAnimationKind::Bounce => Animation::bounce(amount, speed, pose),
        QuickAnimationKind::Hover => Animation::hover(amount * 0.3, speed * 2.0, pose),
        QuickAnimationKind::Orbit => Animation::orbit(amount, speed, pose),
        QuickAnimationKind::Pulse => Animation::pulse(1.0, 1.0 + amount * 0.2, speed, pose),
        QuickAnimationKind::Wander => Animation::wander(amount * 3.0, speed, pose),
    }
}
