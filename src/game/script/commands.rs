//! Operation executor
//!
//! One `match` arm per [`Op`]. Object operations act on the script's owner;
//! for global scripts they are no-ops. Missing targets are silently skipped.

use glam::Vec3;

use super::dispatcher::GameEvent;
use super::interpreter::{Flow, MAX_CALL_DEPTH, WAIT_UNTIL_POLL};
use super::ops::{Op, TargetRef};
use super::routine::{Frame, FrameKind, Owner, Routine, Wake};
use crate::camera::LookTarget;
use crate::game::session::{Session, TIME_SCALE_RANGE};
use crate::game::state::Outcome;
use crate::game::systems::combat_system::{Pickup, RangedAttack};
use crate::game::tasks::{Animation, CameraEffect, TaskKind, TaskTarget};
use crate::physics::{Shooter, yaw_towards};
use crate::world::{ObjectId, Scene, SceneObject, Transform};

/// Height above an object's origin where floating text appears.
const TEXT_LIFT: f32 = 1.2;

impl Session {
    /// Resolve an operation target to a live object.
    pub(crate) fn resolve_target(&self, scene: &dyn Scene, owner: Owner, target: &TargetRef) -> Option<ObjectId> {
        let id = match target {
            TargetRef::Owner => owner.object()?,
            TargetRef::Player => return None,
            TargetRef::Named(name) => scene.find_by_name(name)?,
        };
        self.live_object(scene, id)
    }

    /// Mutate the owner object and drop its cached bounds.
    fn edit_owner(&mut self, scene: &mut dyn Scene, owner: Owner, edit: impl FnOnce(&mut SceneObject)) {
        let Some(id) = owner.object() else { return };
        if self.removed.contains(&id) {
            return;
        }
        if let Some(object) = scene.object_mut(id) {
            edit(object);
            self.bounds.invalidate(id);
        }
    }

    fn owner_pose(&self, scene: &dyn Scene, owner: Owner) -> Option<(ObjectId, Transform)> {
        let id = owner.object()?;
        self.live_object(scene, id)?;
        scene.object(id).map(|o| (id, o.transform))
    }

    /// Start or retune an animation on the owner.
    fn animate(&mut self, scene: &dyn Scene, owner: Owner, build: impl FnOnce(&Transform) -> Animation) {
        if let Some((id, pose)) = self.owner_pose(scene, owner) {
            self.tasks
                .upsert(TaskTarget::Object(id), TaskKind::Animation(build(&pose)));
        }
    }

    /// Where effects issued by `owner` appear.
    fn effect_origin(&self, scene: &dyn Scene, owner: Owner) -> Vec3 {
        match self.owner_pose(scene, owner) {
            Some((_, pose)) => pose.position,
            None => self.player_center(),
        }
    }

    fn shooter(owner: Owner) -> Shooter {
        owner.object().map_or(Shooter::Player, Shooter::Object)
    }

    /// Execute one operation for a routine of `owner`.
    pub(crate) fn exec_op(&mut self, scene: &mut dyn Scene, owner: Owner, op: &Op, call_depth: usize) -> Flow {
        match op {
            // === Motion ===
            Op::MoveBy(delta) => self.edit_owner(scene, owner, |o| o.transform.position += *delta),
            Op::MoveTo(position) => self.edit_owner(scene, owner, |o| o.transform.position = *position),
            Op::MoveForward(distance) => self.edit_owner(scene, owner, |o| {
                let yaw = o.transform.rotation.y;
                o.transform.position += Vec3::new(yaw.sin(), 0.0, -yaw.cos()) * *distance;
            }),
            Op::RotateBy { axis, radians } => {
                self.edit_owner(scene, owner, |o| *axis.component_mut(&mut o.transform.rotation) += *radians)
            }
            Op::SetRotation(rotation) => self.edit_owner(scene, owner, |o| o.transform.rotation = *rotation),
            Op::SetScale(scale) => self.edit_owner(scene, owner, |o| o.transform.scale = *scale),
            Op::ScaleBy(factor) => self.edit_owner(scene, owner, |o| o.transform.scale *= *factor),
            Op::GlideTo { target, duration } => {
                if owner.object().is_none() {
                    return Flow::Continue;
                }
                if *duration <= 0.0 {
                    self.edit_owner(scene, owner, |o| o.transform.position = *target);
                    return Flow::Continue;
                }
                self.animate(scene, owner, |pose| Animation::glide(*target, *duration, pose));
                return Flow::Suspend(Wake::At(self.time + duration));
            }
            Op::LookAtPlayer => {
                let player = self.player.position;
                self.edit_owner(scene, owner, |o| {
                    o.transform.rotation.y = yaw_towards(o.transform.position, player);
                });
            }
            Op::Launch { height, distance } => {
                self.animate(scene, owner, |pose| Animation::launch(*height, *distance, pose))
            }
            Op::Fall => self.animate(scene, owner, |_| Animation::fall()),

            // === Animation ===
            Op::Spin { axis, speed } => self.animate(scene, owner, |_| Animation::spin(*axis, *speed)),
            Op::Bounce { height, speed } => {
                self.animate(scene, owner, |pose| Animation::bounce(*height, *speed, pose))
            }
            Op::Hover { amplitude, speed } => {
                self.animate(scene, owner, |pose| Animation::hover(*amplitude, *speed, pose))
            }
            Op::Orbit { radius, speed } => {
                self.animate(scene, owner, |pose| Animation::orbit(*radius, *speed, pose))
            }
            Op::Spiral { radius, speed, rise } => {
                self.animate(scene, owner, |pose| Animation::spiral(*radius, *speed, *rise, pose))
            }
            Op::Wander { radius, speed } => {
                self.animate(scene, owner, |pose| Animation::wander(*radius, *speed, pose))
            }
            Op::Patrol { axis, distance, speed } => {
                self.animate(scene, owner, |pose| Animation::patrol(*axis, *distance, *speed, pose))
            }
            Op::Zigzag { width, speed } => {
                self.animate(scene, owner, |pose| Animation::zigzag(*width, *speed, pose))
            }
            Op::ColorShift { speed } => {
                let Some(id) = owner.object().and_then(|id| self.live_object(scene, id)) else {
                    return Flow::Continue;
                };
                if let Some(object) = scene.object(id) {
                    let animation = Animation::color_shift(*speed, &object.material);
                    self.tasks.upsert(TaskTarget::Object(id), TaskKind::Animation(animation));
                }
            }
            Op::Pulse { min, max, speed } => {
                self.animate(scene, owner, |pose| Animation::pulse(*min, *max, *speed, pose))
            }
            Op::Trail { color } => self.animate(scene, owner, |_| Animation::trail(*color)),
            Op::PlayAnimation { looped } => {
                let Some(id) = owner.object().and_then(|id| self.live_object(scene, id)) else {
                    return Flow::Continue;
                };
                match scene.object(id).and_then(|o| o.animation.clone()) {
                    Some(track) => {
                        let animation = Animation::keyframes(track, *looped);
                        self.tasks.upsert(TaskTarget::Object(id), TaskKind::Animation(animation));
                    }
                    None => tracing::trace!("{:?} has no keyframe track", id),
                }
            }
            Op::StopAnimations => {
                if let Some(id) = owner.object() {
                    self.tasks.cancel_target(TaskTarget::Object(id), &mut self.rig);
                }
            }

            // === Looks ===
            Op::Show => self.edit_owner(scene, owner, |o| o.visible = true),
            Op::Hide => self.edit_owner(scene, owner, |o| o.visible = false),
            Op::SetColor(color) => self.edit_owner(scene, owner, |o| o.material.color = *color),
            Op::SetOpacity(opacity) => self.edit_owner(scene, owner, |o| o.material.opacity = *opacity),
            Op::Say { text, duration } => {
                let until = self.time + duration;
                self.presentation.say(owner.object(), text.clone(), until);
                return Flow::Suspend(Wake::At(until));
            }
            Op::FloatText { text, color } => {
                let origin = self.effect_origin(scene, owner) + Vec3::Y * TEXT_LIFT;
                self.presentation.float_text(text.clone(), origin, *color, self.time);
            }

            // === Effects ===
            Op::Particles { kind, color } => {
                let origin = self.effect_origin(scene, owner);
                self.spawn_particles(*kind, origin, *color);
            }
            Op::ScreenTint { color, opacity, duration } => {
                self.presentation.tint(*color, *opacity, self.time, *duration)
            }
            Op::FadeScreen { duration } => self.presentation.fade(self.time, *duration),
            Op::Announce { text, duration } => self.presentation.announce(text.clone(), self.time + duration),
            Op::PlaySound(cue) => self.presentation.play_sound(cue.as_str()),
            Op::SetTimeScale(scale) => {
                self.time_scale = scale.clamp(TIME_SCALE_RANGE.0, TIME_SCALE_RANGE.1);
                tracing::debug!("time scale set to {}", self.time_scale);
            }

            // === Camera ===
            Op::CameraSwitch(target) => match self.resolve_target(scene, owner, target) {
                Some(id) => self.rig.switch_to(id),
                None if *target == TargetRef::Player => self.rig.switch_back(),
                None => {}
            },
            Op::CameraSwitchBack => {
                self.tasks.cancel_target(TaskTarget::Camera, &mut self.rig);
                self.rig.switch_back();
            }
            Op::CameraLookAt(target) => match target {
                TargetRef::Player => self.rig.look_at = Some(LookTarget::Player),
                _ => {
                    if let Some(id) = self.resolve_target(scene, owner, target) {
                        self.rig.look_at = Some(LookTarget::Object(id));
                    }
                }
            },
            Op::CameraMoveTo(position) => self.rig.pin(*position),
            Op::CameraGlideTo { target, duration } => {
                let from = self.rig.position;
                self.rig.pin(from);
                let effect = CameraEffect::Glide { from, to: *target, duration: *duration };
                self.tasks.upsert(TaskTarget::Camera, TaskKind::Camera(effect));
            }
            Op::CameraFollow { target, distance } => match self.resolve_target(scene, owner, target) {
                Some(id) => self.rig.follow(id, *distance),
                None if *target == TargetRef::Player => self.rig.switch_back(),
                None => {}
            },
            Op::CameraShake { intensity, duration } => {
                let effect = CameraEffect::Shake { intensity: *intensity, duration: *duration };
                self.tasks.upsert(TaskTarget::Camera, TaskKind::Camera(effect));
            }
            Op::CameraZoom { fov, duration } => {
                if *duration <= 0.0 {
                    self.rig.fov = *fov;
                } else {
                    let effect = CameraEffect::Zoom { from: self.rig.fov, to: *fov, duration: *duration };
                    self.tasks.upsert(TaskTarget::Camera, TaskKind::Camera(effect));
                }
            }
            Op::CameraResetFov => self.rig.reset_fov(),

            // === Variables & HUD ===
            Op::SetVar { name, value } => self.game.set_var(name, *value),
            Op::ChangeVar { name, delta } => self.game.change_var(name, *delta),
            Op::SetLocalVar { name, value } => self.edit_owner(scene, owner, |o| {
                o.locals.insert(name.clone(), *value);
            }),
            Op::ChangeLocalVar { name, delta } => self.edit_owner(scene, owner, |o| {
                *o.locals.entry(name.clone()).or_insert(0.0) += *delta;
            }),
            Op::ShowVar(name) => self.game.show_var(name),
            Op::HideVar(name) => self.game.hide_var(name),

            // === Game state ===
            Op::SetHealth(value) => self.game.set_health(*value),
            Op::ChangeHealth(delta) => self.game.change_health(*delta),
            Op::DamagePlayer(amount) => {
                if self.game.damage(*amount, self.time) {
                    self.presentation.play_sound("hurt");
                }
            }
            Op::HealPlayer(amount) => self.game.heal(*amount),
            Op::SetMaxHealth(value) => self.game.set_max_health(*value),
            Op::SetLives(value) => self.game.set_lives(*value),
            Op::ChangeLives(delta) => self.game.change_lives(*delta),
            Op::StartTimer(seconds) => self.game.start_timer(*seconds),
            Op::StopTimer => self.game.stop_timer(),
            Op::SetSpawnPoint => {
                self.game.spawn_point = match self.owner_pose(scene, owner) {
                    Some((_, pose)) => pose.position,
                    None => self.player.position,
                };
            }
            Op::TeleportPlayer(position) => self.player.respawn(*position),
            Op::SetPlayerSpeed(speed) => self.player.speed = *speed,
            Op::SetJumpForce(force) => self.player.jump_force = *force,
            Op::Win => {
                self.end(Outcome::Won);
                return Flow::Finish;
            }
            Op::Lose => {
                self.end(Outcome::Lost);
                return Flow::Finish;
            }

            // === Objects ===
            Op::SpawnObject { kind, position } => {
                let name = format!("{kind:?}").to_lowercase();
                let id = scene.add_object(SceneObject::new(ObjectId(0), name, *kind, *position));
                self.track_spawned(id);
            }
            Op::Clone => {
                if let Some(id) = owner.object().and_then(|id| self.live_object(scene, id)) {
                    if let Some(copy) = scene.duplicate_object(id) {
                        self.track_spawned(copy);
                    }
                }
            }
            Op::DeleteSelf => {
                if let Some(id) = owner.object() {
                    self.soft_remove(scene, id);
                    return Flow::Finish;
                }
            }
            Op::RemoveObject(target) => {
                if let Some(id) = self.resolve_target(scene, owner, target) {
                    self.soft_remove(scene, id);
                    if owner == Owner::Object(id) {
                        return Flow::Finish;
                    }
                }
            }

            // === Combat ===
            Op::SetAsEnemy(health) => {
                if let Some(id) = owner.object() {
                    self.combat.set_enemy(id, *health);
                }
            }
            Op::SetContactDamage(amount) => {
                if let Some(id) = owner.object() {
                    self.combat.contact_damage.insert(id, *amount);
                }
            }
            Op::FireProjectile { speed, color, aim } => {
                self.fire_projectile(scene, Self::shooter(owner), *aim, *speed, *color);
            }
            Op::SetFireRate(cooldown) => {
                self.combat.fire_rates.insert(Self::shooter(owner), *cooldown);
            }
            Op::SetProjectileDamage(damage) => self.combat.tuning_mut(Self::shooter(owner)).damage = *damage,
            Op::SetProjectileSize(size) => self.combat.tuning_mut(Self::shooter(owner)).size = *size,
            Op::SetProjectileLifetime(seconds) => {
                self.combat.tuning_mut(Self::shooter(owner)).lifetime = *seconds
            }
            Op::EnemyShoot { range, interval, damage } => {
                if let Some(id) = owner.object() {
                    let attack = RangedAttack {
                        range: *range,
                        interval: *interval,
                        damage: *damage,
                        next_at: self.time,
                    };
                    self.combat.ranged.insert(id, attack);
                }
            }
            Op::SetAsPickup { kind, name, effect, amount } => {
                if let Some(id) = owner.object() {
                    let pickup = Pickup { kind: *kind, name: name.clone(), effect: *effect, amount: *amount };
                    self.combat.pickups.insert(id, pickup);
                }
            }
            Op::AddItem { name, count } => self.game.add_item(name, *count),
            Op::RemoveItem { name, count } => self.game.remove_item(name, *count),

            // === Control ===
            Op::Repeat { times, body } => {
                return Flow::Push(Frame::new(body.clone(), FrameKind::Repeat { remaining: *times }));
            }
            Op::Forever(body) => {
                let id = self.routines.insert(Routine::forever(owner, body.clone()));
                self.dispatcher.fresh.push_back(id);
            }
            Op::If { condition, then } => {
                if self.eval_condition(scene, owner, condition) {
                    return Flow::Push(Frame::new(then.clone(), FrameKind::Sequence));
                }
            }
            Op::IfElse { condition, then, otherwise } => {
                let branch = if self.eval_condition(scene, owner, condition) { then } else { otherwise };
                return Flow::Push(Frame::new(branch.clone(), FrameKind::Sequence));
            }
            Op::While { condition, body } => {
                return Flow::Push(Frame::new(body.clone(), FrameKind::While(condition.clone())));
            }
            Op::ForEach { var, start, end, body } => {
                let kind = FrameKind::ForEach { var: var.clone(), next: *start, end: *end };
                return Flow::Push(Frame::new(body.clone(), kind));
            }
            Op::Wait(seconds) => {
                return Flow::Suspend(if *seconds <= 0.0 {
                    Wake::Tick(self.tick + 1)
                } else {
                    Wake::At(self.time + seconds)
                });
            }
            Op::WaitUntil(condition) => {
                if !self.eval_condition(scene, owner, condition) {
                    return Flow::Suspend(Wake::Until {
                        condition: condition.clone(),
                        poll_at: self.time + WAIT_UNTIL_POLL,
                    });
                }
            }
            Op::Broadcast(message) => {
                self.dispatcher.queue(GameEvent::Message(message.clone()), None);
            }
            Op::CallBlock(name) => {
                if call_depth >= MAX_CALL_DEPTH {
                    tracing::warn!("{:?}: callBlock '{}' nested too deep, yielding", owner, name);
                    return Flow::Suspend(Wake::Tick(self.tick + 1));
                }
                match self.dispatcher.definition(owner, name) {
                    Some(body) => return Flow::Push(Frame::new(body, FrameKind::Call)),
                    None => tracing::trace!("{:?}: no block named '{}'", owner, name),
                }
            }
            Op::StopScript => return Flow::Finish,

            // === UI ===
            Op::Dialog(text) => {
                let id = self.presentation.open_dialog(text.clone());
                return Flow::Suspend(Wake::Dialog(id));
            }
            Op::ShowScreen(name) => {
                if !self.screens.show(name) {
                    tracing::trace!("no UI screen named '{}'", name);
                }
            }
            Op::HideScreen(name) => {
                self.screens.hide(name);
            }

            Op::Unknown(code) => tracing::trace!("unknown command '{}' skipped", code),
        }
        Flow::Continue
    }
}
