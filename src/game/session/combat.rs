//! Per-frame combat: projectiles, ranged enemies, contacts and pickups.

use std::collections::BTreeSet;

use glam::Vec3;

use crate::game::script::dispatcher::{CollisionSource, GameEvent};
use crate::game::script::ops::{Aim, CollideFilter, Trigger};
use crate::game::session::Session;
use crate::game::systems::collision_system::CollisionSystem;
use crate::game::systems::combat_system::{
    DEFAULT_FIRE_COOLDOWN, EnemyHit, PickupEffect, SPEED_BOOST_DURATION, SPEED_BOOST_FACTOR,
};
use crate::game::systems::projectile_system::{PLAYER_HIT_RADIUS, nearest_box_hit};
use crate::game::tasks::{ParticleBurst, ParticleKind, TaskKind, TaskTarget};
use crate::physics::ballistics::DEFAULT_PROJECTILE_SPEED;
use crate::physics::{Aabb, Projectile, Shooter};
use crate::world::{ObjectId, Scene};

/// Color of player shots.
pub const PLAYER_SHOT_COLOR: [f32; 3] = [1.0, 0.9, 0.2];

/// Color of ranged enemy shots.
pub const ENEMY_SHOT_COLOR: [f32; 3] = [1.0, 0.2, 0.1];

/// Gap between an object's surface and its projectile spawn point.
const MUZZLE_GAP: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq)]
enum ProjectileHit {
    Object(ObjectId),
    Player,
}

/// Distance from `point` to the segment `from -> to`, and the closest point.
fn segment_point_distance(from: Vec3, to: Vec3, point: Vec3) -> (f32, Vec3) {
    let segment = to - from;
    let length_sq = segment.length_squared();
    let t = if length_sq <= f32::EPSILON {
        0.0
    } else {
        ((point - from).dot(segment) / length_sq).clamp(0.0, 1.0)
    };
    let closest = from + segment * t;
    (closest.distance(point), closest)
}

impl Session {
    /// Center of the player's body.
    pub fn player_center(&self) -> Vec3 {
        self.player.position + Vec3::Y * (self.settings.tuning.player_height * 0.5)
    }

    /// Start a particle burst at `origin`.
    pub fn spawn_particles(&mut self, kind: ParticleKind, origin: Vec3, color: [f32; 3]) {
        let burst = ParticleBurst::spawn(kind, origin, color, &mut self.rng);
        self.tasks.spawn(TaskTarget::World, TaskKind::Particles(burst));
    }

    /// Fire a player shot along the look direction, cooldown permitting.
    pub fn fire_player(&mut self, scene: &dyn Scene) -> bool {
        self.fire_projectile(scene, Shooter::Player, Aim::Forward, DEFAULT_PROJECTILE_SPEED, PLAYER_SHOT_COLOR)
    }

    /// Fire for `shooter` when its fire-rate cooldown has elapsed.
    pub fn fire_projectile(
        &mut self,
        scene: &dyn Scene,
        shooter: Shooter,
        aim: Aim,
        speed: f32,
        color: [f32; 3],
    ) -> bool {
        let default_cooldown = match shooter {
            Shooter::Player => self.settings.fire_cooldown,
            Shooter::Object(_) => DEFAULT_FIRE_COOLDOWN,
        };
        if !self.combat.try_fire(shooter, self.time, default_cooldown) {
            return false;
        }
        self.launch(scene, shooter, aim, speed, color, None)
    }

    fn launch(
        &mut self,
        scene: &dyn Scene,
        shooter: Shooter,
        aim: Aim,
        speed: f32,
        color: [f32; 3],
        damage: Option<f32>,
    ) -> bool {
        let (origin, direction) = match shooter {
            Shooter::Player => (
                self.player.eye_position(self.settings.tuning.eye_height),
                self.player.look_direction(),
            ),
            Shooter::Object(id) => {
                let Some(object) = self.live_object(scene, id).and_then(|id| scene.object(id)) else {
                    return false;
                };
                let position = object.transform.position;
                let direction = match aim {
                    Aim::Forward => {
                        let yaw = object.transform.rotation.y;
                        Vec3::new(yaw.sin(), 0.0, -yaw.cos())
                    }
                    Aim::AtPlayer => (self.player_center() - position).normalize_or_zero(),
                };
                let reach = object.transform.scale.max_element() * 0.5 + MUZZLE_GAP;
                (position + direction * reach, direction)
            }
        };
        if direction == Vec3::ZERO {
            return false;
        }

        let mut projectile = self
            .combat
            .tuning(shooter)
            .apply(Projectile::spawn(origin, direction, speed, shooter));
        projectile.color = color;
        if let Some(damage) = damage {
            projectile.damage = damage;
        }
        let fired = self.projectiles.fire(projectile);
        if fired {
            self.presentation.play_sound("shoot");
        }
        fired
    }

    /// Advance projectiles and resolve their hits.
    pub(crate) fn step_projectiles(&mut self, scene: &mut dyn Scene, dt: f32) {
        if self.projectiles.active_count() == 0 {
            return;
        }
        let updates = self.projectiles.update(dt);
        let player_center = self.player_center();

        let mut spent = Vec::new();
        let mut hits = Vec::new();
        for update in &updates {
            let Some(projectile) = self.projectiles.get(update.index).copied() else { continue };
            let owner = projectile.owner;

            let removed = &self.removed;
            let bounds = &mut self.bounds;
            let view: &dyn Scene = scene;
            let targets: Vec<(ObjectId, Aabb)> = view
                .object_ids()
                .into_iter()
                .filter(|id| Shooter::Object(*id) != owner && !removed.contains(id))
                .filter_map(|id| view.object(id).filter(|o| o.is_solid()).map(|o| (id, bounds.bounds(o))))
                .collect();
            let object_hit = nearest_box_hit(update.prev_pos, update.new_pos, projectile.radius, targets)
                .map(|(id, point)| (ProjectileHit::Object(id), point));

            let player_hit = (owner != Shooter::Player)
                .then(|| segment_point_distance(update.prev_pos, update.new_pos, player_center))
                .filter(|(distance, _)| *distance <= PLAYER_HIT_RADIUS)
                .map(|(_, point)| (ProjectileHit::Player, point));

            let hit = match (object_hit, player_hit) {
                (Some(a), Some(b)) => {
                    let from = update.prev_pos;
                    Some(if from.distance_squared(a.1) <= from.distance_squared(b.1) { a } else { b })
                }
                (a, b) => a.or(b),
            };

            match hit {
                Some((target, point)) => {
                    spent.push(update.index);
                    hits.push((target, point, projectile));
                }
                None if !update.state.is_alive() => spent.push(update.index),
                None => {}
            }
        }
        self.projectiles.remove_all(spent);

        for (target, point, projectile) in hits {
            match target {
                ProjectileHit::Object(id) => {
                    self.dispatcher
                        .queue(GameEvent::Collide(CollisionSource::Projectile), Some(id));
                    match self.combat.damage_enemy(id, projectile.damage) {
                        EnemyHit::Defeated => self.defeat_enemy(scene, id),
                        EnemyHit::Damaged { remaining } => {
                            tracing::trace!("{:?} hit, {} health left", id, remaining);
                        }
                        EnemyHit::NotEnemy => {}
                    }
                    self.presentation.play_sound("hit");
                }
                ProjectileHit::Player => {
                    if self.game.damage(projectile.damage, self.time) {
                        self.presentation.play_sound("hurt");
                    }
                }
            }
            self.spawn_particles(ParticleKind::Burst, point, projectile.color);
        }
    }

    fn defeat_enemy(&mut self, scene: &mut dyn Scene, id: ObjectId) {
        if let Some(object) = scene.object_mut(id) {
            object.visible = false;
            object.collidable = false;
            tracing::debug!("enemy '{}' defeated", object.name);
        }
        self.bounds.invalidate(id);
        self.dispatcher.queue(GameEvent::EnemyDefeated, None);
        self.presentation.play_sound("defeat");
    }

    /// Let every ranged enemy in range take its shot.
    pub(crate) fn step_ranged(&mut self, scene: &dyn Scene) {
        if self.combat.ranged.is_empty() {
            return;
        }
        let target = self.player_center();
        let removed = &self.removed;
        let ready = self.combat.ready_ranged(self.time, target, |id| {
            if removed.contains(&id) {
                return None;
            }
            scene.object(id).filter(|o| o.visible).map(|o| o.transform.position)
        });
        for (id, damage) in ready {
            self.launch(
                scene,
                Shooter::Object(id),
                Aim::AtPlayer,
                DEFAULT_PROJECTILE_SPEED,
                ENEMY_SHOT_COLOR,
                Some(damage),
            );
        }
    }

    /// Player proximity, contact damage, pickups and object overlaps.
    pub(crate) fn step_contacts(&mut self, scene: &mut dyn Scene) {
        let contacts = CollisionSystem::player_contacts(
            self.player.position,
            scene,
            &mut self.bounds,
            &self.settings.tuning,
        );
        for id in self.player_contacts.update(contacts.clone()) {
            self.dispatcher
                .queue(GameEvent::Collide(CollisionSource::Player), Some(id));
        }

        for id in contacts {
            if self.removed.contains(&id) {
                continue;
            }
            if self.combat.pickups.contains_key(&id) {
                self.collect_pickup(scene, id);
                continue;
            }
            if let Some(&damage) = self.combat.contact_damage.get(&id) {
                if self.game.damage(damage, self.time) {
                    self.presentation.play_sound("hurt");
                }
            }
        }

        let candidates: Vec<ObjectId> = self
            .dispatcher
            .scripts
            .iter()
            .filter(|s| matches!(s.trigger, Trigger::Collide(CollideFilter::Named(_))))
            .filter_map(|s| s.owner.object())
            .filter(|id| !self.removed.contains(id))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let overlaps = CollisionSystem::object_overlaps(&candidates, scene, &mut self.bounds);
        for (owner, other) in self.object_contacts.update(overlaps) {
            let Some(name) = scene.object(other).map(|o| o.name.clone()) else { continue };
            self.dispatcher
                .queue(GameEvent::Collide(CollisionSource::Object(name)), Some(owner));
        }
    }

    fn collect_pickup(&mut self, scene: &mut dyn Scene, id: ObjectId) {
        let Some(pickup) = self.combat.pickups.remove(&id) else { return };

        self.game.add_item(&pickup.name, 1);
        match pickup.effect {
            PickupEffect::Heal => self.game.heal(pickup.amount),
            PickupEffect::Speed => {
                self.player.speed_boost = SPEED_BOOST_FACTOR;
                self.player.boost_until = self.time + SPEED_BOOST_DURATION;
            }
            PickupEffect::Score => self.game.change_var("score", f64::from(pickup.amount)),
            PickupEffect::None => {}
        }

        let mut origin = self.player_center();
        if let Some(object) = scene.object_mut(id) {
            object.visible = false;
            object.collidable = false;
            origin = object.transform.position;
        }
        self.bounds.invalidate(id);
        self.spawn_particles(ParticleKind::Sparkle, origin, [1.0, 0.85, 0.2]);
        self.presentation.play_sound("pickup");
        tracing::debug!("collected {:?} '{}'", pickup.kind, pickup.name);
        self.dispatcher.queue(GameEvent::ItemCollected(pickup.name), None);
    }
}
