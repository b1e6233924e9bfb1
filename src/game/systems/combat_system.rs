//! Combat bookkeeping: enemies, contact damage, fire rates, projectile tuning,
//! ranged attackers and pickups.
//!
//! All side state lives in maps keyed by object handle (or [`Shooter`]) so a
//! removed object simply stops matching. Everything is cleared on stop.

use std::collections::BTreeMap;

use glam::Vec3;

use crate::physics::Shooter;
use crate::physics::ballistics::{
    DEFAULT_PROJECTILE_DAMAGE, DEFAULT_PROJECTILE_LIFETIME, DEFAULT_PROJECTILE_SIZE, Projectile,
};
use crate::world::ObjectId;

/// Duration of the `speed` pickup boost (seconds).
pub const SPEED_BOOST_DURATION: f32 = 5.0;

/// Speed multiplier while boosted.
pub const SPEED_BOOST_FACTOR: f32 = 1.5;

/// Default cooldown between shots (seconds).
pub const DEFAULT_FIRE_COOLDOWN: f32 = 0.3;

/// Pickup category; cosmetic except for how it is announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PickupKind {
    Coin,
    Health,
    Key,
    PowerUp,
    #[default]
    Item,
}

impl PickupKind {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "coin" => PickupKind::Coin,
            "health" | "heart" => PickupKind::Health,
            "key" => PickupKind::Key,
            "powerup" | "power-up" => PickupKind::PowerUp,
            _ => PickupKind::Item,
        }
    }
}

/// What collecting a pickup does beyond adding it to the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PickupEffect {
    Heal,
    Speed,
    Score,
    #[default]
    None,
}

impl PickupEffect {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "heal" | "health" => PickupEffect::Heal,
            "speed" | "boost" => PickupEffect::Speed,
            "score" | "points" => PickupEffect::Score,
            _ => PickupEffect::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pickup {
    pub kind: PickupKind,
    pub name: String,
    pub effect: PickupEffect,
    pub amount: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyHealth {
    pub health: f32,
    pub max: f32,
}

impl EnemyHealth {
    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 { 0.0 } else { (self.health / self.max).clamp(0.0, 1.0) }
    }
}

/// Ranged enemy registered by `enemyShoot`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangedAttack {
    pub range: f32,
    pub interval: f32,
    pub damage: f32,
    /// Session time of the next allowed shot
    pub next_at: f32,
}

/// Per-shooter projectile overrides.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileTuning {
    pub damage: f32,
    pub size: f32,
    pub lifetime: f32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            damage: DEFAULT_PROJECTILE_DAMAGE,
            size: DEFAULT_PROJECTILE_SIZE,
            lifetime: DEFAULT_PROJECTILE_LIFETIME,
        }
    }
}

impl ProjectileTuning {
    /// Apply this tuning to a freshly spawned projectile.
    pub fn apply(&self, mut projectile: Projectile) -> Projectile {
        projectile.damage = self.damage;
        projectile.radius = self.size;
        projectile.lifetime = self.lifetime;
        projectile
    }
}

/// Outcome of damaging an enemy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnemyHit {
    /// Not registered as an enemy
    NotEnemy,
    Damaged { remaining: f32 },
    /// Health crossed zero on this hit
    Defeated,
}

/// Side tables for the combat subsystem.
#[derive(Debug, Default)]
pub struct CombatMaps {
    pub enemies: BTreeMap<ObjectId, EnemyHealth>,
    pub contact_damage: BTreeMap<ObjectId, f32>,
    pub fire_rates: BTreeMap<Shooter, f32>,
    pub last_fired: BTreeMap<Shooter, f32>,
    pub projectile_tuning: BTreeMap<Shooter, ProjectileTuning>,
    pub ranged: BTreeMap<ObjectId, RangedAttack>,
    pub pickups: BTreeMap<ObjectId, Pickup>,
}

impl CombatMaps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_enemy(&mut self, id: ObjectId, health: f32) {
        self.enemies.insert(id, EnemyHealth { health, max: health });
    }

    /// Damage an enemy. A defeated enemy is unregistered.
    pub fn damage_enemy(&mut self, id: ObjectId, amount: f32) -> EnemyHit {
        let Some(enemy) = self.enemies.get_mut(&id) else {
            return EnemyHit::NotEnemy;
        };
        enemy.health = (enemy.health - amount).max(0.0);
        if enemy.health > 0.0 {
            return EnemyHit::Damaged { remaining: enemy.health };
        }
        self.enemies.remove(&id);
        self.ranged.remove(&id);
        self.contact_damage.remove(&id);
        EnemyHit::Defeated
    }

    pub fn enemy_health(&self, id: ObjectId) -> Option<f32> {
        self.enemies.get(&id).map(|e| e.health)
    }

    /// Cooldown between shots for a shooter.
    pub fn cooldown(&self, shooter: Shooter, default: f32) -> f32 {
        self.fire_rates.get(&shooter).copied().unwrap_or(default)
    }

    /// Whether `shooter` may fire at `now`; records the shot when it may.
    pub fn try_fire(&mut self, shooter: Shooter, now: f32, default_cooldown: f32) -> bool {
        let cooldown = self.cooldown(shooter, default_cooldown);
        if let Some(&last) = self.last_fired.get(&shooter) {
            if now - last < cooldown - 1e-4 {
                return false;
            }
        }
        self.last_fired.insert(shooter, now);
        true
    }

    pub fn tuning(&self, shooter: Shooter) -> ProjectileTuning {
        self.projectile_tuning.get(&shooter).copied().unwrap_or_default()
    }

    pub fn tuning_mut(&mut self, shooter: Shooter) -> &mut ProjectileTuning {
        self.projectile_tuning.entry(shooter).or_default()
    }

    /// Ranged enemies ready to fire at a player standing at `target`.
    ///
    /// Each returned attacker has its next shot rescheduled.
    pub fn ready_ranged(
        &mut self,
        now: f32,
        target: Vec3,
        position_of: impl Fn(ObjectId) -> Option<Vec3>,
    ) -> Vec<(ObjectId, f32)> {
        let mut ready = Vec::new();
        for (&id, attack) in self.ranged.iter_mut() {
            if now + 1e-4 < attack.next_at {
                continue;
            }
            let Some(position) = position_of(id) else { continue };
            if position.distance(target) > attack.range {
                continue;
            }
            attack.next_at = now + attack.interval;
            ready.push((id, attack.damage));
        }
        ready
    }

    /// Drop every entry belonging to an object.
    pub fn forget(&mut self, id: ObjectId) {
        self.enemies.remove(&id);
        self.contact_damage.remove(&id);
        self.ranged.remove(&id);
        self.pickups.remove(&id);
        let shooter = Shooter::Object(id);
        self.fire_rates.remove(&shooter);
        self.last_fired.remove(&shooter);
        self.projectile_tuning.remove(&shooter);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enemy_defeat_unregisters() {
        let mut maps = CombatMaps::new();
        let id = ObjectId(4);
        maps.set_enemy(id, 20.0);
        assert_eq!(maps.damage_enemy(id, 10.0), EnemyHit::Damaged { remaining: 10.0 });
        assert_eq!(maps.damage_enemy(id, 15.0), EnemyHit::Defeated);
        assert_eq!(maps.enemy_health(id), None);
        assert_eq!(maps.damage_enemy(id, 1.0), EnemyHit::NotEnemy);
    }

    #[test]
    fn test_fire_rate_enforced_per_shooter() {
        let mut maps = CombatMaps::new();
        assert!(maps.try_fire(Shooter::Player, 1.0, 0.3));
        assert!(!maps.try_fire(Shooter::Player, 1.2, 0.3));
        assert!(maps.try_fire(Shooter::Object(ObjectId(1)), 1.2, 0.3));
        assert!(maps.try_fire(Shooter::Player, 1.3, 0.3));
    }

    #[test]
    fn test_ranged_respects_range_and_interval() {
        let mut maps = CombatMaps::new();
        let id = ObjectId(2);
        maps.ranged.insert(id, RangedAttack { range: 10.0, interval: 2.0, damage: 5.0, next_at: 0.0 });
        let at = |_| Some(Vec3::ZERO);
        assert_eq!(maps.ready_ranged(0.0, Vec3::new(5.0, 0.0, 0.0), at), vec![(id, 5.0)]);
        assert!(maps.ready_ranged(1.0, Vec3::new(5.0, 0.0, 0.0), at).is_empty());
        assert!(maps.ready_ranged(2.0, Vec3::new(50.0, 0.0, 0.0), at).is_empty());
        assert_eq!(maps.ready_ranged(2.5, Vec3::new(5.0, 0.0, 0.0), at).len(), 1);
    }

    #[test]
    fn test_labels() {
        assert_eq!(PickupEffect::from_label("Score"), PickupEffect::Score);
        assert_eq!(PickupEffect::from_label("???"), PickupEffect::None);
        assert_eq!(PickupKind::from_label("coin"), PickupKind::Coin);
    }
}
