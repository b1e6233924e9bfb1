//! Collision system: player resolution, proximity contacts and object overlaps.
//!
//! Resolves the kinematic player against every solid scene box, heightmap
//! terrain, the optional ground plane and the death plane. Pure game logic
//! working on [`Aabb`]s from a per-handle [`BoundsCache`].

use std::collections::{BTreeSet, HashMap};

use glam::Vec3;

use crate::game::config::CollisionTuning;
use crate::physics::Aabb;
use crate::player::PlayerController;
use crate::world::{ObjectId, Scene, SceneObject, Transform};

/// Vertical slack when deciding whether the player overlaps a box side.
const SIDE_EPSILON: f32 = 1e-3;

/// Cached world bounds per object, validated against the transform they were
/// computed from.
#[derive(Debug, Default)]
pub struct BoundsCache {
    entries: HashMap<ObjectId, (Transform, Aabb)>,
}

impl BoundsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds of `object`, recomputed when its transform changed.
    pub fn bounds(&mut self, object: &SceneObject) -> Aabb {
        match self.entries.get(&object.id) {
            Some((transform, bounds)) if *transform == object.transform => *bounds,
            _ => {
                let bounds = object.bounds();
                self.entries.insert(object.id, (object.transform, bounds));
                bounds
            }
        }
    }

    pub fn invalidate(&mut self, id: ObjectId) {
        self.entries.remove(&id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of resolving the player for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerResolution {
    pub grounded: bool,
    /// Box the player landed on, if any
    pub standing_on: Option<ObjectId>,
    /// Feet dropped below the death plane
    pub fell_out: bool,
}

/// Stateless collision routines.
pub struct CollisionSystem;

impl CollisionSystem {
    /// Resolve the player against the world after integration.
    ///
    /// `previous` is the feet position before this frame's movement.
    pub fn resolve_player(
        player: &mut PlayerController,
        previous: Vec3,
        scene: &dyn Scene,
        cache: &mut BoundsCache,
        tuning: &CollisionTuning,
        ground_plane: bool,
        death_plane_y: f32,
    ) -> PlayerResolution {
        let mut result = PlayerResolution::default();
        let radius = tuning.player_radius;
        let height = tuning.player_height;

        for id in scene.object_ids() {
            let Some(object) = scene.object(id) else { continue };
            if !object.is_solid() {
                continue;
            }
            let b = cache.bounds(object);
            let pos = player.position;

            // Footprint overlap
            if pos.x + radius <= b.min.x
                || pos.x - radius >= b.max.x
                || pos.z + radius <= b.min.z
                || pos.z - radius >= b.max.z
            {
                continue;
            }

            let feet = pos.y;
            let head = feet + height;
            let top = b.max.y;
            let bottom = b.min.y;

            let falling = player.velocity.y <= 0.0;
            let in_band = feet <= top + tuning.land_above && feet >= top - tuning.land_below;
            let came_from_above = previous.y >= top - tuning.land_below;
            let crossed_top = previous.y >= top && feet < top;

            if falling && ((in_band && came_from_above) || crossed_top) {
                player.position.y = top;
                player.velocity.y = 0.0;
                result.grounded = true;
                result.standing_on = Some(id);
                continue;
            }

            let rising = player.velocity.y > 0.0;
            let previous_head = previous.y + height;
            if rising && previous_head <= bottom + tuning.ceiling_band && head > bottom && feet < bottom {
                player.position.y = bottom - height;
                player.velocity.y = 0.0;
                continue;
            }

            if feet < top - SIDE_EPSILON && head > bottom + SIDE_EPSILON {
                let overlap_x = (pos.x + radius - b.min.x).min(b.max.x - (pos.x - radius));
                let overlap_z = (pos.z + radius - b.min.z).min(b.max.z - (pos.z - radius));
                let center = b.center();
                if overlap_x < overlap_z {
                    player.position.x = if pos.x < center.x { b.min.x - radius } else { b.max.x + radius };
                    player.velocity.x = 0.0;
                } else {
                    player.position.z = if pos.z < center.z { b.min.z - radius } else { b.max.z + radius };
                    player.velocity.z = 0.0;
                }
            }
        }

        if let Some(terrain) = scene.terrain().filter(|t| t.collision) {
            if let Some(surface) = terrain.height_at(player.position.x, player.position.z) {
                if player.velocity.y <= 0.0 && player.position.y < surface + tuning.terrain_band {
                    player.position.y = surface;
                    player.velocity.y = 0.0;
                    result.grounded = true;
                }
            }
        }

        if ground_plane && player.position.y <= 0.0 {
            player.position.y = 0.0;
            if player.velocity.y <= 0.0 {
                player.velocity.y = 0.0;
                result.grounded = true;
            }
        }

        if player.position.y < death_plane_y {
            result.fell_out = true;
        }

        player.is_grounded = result.grounded;
        result
    }

    /// Whether a box is within touching distance of the player.
    ///
    /// Measures from the box to the player's vertical feet-to-head segment.
    pub fn is_touching(feet: Vec3, bounds: &Aabb, tuning: &CollisionTuning) -> bool {
        let center = feet + Vec3::Y * (tuning.player_height * 0.5);
        let q = bounds.closest_point(center);
        let p = Vec3::new(feet.x, q.y.clamp(feet.y, feet.y + tuning.player_height), feet.z);
        q.distance(p) <= tuning.proximity_radius
    }

    /// Visible objects the player is touching, in handle order.
    pub fn player_contacts(
        feet: Vec3,
        scene: &dyn Scene,
        cache: &mut BoundsCache,
        tuning: &CollisionTuning,
    ) -> BTreeSet<ObjectId> {
        scene
            .object_ids()
            .into_iter()
            .filter(|&id| {
                scene
                    .object(id)
                    .filter(|o| o.visible)
                    .is_some_and(|o| Self::is_touching(feet, &cache.bounds(o), tuning))
            })
            .collect()
    }

    /// Overlapping `(candidate, other)` pairs among visible objects.
    pub fn object_overlaps(
        candidates: &[ObjectId],
        scene: &dyn Scene,
        cache: &mut BoundsCache,
    ) -> BTreeSet<(ObjectId, ObjectId)> {
        let mut pairs = BTreeSet::new();
        let ids = scene.object_ids();
        for &a in candidates {
            let Some(first) = scene.object(a).filter(|o| o.visible) else { continue };
            let bounds_a = cache.bounds(first);
            for &b in &ids {
                if a == b {
                    continue;
                }
                let Some(second) = scene.object(b).filter(|o| o.visible) else { continue };
                if bounds_a.intersects(&cache.bounds(second)) {
                    pairs.insert((a, b));
                }
            }
        }
        pairs
    }
}

/// Edge detector for contact sets: reports only newly entered contacts.
#[derive(Debug, Default)]
pub struct ContactTracker<T: Ord + Copy> {
    current: BTreeSet<T>,
}

impl<T: Ord + Copy> ContactTracker<T> {
    pub fn new() -> Self {
        Self { current: BTreeSet::new() }
    }

    /// Replace the contact set and return the entries that were not present before.
    pub fn update(&mut self, contacts: BTreeSet<T>) -> Vec<T> {
        let entered = contacts.difference(&self.current).copied().collect();
        self.current = contacts;
        entered
    }

    pub fn clear(&mut self) {
        self.current.clear();
    }
}
