//! Scene collaborator
//!
//! The runtime never owns scene objects directly. It talks to the scene
//! through the [`Scene`] trait and refers to objects by [`ObjectId`] handles,
//! so a script that references a deleted object degrades to a no-op instead
//! of holding a dangling reference.
//!
//! [`MemoryScene`] is a simple arena implementation used by the headless
//! runner and the tests.

use std::collections::{BTreeMap, HashMap};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::terrain::Heightmap;
use crate::physics::collision::{Aabb, ray_aabb_intersect};

/// Stable handle for a scene object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u32);

/// Primitive or prefab kind of a scene object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    #[default]
    Box,
    Sphere,
    Cylinder,
    Cone,
    Plane,
    Wall,
    Ramp,
    Spawn,
    Coin,
    Light,
    Npc,
    #[serde(other)]
    Prop,
}

impl ObjectKind {
    /// Kinds that never take part in solid collision.
    pub fn is_marker(self) -> bool {
        matches!(self, ObjectKind::Spawn | ObjectKind::Coin | ObjectKind::Light)
    }

    /// Parse a kind label, falling back to [`ObjectKind::Box`].
    pub fn from_label(label: &str) -> Self {
        serde_json::from_value(serde_json::Value::String(label.trim().to_ascii_lowercase()))
            .unwrap_or_default()
    }
}

/// Position, euler rotation (radians, XYZ) and scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// World-space bounds of the unit primitive under this transform.
    pub fn bounds(&self) -> Aabb {
        Aabb::from_transform(self.position, self.rotation, self.scale)
    }
}

/// Surface color and opacity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub color: [f32; 3],
    pub opacity: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: [0.8, 0.8, 0.8],
            opacity: 1.0,
        }
    }
}

/// Declarative "quick animation" an object can carry from the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuickAnimationKind {
    Spin,
    Bounce,
    Hover,
    Orbit,
    Pulse,
    Wander,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuickAnimation {
    pub kind: QuickAnimationKind,
    #[serde(default = "default_quick_speed")]
    pub speed: f32,
    #[serde(default = "default_quick_amount")]
    pub amount: f32,
}

fn default_quick_speed() -> f32 {
    1.0
}

fn default_quick_amount() -> f32 {
    1.0
}

/// A single pose in a keyframe track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Seconds from the start of the track
    pub time: f32,
    #[serde(flatten)]
    pub transform: Transform,
}

/// Recorded keyframe animation attached to an object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KeyframeTrack {
    pub keyframes: Vec<Keyframe>,
    #[serde(default)]
    pub looped: bool,
}

impl KeyframeTrack {
    pub fn duration(&self) -> f32 {
        self.keyframes.last().map(|k| k.time).unwrap_or(0.0)
    }

    /// Interpolated transform at `time` (clamped to the track).
    pub fn sample(&self, time: f32) -> Option<Transform> {
        let first = self.keyframes.first()?;
        if time <= first.time {
            return Some(first.transform);
        }
        for pair in self.keyframes.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if time <= b.time {
                let span = (b.time - a.time).max(1e-6);
                let t = (time - a.time) / span;
                return Some(Transform {
                    position: a.transform.position.lerp(b.transform.position, t),
                    rotation: a.transform.rotation.lerp(b.transform.rotation, t),
                    scale: a.transform.scale.lerp(b.transform.scale, t),
                });
            }
        }
        self.keyframes.last().map(|k| k.transform)
    }
}

/// A scene object as seen by the runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: ObjectId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kind: ObjectKind,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub material: Material,
    #[serde(default)]
    pub anchored: bool,
    #[serde(default = "default_true")]
    pub collidable: bool,
    #[serde(default = "default_mass")]
    pub mass: f32,
    /// Per-object script variables
    #[serde(default)]
    pub locals: HashMap<String, f64>,
    #[serde(default)]
    pub quick_animation: Option<QuickAnimation>,
    #[serde(default)]
    pub animation: Option<KeyframeTrack>,
}

fn default_true() -> bool {
    true
}

fn default_mass() -> f32 {
    1.0
}

impl SceneObject {
    pub fn new(id: ObjectId, name: impl Into<String>, kind: ObjectKind, position: Vec3) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            transform: Transform::at(position),
            visible: true,
            material: Material::default(),
            anchored: false,
            collidable: true,
            mass: 1.0,
            locals: HashMap::new(),
            quick_animation: None,
            animation: None,
        }
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.transform.scale = scale;
        self
    }

    pub fn bounds(&self) -> Aabb {
        self.transform.bounds()
    }

    /// Whether the object blocks player movement.
    pub fn is_solid(&self) -> bool {
        self.visible && self.collidable && !self.kind.is_marker()
    }
}

/// Viewpoint the presentation layer renders from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees
    pub fov: f32,
    /// Width / height
    pub aspect: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 5.0, 10.0),
            target: Vec3::ZERO,
            fov: 75.0,
            aspect: 16.0 / 9.0,
        }
    }
}

impl Camera {
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or(Vec3::NEG_Z)
    }
}

/// Abstract scene the runtime simulates against.
pub trait Scene {
    /// All object handles, in registration order.
    fn object_ids(&self) -> Vec<ObjectId>;

    fn object(&self, id: ObjectId) -> Option<&SceneObject>;

    fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject>;

    /// Insert a new object; the scene assigns its handle.
    fn add_object(&mut self, object: SceneObject) -> ObjectId;

    /// Copy an object under a fresh handle.
    fn duplicate_object(&mut self, id: ObjectId) -> Option<ObjectId>;

    /// Hard-delete an object.
    fn remove_object(&mut self, id: ObjectId) -> Option<SceneObject>;

    fn camera(&self) -> &Camera;

    fn camera_mut(&mut self) -> &mut Camera;

    /// Heightmap terrain, when the scene has one.
    fn terrain(&self) -> Option<&Heightmap>;

    /// First object with the given name.
    fn find_by_name(&self, name: &str) -> Option<ObjectId> {
        self.object_ids()
            .into_iter()
            .find(|&id| self.object(id).is_some_and(|o| o.name == name))
    }

    /// Nearest visible object hit by a ray, with its distance.
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<(ObjectId, f32)> {
        let mut best: Option<(ObjectId, f32)> = None;
        for id in self.object_ids() {
            let Some(object) = self.object(id) else { continue };
            if !object.visible {
                continue;
            }
            let bounds = object.bounds();
            if let Some(t) = ray_aabb_intersect(origin, direction, bounds.min, bounds.max) {
                if t <= max_distance && best.is_none_or(|(_, d)| t < d) {
                    best = Some((id, t));
                }
            }
        }
        best
    }
}

/// In-memory arena scene.
#[derive(Debug, Clone, Default)]
pub struct MemoryScene {
    objects: BTreeMap<ObjectId, SceneObject>,
    next_id: u32,
    camera: Camera,
    terrain: Option<Heightmap>,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scene from pre-identified objects (e.g. loaded from a project).
    pub fn from_objects(objects: Vec<SceneObject>, terrain: Option<Heightmap>, camera: Camera) -> Self {
        let next_id = objects.iter().map(|o| o.id.0 + 1).max().unwrap_or(0);
        Self {
            objects: objects.into_iter().map(|o| (o.id, o)).collect(),
            next_id,
            camera,
            terrain,
        }
    }

    /// Convenience for tests: insert an object built from a closure.
    pub fn spawn(&mut self, name: &str, kind: ObjectKind, position: Vec3) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.add_object(SceneObject::new(id, name, kind, position))
    }

    pub fn set_terrain(&mut self, terrain: Option<Heightmap>) {
        self.terrain = terrain;
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Scene for MemoryScene {
    fn object_ids(&self) -> Vec<ObjectId> {
        self.objects.keys().copied().collect()
    }

    fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(&id)
    }

    fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(&id)
    }

    fn add_object(&mut self, mut object: SceneObject) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        object.id = id;
        self.objects.insert(id, object);
        id
    }

    fn duplicate_object(&mut self, id: ObjectId) -> Option<ObjectId> {
        let copy = self.objects.get(&id)?.clone();
        Some(self.add_object(copy))
    }

    fn remove_object(&mut self, id: ObjectId) -> Option<SceneObject> {
        self.objects.remove(&id)
    }

    fn camera(&self) -> &Camera {
        &self.camera
    }

    fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    fn terrain(&self) -> Option<&Heightmap> {
        self.terrain.as_ref()
    }
}
