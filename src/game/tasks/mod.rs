//! Task scheduler
//!
//! Per-frame stateful transformers: object animations, camera effects and
//! particle bursts. Tasks address their target by handle only; a task whose
//! object is gone is dropped on the next step.

pub mod animation;
pub mod camera_fx;
pub mod particles;

use std::collections::BTreeMap;

use rand::rngs::StdRng;

use crate::camera::CameraRig;
use crate::game::systems::collision_system::BoundsCache;
use crate::world::{ObjectId, Scene};

pub use animation::{Animation, AnimationEnv, TrailPoint};
pub use camera_fx::CameraEffect;
pub use particles::{ParticleBurst, ParticleInstance, ParticleKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskTarget {
    Object(ObjectId),
    Camera,
    /// Free-standing effects such as particle bursts
    World,
}

#[derive(Debug, Clone)]
pub enum TaskKind {
    Animation(Animation),
    Camera(CameraEffect),
    Particles(ParticleBurst),
}

impl TaskKind {
    fn same_kind(&self, other: &TaskKind) -> bool {
        match (self, other) {
            (TaskKind::Animation(a), TaskKind::Animation(b)) => a.same_kind(b),
            (TaskKind::Camera(a), TaskKind::Camera(b)) => a.same_kind(b),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Task {
    pub target: TaskTarget,
    pub kind: TaskKind,
    pub elapsed: f32,
}

/// Everything a task may touch while stepping.
pub struct TaskContext<'a> {
    pub scene: &'a mut dyn Scene,
    pub rig: &'a mut CameraRig,
    pub rng: &'a mut StdRng,
    pub bounds: &'a mut BoundsCache,
    /// Whether the y = 0 ground plane is solid
    pub ground_plane: bool,
}

#[derive(Debug, Default)]
pub struct TaskScheduler {
    tasks: BTreeMap<TaskHandle, Task>,
    next: u64,
}

impl TaskScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task unconditionally.
    pub fn spawn(&mut self, target: TaskTarget, kind: TaskKind) -> TaskHandle {
        let handle = TaskHandle(self.next);
        self.next += 1;
        self.tasks.insert(handle, Task { target, kind, elapsed: 0.0 });
        handle
    }

    /// Add a task, reusing an existing one of the same kind on the same target.
    ///
    /// Continuous animations are retuned in place and keep their state;
    /// one-shots restart. Particle bursts always stack.
    pub fn upsert(&mut self, target: TaskTarget, kind: TaskKind) -> TaskHandle {
        if matches!(kind, TaskKind::Particles(_)) {
            return self.spawn(target, kind);
        }
        let existing = self
            .tasks
            .iter()
            .find(|(_, t)| t.target == target && t.kind.same_kind(&kind))
            .map(|(&h, _)| h);

        match (existing, kind) {
            (Some(handle), TaskKind::Animation(anim)) if anim.is_continuous() => {
                if let Some(Task { kind: TaskKind::Animation(current), .. }) = self.tasks.get_mut(&handle) {
                    current.retune(anim);
                }
                handle
            }
            (Some(handle), kind) => {
                self.tasks.remove(&handle);
                self.spawn(target, kind)
            }
            (None, kind) => self.spawn(target, kind),
        }
    }

    pub fn cancel(&mut self, handle: TaskHandle) -> Option<Task> {
        self.tasks.remove(&handle)
    }

    /// Cancel every task on `target`.
    pub fn cancel_target(&mut self, target: TaskTarget, rig: &mut CameraRig) {
        self.tasks.retain(|_, task| {
            if task.target != target {
                return true;
            }
            if let TaskKind::Camera(effect) = &task.kind {
                effect.cancel(rig);
            }
            false
        });
    }

    /// Advance every task by `dt`, dropping finished and orphaned ones.
    pub fn step(&mut self, ctx: &mut TaskContext<'_>, dt: f32) {
        let handles: Vec<TaskHandle> = self.tasks.keys().copied().collect();
        for handle in handles {
            let Some(task) = self.tasks.get_mut(&handle) else { continue };
            task.elapsed += dt;
            let elapsed = task.elapsed;
            let done = match (&mut task.kind, task.target) {
                (TaskKind::Animation(anim), TaskTarget::Object(id)) => step_object(anim, id, ctx, elapsed, dt),
                (TaskKind::Camera(effect), _) => effect.step(ctx.rig, ctx.rng, elapsed),
                (TaskKind::Particles(burst), _) => burst.step(dt),
                (TaskKind::Animation(_), _) => true,
            };
            if done {
                self.tasks.remove(&handle);
            }
        }
    }

    /// Tasks currently targeting `target`.
    pub fn count_for(&self, target: TaskTarget) -> usize {
        self.tasks.values().filter(|t| t.target == target).count()
    }

    pub fn tasks(&self) -> impl Iterator<Item = (TaskHandle, &Task)> {
        self.tasks.iter().map(|(&h, t)| (h, t))
    }

    /// Flat instance buffer of every live particle.
    pub fn particle_instances(&self) -> Vec<ParticleInstance> {
        let mut out = Vec::new();
        for task in self.tasks.values() {
            if let TaskKind::Particles(burst) = &task.kind {
                burst.write_instances(&mut out);
            }
        }
        out
    }

    pub fn trail_points(&self) -> Vec<TrailPoint> {
        self.tasks
            .values()
            .flat_map(|task| match &task.kind {
                TaskKind::Animation(anim) => anim.trail_points(),
                _ => Vec::new(),
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Copy the object's pose out, animate it and write it back.
/// Returns `true` when the task should be dropped.
fn step_object(anim: &mut Animation, id: ObjectId, ctx: &mut TaskContext<'_>, elapsed: f32, dt: f32) -> bool {
    let Some(object) = ctx.scene.object(id) else {
        return true;
    };
    let mut pose = object.transform;
    let mut material = object.material;

    let terrain = ctx
        .scene
        .terrain()
        .filter(|t| t.collision)
        .and_then(|t| t.height_at(pose.position.x, pose.position.z));
    let plane = ctx.ground_plane.then_some(0.0);
    let floor = match (terrain, plane) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    };

    let mut env = AnimationEnv { rng: &mut *ctx.rng, floor };
    let done = anim.step(&mut pose, &mut material, &mut env, elapsed, dt);

    if let Some(object) = ctx.scene.object_mut(id) {
        object.transform = pose;
        object.material = material;
    }
    ctx.bounds.invalidate(id);
    done
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::RigConfig;
    use crate::physics::Axis;
    use crate::player::ControlScheme;
    use crate::world::{MemoryScene, ObjectKind};
    use glam::Vec3;
    use rand::SeedableRng;

    struct Fixture {
        scene: MemoryScene,
        rig: CameraRig,
        rng: StdRng,
        bounds: BoundsCache,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                scene: MemoryScene::new(),
                rig: CameraRig::new(ControlScheme::FirstPerson, RigConfig::default()),
                rng: StdRng::seed_from_u64(1),
                bounds: BoundsCache::new(),
            }
        }

        fn step(&mut self, tasks: &mut TaskScheduler, frames: usize) {
            let mut ctx = TaskContext {
                scene: &mut self.scene,
                rig: &mut self.rig,
                rng: &mut self.rng,
                bounds: &mut self.bounds,
                ground_plane: true,
            };
            for _ in 0..frames {
                tasks.step(&mut ctx, 1.0 / 60.0);
            }
        }
    }

    #[test]
    fn test_upsert_retunes_continuous() {
        let mut tasks = TaskScheduler::new();
        let target = TaskTarget::Object(ObjectId(0));
        let a = tasks.upsert(target, TaskKind::Animation(Animation::spin(Axis::Y, 1.0)));
        let b = tasks.upsert(target, TaskKind::Animation(Animation::spin(Axis::Y, 2.0)));
        assert_eq!(a, b);
        assert_eq!(tasks.len(), 1);
    }

    #[test]
    fn test_particles_always_stack() {
        let mut fx = Fixture::new();
        let mut tasks = TaskScheduler::new();
        for _ in 0..2 {
            let burst = ParticleBurst::spawn(ParticleKind::Burst, Vec3::ZERO, [1.0; 3], &mut fx.rng);
            tasks.upsert(TaskTarget::World, TaskKind::Particles(burst));
        }
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks.particle_instances().len(), 2 * particles::PARTICLES_PER_BURST);
        fx.step(&mut tasks, 80);
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_orphaned_task_dropped() {
        let mut fx = Fixture::new();
        let id = fx.scene.spawn("spinner", ObjectKind::Box, Vec3::ZERO);
        let mut tasks = TaskScheduler::new();
        tasks.upsert(TaskTarget::Object(id), TaskKind::Animation(Animation::spin(Axis::Y, 2.0)));
        fx.step(&mut tasks, 60);
        let rotation = fx.scene.object(id).map(|o| o.transform.rotation.y).unwrap_or_default();
        assert!((rotation - 2.0).abs() < 1e-4);

        fx.scene.remove_object(id);
        fx.step(&mut tasks, 1);
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_cancel_target_clears_shake() {
        let mut fx = Fixture::new();
        let mut tasks = TaskScheduler::new();
        tasks.upsert(TaskTarget::Camera, TaskKind::Camera(CameraEffect::Shake { intensity: 1.0, duration: 5.0 }));
        fx.step(&mut tasks, 3);
        tasks.cancel_target(TaskTarget::Camera, &mut fx.rig);
        assert!(tasks.is_empty());
        assert_eq!(fx.rig.shake_offset, Vec3::ZERO);
    }
}
