//! World Module
//!
//! The scene collaborator interface and world-space geometry the runtime
//! simulates against: scene objects behind stable handles, the render camera,
//! and heightmap terrain.

pub mod scene;
pub mod terrain;

pub use scene::{
    Camera, Keyframe, KeyframeTrack, Material, MemoryScene, ObjectId, ObjectKind, QuickAnimation,
    QuickAnimationKind, Scene, SceneObject, Transform,
};
pub use terrain::Heightmap;
