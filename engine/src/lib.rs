//! Blockplay Engine Library
//!
//! Play-mode runtime for a no-code 3D game builder. The engine layer holds
//! the window-agnostic building blocks (spatial math, input, player
//! movement, camera rig, scene collaborator); the game layer in `src/game/`
//! runs compiled block scripts, tasks, collisions and combat on top of them.
//!
//! # Modules
//!
//! - [`physics`] - Vectors, AABBs, ray tests and projectile kinematics
//! - [`world`] - The [`world::Scene`] trait, scene objects and heightmap terrain
//! - [`input`] - Platform-agnostic keyboard state and action bindings
//! - [`player`] - Kinematic player controller and control schemes
//! - [`camera`] - Camera rig and screen-space raycasting
//! - [`game`] - Script interpreter, tasks, combat and the [`game::PlayRuntime`]
//!
//! # Example
//!
//! ```ignore
//! use blockplay_engine::game::{PlayRuntime, PlaySettings, ScriptBundle};
//! use blockplay_engine::world::MemoryScene;
//!
//! let mut runtime = PlayRuntime::new(MemoryScene::new(), ScriptBundle::default());
//! runtime.start(PlaySettings::default())?;
//! for _ in 0..60 {
//!     runtime.update();
//! }
//! println!("{:?}", runtime.hud());
//! runtime.stop();
//! ```

pub mod camera;
pub mod input;
pub mod physics;
pub mod player;
pub mod world;

// Game runtime (located in src/game/ directory)
#[path = "../../src/game/mod.rs"]
pub mod game;

// Re-export commonly used input types
pub use input::{InputAction, InputState, KeyBindings, KeyCode};
// Re-export player types
pub use player::{ControlScheme, PlayerController};
// Re-export scene types
pub use world::{MemoryScene, ObjectId, Scene, SceneObject};
