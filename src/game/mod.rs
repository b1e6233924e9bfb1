//! Game Module
//!
//! Play-mode runtime that builds on top of the engine: compiled block
//! scripts, per-frame tasks, collisions, combat and presentation output.

pub mod config;
pub mod error;
pub mod project;
pub mod runtime;
pub mod script;
pub mod session;
pub mod state;
pub mod systems;
pub mod tasks;
pub mod ui;

pub use config::{CollisionTuning, FIXED_STEP, PlaySettings};
pub use error::{ProjectError, RuntimeError};
pub use project::{PlaybackEvent, PlaybackInput, ProjectFile};
pub use runtime::{CLICK_RANGE, PlayRuntime};
pub use script::{CollisionSource, CompiledScript, GameEvent, RawCommand, ScriptBundle, ScriptSource};
pub use session::{SceneSnapshot, Session};
pub use state::{GameState, Outcome};
pub use tasks::{ParticleInstance, TaskScheduler};
pub use ui::{HudSnapshot, Presentation, UiScreenDef};
