//! Script runtime
//!
//! Block scripts arrive as [`CompiledScript`] trees, are lowered once into
//! [`Op`] blocks, and run as resumable [`Routine`]s started by game events.

pub mod ast;
mod commands;
pub mod condition;
pub mod dispatcher;
pub mod interpreter;
pub mod ops;
pub mod params;
pub mod routine;

pub use ast::{CompiledScript, ObjectScripts, RawCommand, ScriptBundle, ScriptSource};
pub use condition::{Compare, Condition, KeyFilter};
pub use dispatcher::{CollisionSource, Dispatcher, GameEvent, QueuedEvent, RunningScript};
pub use interpreter::{Flow, MAX_CALL_DEPTH, OP_BUDGET, WAIT_UNTIL_POLL};
pub use ops::{Aim, Block, CollideFilter, LoweredScript, Op, TargetRef, Trigger};
pub use routine::{Frame, FrameKind, Owner, Routine, RoutineArena, RoutineId, Wake};
