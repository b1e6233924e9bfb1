//! Resumable routines
//!
//! A routine is one running instance of a script body. It is an explicit
//! state machine: a stack of frames (block + program counter + loop state)
//! and a wake condition saying when it may run again. Routines live in a
//! [`RoutineArena`] keyed by [`RoutineId`]; dropping an arena entry is how a
//! routine is cancelled.

use std::collections::BTreeMap;
use std::rc::Rc;

use super::condition::Condition;
use super::ops::Block;
use crate::world::ObjectId;

/// Who a script belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Owner {
    Object(ObjectId),
    /// Scripts not attached to an object
    Global,
}

impl Owner {
    pub fn object(self) -> Option<ObjectId> {
        match self {
            Owner::Object(id) => Some(id),
            Owner::Global => None,
        }
    }
}

/// Handle of a routine in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoutineId(pub u64);

/// Loop state of a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameKind {
    /// Plain block: script body or an `if` branch
    Sequence,
    /// `callBlock` body; counts toward the recursion limit
    Call,
    Repeat { remaining: u32 },
    /// Body of a detached `forever` routine
    Forever,
    While(Rc<Condition>),
    ForEach { var: String, next: i64, end: i64 },
}

/// One level of the routine's block stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub block: Block,
    pub pc: usize,
    pub kind: FrameKind,
    /// Set when an iteration is about to begin and its entry check is pending
    pub iteration_start: bool,
}

impl Frame {
    pub fn new(block: Block, kind: FrameKind) -> Self {
        Self {
            block,
            pc: 0,
            kind,
            iteration_start: true,
        }
    }

    /// Rewind for the next loop iteration.
    pub fn restart(&mut self) {
        self.pc = 0;
        self.iteration_start = true;
    }
}

/// When a suspended routine may resume.
#[derive(Debug, Clone, PartialEq)]
pub enum Wake {
    Ready,
    /// Session time reached
    At(f32),
    /// Condition true; polled at `poll_at` and every 0.1 s after
    Until { condition: Rc<Condition>, poll_at: f32 },
    /// Dialog with this id acknowledged
    Dialog(u64),
    /// Frame counter reached
    Tick(u64),
}

/// A running script instance.
#[derive(Debug, Clone)]
pub struct Routine {
    pub owner: Owner,
    pub frames: Vec<Frame>,
    pub wake: Wake,
    /// Detached `forever` routine
    pub detached: bool,
}

impl Routine {
    /// Routine that runs `block` once from the top.
    pub fn new(owner: Owner, block: Block) -> Self {
        Self {
            owner,
            frames: vec![Frame::new(block, FrameKind::Sequence)],
            wake: Wake::Ready,
            detached: false,
        }
    }

    /// Detached routine repeating `block` until cancelled.
    pub fn forever(owner: Owner, block: Block) -> Self {
        Self {
            owner,
            frames: vec![Frame::new(block, FrameKind::Forever)],
            wake: Wake::Ready,
            detached: true,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.frames.is_empty()
    }

    /// Nesting depth of `callBlock` frames.
    pub fn call_depth(&self) -> usize {
        self.frames.iter().filter(|f| f.kind == FrameKind::Call).count()
    }
}

/// Arena of live routines, iterated in creation order.
#[derive(Debug, Default)]
pub struct RoutineArena {
    routines: BTreeMap<RoutineId, Routine>,
    next_id: u64,
}

impl RoutineArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, routine: Routine) -> RoutineId {
        let id = RoutineId(self.next_id);
        self.next_id += 1;
        self.routines.insert(id, routine);
        id
    }

    /// Take a routine out for execution. Put it back with [`RoutineArena::put`].
    pub fn take(&mut self, id: RoutineId) -> Option<Routine> {
        self.routines.remove(&id)
    }

    pub fn put(&mut self, id: RoutineId, routine: Routine) {
        self.routines.insert(id, routine);
    }

    pub fn get(&self, id: RoutineId) -> Option<&Routine> {
        self.routines.get(&id)
    }

    pub fn ids(&self) -> Vec<RoutineId> {
        self.routines.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.routines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }

    /// Drop every routine whose owner fails `keep`.
    pub fn retain_owners(&mut self, mut keep: impl FnMut(Owner) -> bool) {
        self.routines.retain(|_, r| keep(r.owner));
    }

    pub fn clear(&mut self) {
        self.routines.clear();
    }
}
