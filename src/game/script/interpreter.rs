//! Routine interpreter
//!
//! Executes a routine's frame stack until it suspends, finishes or uses up
//! its per-slice operation budget. Loop frames check their entry condition
//! at the start of every iteration; `while` and `forever` yield one frame
//! between iterations.

use rand::Rng;

use super::condition::{Condition, KeyFilter};
use super::routine::{Frame, FrameKind, Owner, Routine, RoutineId, Wake};
use crate::game::session::Session;
use crate::game::systems::collision_system::CollisionSystem;
use crate::world::Scene;

/// Operations one routine may execute before it is forced to yield.
pub const OP_BUDGET: usize = 10_000;

/// Maximum nesting of `callBlock` frames.
pub const MAX_CALL_DEPTH: usize = 32;

/// Poll period of `waitUntil` (seconds).
pub const WAIT_UNTIL_POLL: f32 = 0.1;

/// Outcome of a loop frame's entry check.
enum Entry {
    Enter,
    Skip,
    /// Owner gone; the whole routine ends
    Abort,
}

/// What the interpreter does after one operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Continue,
    /// Suspend the routine until the wake condition holds
    Suspend(Wake),
    /// Enter a nested block
    Push(Frame),
    /// End the routine
    Finish,
}

impl Session {
    /// Run one routine slice and keep it in the arena if it suspended.
    pub fn run_routine(&mut self, scene: &mut dyn Scene, id: RoutineId) {
        let Some(mut routine) = self.routines.take(id) else { return };
        if !self.owner_alive(scene, routine.owner) {
            return;
        }
        self.execute(scene, &mut routine);
        if !routine.is_finished() {
            self.routines.put(id, routine);
        }
    }

    /// The per-frame routine pass: resume every routine whose wake holds.
    pub fn step_routines(&mut self, scene: &mut dyn Scene) {
        for id in self.routines.ids() {
            if self.game.is_over() {
                return;
            }
            if self.dispatcher.fresh.contains(&id) {
                continue;
            }
            let Some(routine) = self.routines.get(id) else { continue };
            let owner = routine.owner;
            let wake = routine.wake.clone();
            if !self.owner_alive(scene, owner) {
                self.routines.take(id);
                continue;
            }
            let ready = match wake {
                Wake::Ready => true,
                Wake::At(at) => self.time + 1e-4 >= at,
                Wake::Tick(tick) => self.tick >= tick,
                Wake::Dialog(dialog) => !self.presentation.dialogs.iter().any(|d| d.id == dialog),
                Wake::Until { condition, poll_at } => {
                    if self.time + 1e-4 < poll_at {
                        false
                    } else if self.eval_condition(scene, owner, &condition) {
                        true
                    } else {
                        if let Some(mut routine) = self.routines.take(id) {
                            routine.wake = Wake::Until { condition, poll_at: self.time + WAIT_UNTIL_POLL };
                            self.routines.put(id, routine);
                        }
                        false
                    }
                }
            };
            if ready {
                self.run_routine(scene, id);
            }
        }
    }

    fn execute(&mut self, scene: &mut dyn Scene, routine: &mut Routine) {
        routine.wake = Wake::Ready;
        let owner = routine.owner;
        let mut budget = OP_BUDGET;

        loop {
            if self.game.is_over() {
                return;
            }
            if budget == 0 {
                tracing::warn!("{:?}: operation budget exhausted, yielding", owner);
                routine.wake = Wake::Tick(self.tick + 1);
                return;
            }

            let call_depth = routine.call_depth();
            let Some(frame) = routine.frames.last_mut() else { return };

            if frame.iteration_start {
                frame.iteration_start = false;
                let entry = match &mut frame.kind {
                    FrameKind::Sequence | FrameKind::Call => Entry::Enter,
                    FrameKind::Repeat { remaining } => {
                        if *remaining == 0 {
                            Entry::Skip
                        } else {
                            *remaining -= 1;
                            Entry::Enter
                        }
                    }
                    FrameKind::While(condition) => {
                        let condition = condition.clone();
                        if self.eval_condition(scene, owner, &condition) { Entry::Enter } else { Entry::Skip }
                    }
                    FrameKind::ForEach { var, next, end } => {
                        if *next > *end {
                            Entry::Skip
                        } else {
                            self.game.set_var(var, *next as f64);
                            *next = next.saturating_add(1);
                            Entry::Enter
                        }
                    }
                    FrameKind::Forever => {
                        if self.owner_alive(scene, owner) { Entry::Enter } else { Entry::Abort }
                    }
                };
                match entry {
                    Entry::Enter => {}
                    Entry::Skip => {
                        routine.frames.pop();
                        continue;
                    }
                    Entry::Abort => {
                        routine.frames.clear();
                        return;
                    }
                }
                continue;
            }

            if frame.pc >= frame.block.len() {
                budget -= 1;
                let yields = matches!(frame.kind, FrameKind::While(_) | FrameKind::Forever);
                if matches!(frame.kind, FrameKind::Sequence | FrameKind::Call) {
                    routine.frames.pop();
                    continue;
                }
                frame.restart();
                if yields {
                    routine.wake = Wake::Tick(self.tick + 1);
                    return;
                }
                continue;
            }

            let block = frame.block.clone();
            let pc = frame.pc;
            frame.pc += 1;
            budget -= 1;

            match self.exec_op(scene, owner, &block[pc], call_depth) {
                Flow::Continue => {}
                Flow::Push(frame) => routine.frames.push(frame),
                Flow::Suspend(wake) => {
                    routine.wake = wake;
                    return;
                }
                Flow::Finish => {
                    routine.frames.clear();
                    return;
                }
            }
        }
    }

    /// Evaluate a condition for a routine of `owner`.
    pub fn eval_condition(&mut self, scene: &dyn Scene, owner: Owner, condition: &Condition) -> bool {
        let object = owner.object().and_then(|id| scene.object(id));
        match condition {
            Condition::PlayerNear(distance) => {
                object.is_some_and(|o| o.transform.position.distance(self.player.position) <= *distance)
            }
            Condition::PlayerFar(distance) => {
                object.is_some_and(|o| o.transform.position.distance(self.player.position) > *distance)
            }
            Condition::KeyPressed(filter) => match filter {
                KeyFilter::Any => self.input.keyboard.any_pressed(),
                KeyFilter::Key(key) => self.input.keyboard.is_pressed(*key),
                KeyFilter::Invalid => false,
            },
            Condition::Var { name, compare, value } => compare.apply(self.game.var(name), *value),
            Condition::LocalVar { name, compare, value } => {
                let local = object.and_then(|o| o.locals.get(name).copied()).unwrap_or(0.0);
                compare.apply(local, *value)
            }
            Condition::Random(chance) => self.rng.gen_range(0.0f32..1.0) < *chance,
            Condition::TouchingPlayer => match object {
                Some(o) => {
                    let bounds = self.bounds.bounds(o);
                    CollisionSystem::is_touching(self.player.position, &bounds, &self.settings.tuning)
                }
                None => false,
            },
            Condition::HealthBelow(amount) => self.game.health < *amount,
            Condition::HasItem(name) => self.game.has_item(name),
            Condition::IsVisible => object.is_some_and(|o| o.visible),
            Condition::Const(value) => *value,
        }
    }
}
