//! Event dispatch
//!
//! Running scripts are matched against game events in registration order.
//! Every match starts a fresh routine; fresh routines run to their first
//! suspension when the session settles. Events raised while a routine runs
//! (`broadcast`, collisions, defeats) are queued and drained after it.

use std::collections::VecDeque;

use super::ops::{Block, CollideFilter, LoweredScript, Trigger};
use super::routine::{Owner, Routine, RoutineId};
use crate::game::session::Session;
use crate::input::KeyCode;
use crate::world::{ObjectId, Scene};

/// Events drained per settle before the rest wait for the next frame.
pub const MAX_EVENTS_PER_SETTLE: usize = 256;

/// A script registered for the session.
#[derive(Debug, Clone)]
pub struct RunningScript {
    pub owner: Owner,
    pub trigger: Trigger,
    pub body: Block,
}

impl RunningScript {
    pub fn new(owner: Owner, lowered: LoweredScript) -> Self {
        Self {
            owner,
            trigger: lowered.trigger,
            body: lowered.body,
        }
    }

    /// Whether this script's trigger accepts `event`.
    pub fn matches(&self, event: &GameEvent) -> bool {
        match (&self.trigger, event) {
            (Trigger::Start, GameEvent::Start) => true,
            (Trigger::KeyPress(filter), GameEvent::KeyPress(key)) => filter.matches(*key),
            (Trigger::Click, GameEvent::Click) => true,
            (Trigger::Collide(filter), GameEvent::Collide(source)) => match (filter, source) {
                (CollideFilter::Any | CollideFilter::Player, CollisionSource::Player) => true,
                (CollideFilter::Any | CollideFilter::Projectile, CollisionSource::Projectile) => true,
                (CollideFilter::Named(wanted), CollisionSource::Object(name)) => wanted == name,
                _ => false,
            },
            (Trigger::Message(wanted), GameEvent::Message(message)) => wanted == message,
            (Trigger::HealthZero, GameEvent::HealthZero) => true,
            (Trigger::LivesZero, GameEvent::LivesZero) => true,
            (Trigger::TimerEnd, GameEvent::TimerEnd) => true,
            (Trigger::EnemyDefeated, GameEvent::EnemyDefeated) => true,
            (Trigger::ItemCollected(filter), GameEvent::ItemCollected(item)) => {
                filter.as_ref().is_none_or(|wanted| wanted == item)
            }
            _ => false,
        }
    }
}

/// What touched an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollisionSource {
    Player,
    Projectile,
    /// Another object, by name
    Object(String),
}

/// A discrete event scripts can react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    Start,
    KeyPress(KeyCode),
    Click,
    Collide(CollisionSource),
    Message(String),
    HealthZero,
    LivesZero,
    TimerEnd,
    EnemyDefeated,
    ItemCollected(String),
}

/// An event waiting to be dispatched, optionally restricted to one object.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedEvent {
    pub event: GameEvent,
    pub target: Option<ObjectId>,
}

/// Scripts, pending events and routines not yet started.
#[derive(Debug, Default)]
pub struct Dispatcher {
    pub scripts: Vec<RunningScript>,
    pub events: VecDeque<QueuedEvent>,
    pub fresh: VecDeque<RoutineId>,
}

impl Dispatcher {
    pub fn new(scripts: Vec<RunningScript>) -> Self {
        Self {
            scripts,
            events: VecDeque::new(),
            fresh: VecDeque::new(),
        }
    }

    pub fn queue(&mut self, event: GameEvent, target: Option<ObjectId>) {
        self.events.push_back(QueuedEvent { event, target });
    }

    /// Body of the `defineBlock` script named `name` on `owner`.
    pub fn definition(&self, owner: Owner, name: &str) -> Option<Block> {
        self.scripts
            .iter()
            .find(|s| s.owner == owner && matches!(&s.trigger, Trigger::Definition(n) if n == name))
            .map(|s| s.body.clone())
    }

    pub fn clear(&mut self) {
        self.scripts.clear();
        self.events.clear();
        self.fresh.clear();
    }
}

impl Session {
    /// Start a routine for every script matching `event`.
    ///
    /// Returns how many scripts matched.
    pub fn dispatch(&mut self, scene: &dyn Scene, event: &GameEvent, target: Option<ObjectId>) -> usize {
        let mut started = Vec::new();
        for script in &self.dispatcher.scripts {
            if target.is_some_and(|t| script.owner != Owner::Object(t)) {
                continue;
            }
            if !self.owner_alive(scene, script.owner) || !script.matches(event) {
                continue;
            }
            started.push(Routine::new(script.owner, script.body.clone()));
        }
        let count = started.len();
        if count > 0 {
            tracing::debug!("{:?} started {} routine(s)", event, count);
        }
        for routine in started {
            let id = self.routines.insert(routine);
            self.dispatcher.fresh.push_back(id);
        }
        count
    }

    /// Fire every `onTimer` script whose interval elapsed.
    pub fn fire_timers(&mut self, scene: &dyn Scene) {
        let mut due = Vec::new();
        for timer in &mut self.timers {
            while self.time + 1e-4 >= timer.next_at {
                timer.next_at += timer.interval;
                due.push(timer.script);
            }
        }
        for index in due {
            let Some(script) = self.dispatcher.scripts.get(index) else { continue };
            if !self.owner_alive(scene, script.owner) {
                continue;
            }
            let routine = Routine::new(script.owner, script.body.clone());
            let id = self.routines.insert(routine);
            self.dispatcher.fresh.push_back(id);
        }
    }

    /// Run fresh routines and drain queued events until both are empty.
    pub fn settle(&mut self, scene: &mut dyn Scene) {
        let mut drained = 0;
        loop {
            while let Some(id) = self.dispatcher.fresh.pop_front() {
                self.run_routine(scene, id);
            }
            if drained >= MAX_EVENTS_PER_SETTLE {
                if !self.dispatcher.events.is_empty() {
                    tracing::warn!(
                        "event storm: {} event(s) deferred to the next frame",
                        self.dispatcher.events.len()
                    );
                }
                break;
            }
            let Some(queued) = self.dispatcher.events.pop_front() else { break };
            drained += 1;
            self.dispatch(scene, &queued.event, queued.target);
        }
    }
}
