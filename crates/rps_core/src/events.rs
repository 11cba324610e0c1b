//! Event records emitted by the world.
//!
//! The world reports every spawn and every decisive collision to an
//! [`EventSink`]. Sinks are invoked synchronously inside `spawn` and
//! `update` and must neither block nor fail. `()` is the null sink; an
//! [`EventLog`] keeps everything for later analysis or export.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::kind::Kind;

/// An agent entered the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnEvent {
    /// New agent's id.
    pub id: AgentId,
    /// New agent's kind.
    pub kind: Kind,
    /// Spawn x.
    pub x: f32,
    /// Spawn y.
    pub y: f32,
    /// World tick at spawn time.
    pub tick: u64,
}

/// A collision produced a kill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionEvent {
    /// Surviving agent.
    pub winner_id: AgentId,
    /// Surviving agent's kind.
    pub winner_kind: Kind,
    /// Defeated agent.
    pub loser_id: AgentId,
    /// Defeated agent's kind.
    pub loser_kind: Kind,
    /// Where the loser died.
    pub x: f32,
    /// Where the loser died.
    pub y: f32,
    /// Tick the collision was resolved on.
    pub tick: u64,
}

/// Receiver for world events.
pub trait EventSink {
    /// An agent was spawned.
    fn on_spawn(&mut self, event: &SpawnEvent);

    /// A collision was decided.
    fn on_collision(&mut self, event: &CollisionEvent);

    /// Forget everything recorded so far.
    fn clear(&mut self) {}
}

impl EventSink for () {
    fn on_spawn(&mut self, _event: &SpawnEvent) {}

    fn on_collision(&mut self, _event: &CollisionEvent) {}
}

/// Summary counts over an [`EventLog`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventStats {
    /// Spawn events recorded.
    pub total_spawns: usize,
    /// Collision events recorded.
    pub total_collisions: usize,
    /// Spawns per kind. Kinds never spawned are absent.
    pub spawns_by_kind: BTreeMap<Kind, usize>,
    /// Collisions won per kind.
    pub kills_by_kind: BTreeMap<Kind, usize>,
    /// Collisions lost per kind.
    pub deaths_by_kind: BTreeMap<Kind, usize>,
}

/// Recording sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLog {
    /// While false, incoming events are dropped.
    pub enabled: bool,
    spawns: Vec<SpawnEvent>,
    collisions: Vec<CollisionEvent>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog {
    /// Empty, enabled log.
    #[must_use]
    pub fn new() -> Self {
        Self {
            enabled: true,
            spawns: Vec::new(),
            collisions: Vec::new(),
        }
    }

    /// Recorded spawns, oldest first.
    #[must_use]
    pub fn spawns(&self) -> &[SpawnEvent] {
        &self.spawns
    }

    /// Recorded collisions, oldest first.
    #[must_use]
    pub fn collisions(&self) -> &[CollisionEvent] {
        &self.collisions
    }

    /// Aggregate counts.
    #[must_use]
    pub fn stats(&self) -> EventStats {
        let mut stats = EventStats {
            total_spawns: self.spawns.len(),
            total_collisions: self.collisions.len(),
            ..EventStats::default()
        };

        for event in &self.spawns {
            *stats.spawns_by_kind.entry(event.kind).or_default() += 1;
        }
        for event in &self.collisions {
            *stats.kills_by_kind.entry(event.winner_kind).or_default() += 1;
            *stats.deaths_by_kind.entry(event.loser_kind).or_default() += 1;
        }

        stats
    }
}

impl EventSink for EventLog {
    fn on_spawn(&mut self, event: &SpawnEvent) {
        if self.enabled {
            self.spawns.push(event.clone());
        }
    }

    fn on_collision(&mut self, event: &CollisionEvent) {
        if self.enabled {
            self.collisions.push(event.clone());
        }
    }

    fn clear(&mut self) {
        self.spawns.clear();
        self.collisions.clear();
    }
}
