//! Seeded agent construction.
//!
//! The factory owns the simulation RNG stream, the name allocator and the
//! id allocator. Everything random about a new agent (position for the
//! random variants, heading, speed, name) is drawn here, in a fixed order,
//! so the same seed and the same sequence of calls yield identical agents.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentId};
use crate::config::{Config, KindProfiles};
use crate::error::Result;
use crate::kind::Kind;
use crate::math::Vec2;
use crate::names::NameAllocator;
use crate::rng::{seeded, SimRng};

/// Monotonic agent id source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    next: AgentId,
}

impl IdAllocator {
    /// Allocator starting at id 0.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// Hand out the next id.
    pub fn next_id(&mut self) -> AgentId {
        let id = self.next;
        self.next += 1;
        id
    }

    /// The id the next call to [`next_id`](Self::next_id) returns.
    #[must_use]
    pub const fn peek(&self) -> AgentId {
        self.next
    }
}

/// Builds agents with deterministic, seed-derived randomness.
#[derive(Debug, Clone)]
pub struct AgentFactory {
    profiles: KindProfiles,
    width: f32,
    height: f32,
    rng: SimRng,
    names: NameAllocator,
    ids: IdAllocator,
}

impl AgentFactory {
    /// Create a factory for `config`, seeded with `seed`.
    #[must_use]
    pub fn new(config: &Config, seed: u64) -> Self {
        Self::with_id_allocator(config, seed, IdAllocator::new())
    }

    /// Create a factory that continues an existing id sequence.
    #[must_use]
    pub fn with_id_allocator(config: &Config, seed: u64, ids: IdAllocator) -> Self {
        Self {
            profiles: config.kinds,
            width: config.width,
            height: config.height,
            rng: seeded(seed),
            names: NameAllocator::new(seed),
            ids,
        }
    }

    /// Create an agent of `kind` at `position`.
    ///
    /// Without a velocity, heading and speed are drawn from the kind's
    /// profile.
    pub fn create_agent(&mut self, kind: Kind, position: Vec2, velocity: Option<Vec2>) -> Agent {
        let id = self.ids.next_id();
        let name = self.names.allocate(kind);
        Agent::new(
            id,
            kind,
            name,
            position,
            velocity,
            self.profiles.get(kind),
            &mut self.rng,
        )
    }

    /// Create an agent from a kind tag such as `"rock"`.
    ///
    /// Unknown tags are a hard error and consume no randomness or ids.
    pub fn create_agent_tagged(
        &mut self,
        tag: &str,
        position: Vec2,
        velocity: Option<Vec2>,
    ) -> Result<Agent> {
        let kind = tag.parse::<Kind>().map_err(|e| {
            tracing::error!(tag, "Rejected unknown agent kind");
            e
        })?;
        Ok(self.create_agent(kind, position, velocity))
    }

    /// Uniformly random position inside the arena.
    pub fn random_position(&mut self) -> Vec2 {
        let x = self.rng.gen_range(0.0..self.width);
        let y = self.rng.gen_range(0.0..self.height);
        Vec2::new(x, y)
    }

    /// Create an agent of `kind` at a random position.
    pub fn create_random_agent(&mut self, kind: Kind) -> Agent {
        let position = self.random_position();
        self.create_agent(kind, position, None)
    }

    /// Create `count` agents of `kind` at random positions.
    pub fn create_batch(&mut self, kind: Kind, count: usize) -> Vec<Agent> {
        (0..count).map(|_| self.create_random_agent(kind)).collect()
    }

    /// Create `count_per_kind` agents of every kind, in canonical kind order.
    pub fn create_balanced_population(&mut self, count_per_kind: usize) -> BTreeMap<Kind, Vec<Agent>> {
        Kind::ALL
            .into_iter()
            .map(|kind| (kind, self.create_batch(kind, count_per_kind)))
            .collect()
    }

    /// Kinds this factory can build.
    #[must_use]
    pub fn available_kinds(&self) -> &'static [Kind] {
        &Kind::ALL
    }

    /// The simulation RNG stream.
    pub fn rng_mut(&mut self) -> &mut SimRng {
        &mut self.rng
    }

    /// The id sequence, for carrying over into a rebuilt factory.
    #[must_use]
    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use crate::names::pool;

    fn factory(seed: u64) -> AgentFactory {
        AgentFactory::new(&Config::default(), seed)
    }

    #[test]
    fn test_agent_uses_kind_profile() {
        let mut f = factory(42);
        let agent = f.create_agent(Kind::Scissors, Vec2::new(10.0, 20.0), None);
        assert_eq!(agent.kind, Kind::Scissors);
        assert_eq!(agent.radius, 13.0);
        assert_eq!(agent.position, Vec2::new(10.0, 20.0));
        assert!(pool(Kind::Scissors).contains(&agent.name.as_str()));
        assert!(agent.alive);
        assert_eq!(agent.last_collision_tick, None);
    }

    #[test]
    fn test_ids_are_monotonic() {
        let mut f = factory(1);
        let ids: Vec<_> = (0..5)
            .map(|_| f.create_agent(Kind::Rock, Vec2::ZERO, None).id)
            .collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert_eq!(f.ids().peek(), 5);
    }

    #[test]
    fn test_id_allocator_carries_over() {
        let mut f = factory(1);
        f.create_agent(Kind::Rock, Vec2::ZERO, None);
        f.create_agent(Kind::Rock, Vec2::ZERO, None);

        let mut rebuilt = AgentFactory::with_id_allocator(&Config::default(), 2, f.ids().clone());
        assert_eq!(rebuilt.create_agent(Kind::Paper, Vec2::ZERO, None).id, 2);
    }

    #[test]
    fn test_unknown_tag_is_an_error() {
        let mut f = factory(1);
        let err = f.create_agent_tagged("lizard", Vec2::ZERO, None).unwrap_err();
        assert!(matches!(err, SimError::UnknownKind(tag) if tag == "lizard"));
        // No id was consumed
        assert_eq!(f.ids().peek(), 0);

        let agent = f.create_agent_tagged("paper", Vec2::ZERO, None).unwrap();
        assert_eq!(agent.kind, Kind::Paper);
    }

    #[test]
    fn test_random_agents_inside_arena() {
        let config = Config::default().with_size(300.0, 200.0);
        let mut f = AgentFactory::new(&config, 9);
        for agent in f.create_batch(Kind::Rock, 100) {
            assert!((0.0..300.0).contains(&agent.position.x));
            assert!((0.0..200.0).contains(&agent.position.y));
        }
    }

    #[test]
    fn test_balanced_population() {
        let mut f = factory(3);
        let population = f.create_balanced_population(4);
        assert_eq!(population.len(), 3);
        for kind in Kind::ALL {
            let agents = &population[&kind];
            assert_eq!(agents.len(), 4);
            assert!(agents.iter().all(|a| a.kind == kind));
        }
    }

    #[test]
    fn test_same_seed_same_agents() {
        let mut a = factory(42);
        let mut b = factory(42);
        assert_eq!(a.create_batch(Kind::Paper, 20), b.create_batch(Kind::Paper, 20));

        let mut c = factory(43);
        assert_ne!(a.create_batch(Kind::Paper, 5), c.create_batch(Kind::Paper, 5));
    }
}
