//! Pairwise collision detection and resolution.
//!
//! Detection is an exhaustive scan over unique unordered pairs of living
//! agents. Resolution processes pairs in ascending `(min id, max id)`
//! order so that an agent caught in several overlaps is always settled
//! the same way.

use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentId};
use crate::config::Config;
use crate::events::{CollisionEvent, EventSink};
use crate::kind::Outcome;
use crate::rng::SimRng;

/// Two overlapping agents found by detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollisionPair {
    /// First agent, earlier in population order.
    pub a: AgentId,
    /// Second agent.
    pub b: AgentId,
}

impl CollisionPair {
    /// Key used to order resolution.
    #[must_use]
    pub fn sort_key(&self) -> (AgentId, AgentId) {
        (self.a.min(self.b), self.a.max(self.b))
    }
}

/// What resolving a pair did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionOutcome {
    /// Different kinds: the dominant agent killed the other.
    Kill {
        /// Surviving agent.
        winner: AgentId,
        /// Defeated agent.
        loser: AgentId,
    },
    /// Same kind with tie-bounce enabled: both bounced apart.
    Bounce {
        /// First agent.
        a: AgentId,
        /// Second agent.
        b: AgentId,
    },
}

/// Detects and resolves collisions for one world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionResolver {
    /// Ticks an agent sits out after a resolved collision.
    pub cooldown_ticks: u64,
    /// Same-kind pairs bounce apart.
    pub bounce_on_tie: bool,
}

impl CollisionResolver {
    /// Resolver using `config`'s cooldown and tie policy.
    #[must_use]
    pub const fn new(config: &Config) -> Self {
        Self {
            cooldown_ticks: config.collision_cooldown_ticks,
            bounce_on_tie: config.bounce_on_tie,
        }
    }

    /// Find every overlapping pair among `agents` at `tick`.
    ///
    /// Dead agents and agents still cooling down from an earlier collision
    /// are skipped. Pairs come out in scan order.
    pub fn detect_collisions<'a, I>(&self, agents: I, tick: u64) -> Vec<CollisionPair>
    where
        I: IntoIterator<Item = &'a Agent>,
    {
        let candidates: Vec<&Agent> = agents
            .into_iter()
            .filter(|agent| agent.alive && !agent.on_cooldown(tick, self.cooldown_ticks))
            .collect();

        let mut pairs = Vec::new();
        for (i, first) in candidates.iter().enumerate() {
            for second in &candidates[i + 1..] {
                if first.collides_with(second) {
                    pairs.push(CollisionPair {
                        a: first.id,
                        b: second.id,
                    });
                }
            }
        }
        pairs
    }

    /// Settle `pairs` against `agents`, which must be sorted by id.
    ///
    /// Pairs whose agents died earlier in the same pass (or are missing)
    /// are skipped. Every kill is reported to `sink` with the loser's
    /// position.
    pub fn resolve_collisions<S: EventSink + ?Sized>(
        &self,
        agents: &mut [Agent],
        mut pairs: Vec<CollisionPair>,
        tick: u64,
        sink: &mut S,
        rng: &mut SimRng,
    ) -> Vec<CollisionOutcome> {
        pairs.sort_by_key(CollisionPair::sort_key);

        let mut outcomes = Vec::new();
        for pair in pairs {
            let Some((a, b)) = pair_mut(agents, pair.a, pair.b) else {
                continue;
            };
            if !(a.alive && b.alive) {
                continue;
            }

            a.last_collision_tick = Some(tick);
            b.last_collision_tick = Some(tick);

            match a.compare(b) {
                Outcome::Win => outcomes.push(settle_kill(a, b, tick, sink)),
                Outcome::Lose => outcomes.push(settle_kill(b, a, tick, sink)),
                Outcome::Tie if self.bounce_on_tie => {
                    a.soft_bounce(b, rng);
                    b.soft_bounce(a, rng);
                    outcomes.push(CollisionOutcome::Bounce { a: a.id, b: b.id });
                }
                Outcome::Tie => {}
            }
        }
        outcomes
    }
}

fn settle_kill<S: EventSink + ?Sized>(
    winner: &mut Agent,
    loser: &mut Agent,
    tick: u64,
    sink: &mut S,
) -> CollisionOutcome {
    winner.kills += 1;
    loser.kill();

    tracing::debug!(
        tick,
        winner = %winner.name,
        loser = %loser.name,
        winner_kind = %winner.kind,
        loser_kind = %loser.kind,
        "Collision kill"
    );

    sink.on_collision(&CollisionEvent {
        winner_id: winner.id,
        winner_kind: winner.kind,
        loser_id: loser.id,
        loser_kind: loser.kind,
        x: loser.position.x,
        y: loser.position.y,
        tick,
    });

    CollisionOutcome::Kill {
        winner: winner.id,
        loser: loser.id,
    }
}

/// Disjoint mutable borrows of two agents in an id-sorted slice.
fn pair_mut(agents: &mut [Agent], a: AgentId, b: AgentId) -> Option<(&mut Agent, &mut Agent)> {
    let ia = agents.binary_search_by_key(&a, |agent| agent.id).ok()?;
    let ib = agents.binary_search_by_key(&b, |agent| agent.id).ok()?;

    if ia < ib {
        let (lo, hi) = agents.split_at_mut(ib);
        Some((lo.get_mut(ia)?, hi.first_mut()?))
    } else if ib < ia {
        let (lo, hi) = agents.split_at_mut(ia);
        let second = lo.get_mut(ib)?;
        Some((hi.first_mut()?, second))
    } else {
        None
    }
}
