//! The world: population owner and tick driver.
//!
//! # Tick order
//!
//! Each call to [`World::update`] runs, in order:
//! 1. **Motion** - every live agent steers (if enabled), moves and applies
//!    the boundary policy, one at a time in spawn order
//! 2. **Collisions** - overlapping live pairs are detected and resolved
//! 3. **Cleanup** - newly dead agents leave the live lists
//! 4. **Win check** - if exactly one kind is still alive the game is over
//! 5. The tick counter advances
//!
//! # Storage
//!
//! Every agent ever spawned stays in `history`, in id order, so the
//! end-of-game scoreboard can include the fallen. The live population and
//! the per-kind partitions are index lists into that history.
//!
//! # Example
//!
//! ```
//! use rps_core::prelude::*;
//!
//! let config = Config::default().with_seed(42).with_steering(false);
//! let mut world = World::new(config).unwrap();
//!
//! world.spawn(Kind::Rock, Vec2::new(100.0, 100.0), None);
//! world.spawn(Kind::Scissors, Vec2::new(105.0, 100.0), None);
//! world.update(1.0 / 60.0);
//!
//! assert_eq!(world.total_count(), 1);
//! assert!(world.is_game_over());
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::ops::RangeInclusive;

use rand::Rng;

use crate::agent::{Agent, AgentId, Population};
use crate::collision::{CollisionOutcome, CollisionResolver};
use crate::config::{BoundaryMode, Config};
use crate::error::Result;
use crate::events::{EventSink, SpawnEvent};
use crate::factory::AgentFactory;
use crate::ingest::SpawnReceiver;
use crate::kind::Kind;
use crate::math::Vec2;
use crate::rng::fresh_seed;

/// Per-kind count range for [`World::spawn_uneven_batch`].
pub const UNEVEN_BATCH_RANGE: RangeInclusive<u32> = 30..=60;

/// What happened during one call to [`World::update`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Tick that was processed.
    pub tick: u64,
    /// False when the world was paused or already over.
    pub advanced: bool,
    /// Resolved collisions, in resolution order.
    pub outcomes: Vec<CollisionOutcome>,
    /// Agents that died this tick.
    pub deaths: Vec<AgentId>,
    /// The game ended on this tick.
    pub game_over: bool,
}

/// Owns the agent population and runs the simulation.
///
/// Generic over the event sink; the default `()` discards events.
#[derive(Debug, Clone)]
pub struct World<S: EventSink = ()> {
    config: Config,
    seed: u64,
    factory: AgentFactory,
    resolver: CollisionResolver,
    /// Every agent ever spawned since the last clear, in id order.
    history: Vec<Agent>,
    /// Live agents as indices into `history`, in spawn order.
    live: Vec<usize>,
    /// `live` partitioned by kind, indexed by [`Kind::index`].
    by_kind: [Vec<usize>; 3],
    tick: u64,
    paused: bool,
    debug: bool,
    game_over: bool,
    winner_kind: Option<Kind>,
    /// Winning kind's agents (dead ones included), ranked for the scoreboard.
    winner_agents: Vec<usize>,
    sink: S,
}

impl World {
    /// Create a world with no event sink.
    ///
    /// A config without a seed gets a fresh one, recorded back into the
    /// world's config.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_sink(config, ())
    }
}

impl<S: EventSink> World<S> {
    /// Create a world that reports events to `sink`.
    pub fn with_sink(mut config: Config, sink: S) -> Result<Self> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(fresh_seed);
        config.seed = Some(seed);

        tracing::info!(seed, width = config.width, height = config.height, "World created");

        Ok(Self {
            factory: AgentFactory::new(&config, seed),
            resolver: CollisionResolver::new(&config),
            config,
            seed,
            history: Vec::new(),
            live: Vec::new(),
            by_kind: Default::default(),
            tick: 0,
            paused: false,
            debug: false,
            game_over: false,
            winner_kind: None,
            winner_agents: Vec::new(),
            sink,
        })
    }

    // ---- Spawning -------------------------------------------------------

    /// Spawn one agent. `None` when the population cap is reached.
    pub fn spawn(&mut self, kind: Kind, position: Vec2, velocity: Option<Vec2>) -> Option<AgentId> {
        if self.at_capacity() {
            tracing::debug!(%kind, cap = self.config.max_population, "Spawn rejected, population cap reached");
            return None;
        }
        let agent = self.factory.create_agent(kind, position, velocity);
        Some(self.insert(agent))
    }

    /// Spawn from a kind tag such as `"scissors"`.
    ///
    /// The cap is checked first, so a full world returns `Ok(None)` even
    /// for a bad tag. An unknown tag otherwise fails the call.
    pub fn spawn_tagged(
        &mut self,
        tag: &str,
        position: Vec2,
        velocity: Option<Vec2>,
    ) -> Result<Option<AgentId>> {
        if self.at_capacity() {
            tracing::debug!(tag, "Spawn rejected, population cap reached");
            return Ok(None);
        }
        let agent = self.factory.create_agent_tagged(tag, position, velocity)?;
        Ok(Some(self.insert(agent)))
    }

    /// Spawn up to `count` agents of `kind` at random positions, stopping
    /// early at the population cap.
    pub fn spawn_random(&mut self, kind: Kind, count: usize) -> Vec<AgentId> {
        let mut spawned = Vec::with_capacity(count);
        for _ in 0..count {
            if self.at_capacity() {
                tracing::debug!(%kind, spawned = spawned.len(), requested = count, "Random spawn cut short by population cap");
                break;
            }
            let agent = self.factory.create_random_agent(kind);
            spawned.push(self.insert(agent));
        }
        spawned
    }

    /// Spawn `batch_size` (or the configured batch size) of every kind.
    pub fn spawn_batch(&mut self, batch_size: Option<u32>) -> Vec<AgentId> {
        let size = batch_size.unwrap_or(self.config.spawn_batch_size) as usize;
        Kind::ALL
            .into_iter()
            .flat_map(|kind| self.spawn_random(kind, size))
            .collect()
    }

    /// Spawn a random, uneven mix: a count per kind is drawn from `counts`
    /// (all three drawn before any spawning), then spawned at random
    /// positions.
    pub fn spawn_uneven_batch(&mut self, counts: RangeInclusive<u32>) -> Vec<AgentId> {
        if counts.is_empty() {
            return Vec::new();
        }
        let rng = self.factory.rng_mut();
        let drawn: Vec<u32> = Kind::ALL.iter().map(|_| rng.gen_range(counts.clone())).collect();

        Kind::ALL
            .into_iter()
            .zip(drawn)
            .flat_map(|(kind, count)| self.spawn_random(kind, count as usize))
            .collect()
    }

    /// Apply every pending queued request. Returns how many spawned;
    /// requests past the population cap are dropped.
    pub fn drain_spawn_queue(&mut self, receiver: &mut SpawnReceiver) -> usize {
        receiver
            .drain()
            .into_iter()
            .filter_map(|request| self.spawn(request.kind, Vec2::new(request.x, request.y), None))
            .count()
    }

    fn at_capacity(&self) -> bool {
        self.live.len() >= self.config.max_population
    }

    fn insert(&mut self, agent: Agent) -> AgentId {
        let idx = self.history.len();
        let id = agent.id;

        self.sink.on_spawn(&SpawnEvent {
            id,
            kind: agent.kind,
            x: agent.position.x,
            y: agent.position.y,
            tick: self.tick,
        });
        tracing::debug!(id, kind = %agent.kind, name = %agent.name, x = agent.position.x, y = agent.position.y, "Spawned agent");

        self.live.push(idx);
        self.by_kind[agent.kind.index()].push(idx);
        self.history.push(agent);
        id
    }

    // ---- Simulation -----------------------------------------------------

    /// Advance the simulation by `dt` seconds.
    ///
    /// Does nothing while paused or after the game is over.
    pub fn update(&mut self, dt: f32) -> TickReport {
        if self.paused || self.game_over {
            return TickReport {
                tick: self.tick,
                ..TickReport::default()
            };
        }

        let tick = self.tick;
        let mut report = TickReport {
            tick,
            advanced: true,
            ..TickReport::default()
        };

        // 1. Motion
        self.run_motion(dt);

        // 2. Collisions
        let history = &self.history;
        let pairs = self
            .resolver
            .detect_collisions(self.live.iter().filter_map(|&i| history.get(i)), tick);
        report.outcomes = self.resolver.resolve_collisions(
            &mut self.history,
            pairs,
            tick,
            &mut self.sink,
            self.factory.rng_mut(),
        );

        // 3. Cleanup
        report.deaths = self.remove_dead();

        // 4. Win check
        report.game_over = self.check_victory();

        self.tick += 1;

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::trace!(tick = self.tick, state_hash = hash, "World state hash");
        }

        report
    }

    fn run_motion(&mut self, dt: f32) {
        let steering = self.config.steering;
        for &idx in &self.live {
            let (before, rest) = self.history.split_at_mut(idx);
            let Some((agent, after)) = rest.split_first_mut() else {
                continue;
            };
            let population = if steering {
                Some(Population::split(before, after))
            } else {
                None
            };
            agent.update(dt, population, &self.config);
        }
    }

    fn remove_dead(&mut self) -> Vec<AgentId> {
        let history = &self.history;
        let is_alive = |idx: &usize| history.get(*idx).is_some_and(|agent| agent.alive);

        let deaths = self
            .live
            .iter()
            .filter(|&&idx| !is_alive(&idx))
            .filter_map(|&idx| history.get(idx).map(|agent| agent.id))
            .collect();

        self.live.retain(is_alive);
        for list in &mut self.by_kind {
            list.retain(is_alive);
        }
        deaths
    }

    /// Returns true if the game ended on this call.
    fn check_victory(&mut self) -> bool {
        if self.game_over {
            return false;
        }

        let mut alive = Kind::ALL
            .into_iter()
            .filter(|kind| !self.by_kind[kind.index()].is_empty());
        let (Some(winner), None) = (alive.next(), alive.next()) else {
            return false;
        };

        let history = &self.history;
        let mut ranked: Vec<usize> = (0..history.len())
            .filter(|&i| history[i].kind == winner)
            .collect();
        ranked.sort_by(|&a, &b| {
            let (a, b) = (&history[a], &history[b]);
            b.kills.cmp(&a.kills).then_with(|| a.name.cmp(&b.name))
        });

        tracing::info!(
            tick = self.tick,
            winner = %winner,
            survivors = self.live.len(),
            "Game over"
        );

        self.game_over = true;
        self.winner_kind = Some(winner);
        self.winner_agents = ranked;
        true
    }

    // ---- Session control ------------------------------------------------

    /// Drop every agent and the win state. The tick counter, the RNG and
    /// the event sink carry on untouched.
    pub fn clear(&mut self) {
        let cleared = self.live.len();
        self.history.clear();
        self.live.clear();
        for list in &mut self.by_kind {
            list.clear();
        }
        self.game_over = false;
        self.winner_kind = None;
        self.winner_agents.clear();
        tracing::info!(cleared, "World cleared");
    }

    /// Clear, then start over from `seed` (or a fresh seed).
    ///
    /// The factory is rebuilt from the new seed but keeps its id sequence,
    /// so ids are never reused within a world. The tick returns to 0 and
    /// the event sink is cleared. Returns the seed in use.
    pub fn reset(&mut self, seed: Option<u64>) -> u64 {
        self.clear();
        let seed = seed.unwrap_or_else(fresh_seed);
        self.seed = seed;
        self.config.seed = Some(seed);
        self.factory =
            AgentFactory::with_id_allocator(&self.config, seed, self.factory.ids().clone());
        self.tick = 0;
        self.sink.clear();
        tracing::info!(seed, "World reset");
        seed
    }

    /// Flip the pause flag. Returns the new value.
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Set the pause flag.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Flip the debug-overlay flag. Returns the new value.
    pub fn toggle_debug(&mut self) -> bool {
        self.debug = !self.debug;
        self.debug
    }

    /// Enable or disable steering for subsequent ticks.
    pub fn set_steering(&mut self, enabled: bool) {
        self.config.steering = enabled;
    }

    /// Change the boundary policy for subsequent ticks.
    pub fn set_boundary_mode(&mut self, mode: BoundaryMode) {
        self.config.boundary = mode;
    }

    // ---- Queries --------------------------------------------------------

    /// Active configuration. Its seed is always set.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Seed of the current session.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Current tick.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Whether updates are suspended.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether the debug overlay is requested.
    #[must_use]
    pub const fn is_debug(&self) -> bool {
        self.debug
    }

    /// Whether a single kind has won.
    #[must_use]
    pub const fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// The winning kind, once the game is over.
    #[must_use]
    pub const fn winner_kind(&self) -> Option<Kind> {
        self.winner_kind
    }

    /// Live agents in spawn order. This is the draw list.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> + '_ {
        self.live.iter().filter_map(|&i| self.history.get(i))
    }

    /// Live agents of `kind`.
    pub fn agents_of(&self, kind: Kind) -> impl Iterator<Item = &Agent> + '_ {
        self.by_kind[kind.index()]
            .iter()
            .filter_map(|&i| self.history.get(i))
    }

    /// Every agent spawned since the last clear, dead ones included.
    #[must_use]
    pub fn history(&self) -> &[Agent] {
        &self.history
    }

    /// Look up an agent by id, dead or alive.
    #[must_use]
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.history
            .binary_search_by_key(&id, |agent| agent.id)
            .ok()
            .and_then(|i| self.history.get(i))
    }

    /// Live count of `kind`.
    #[must_use]
    pub fn count(&self, kind: Kind) -> usize {
        self.by_kind[kind.index()].len()
    }

    /// Live counts for every kind, zeros included.
    #[must_use]
    pub fn counts(&self) -> BTreeMap<Kind, usize> {
        Kind::ALL.into_iter().map(|kind| (kind, self.count(kind))).collect()
    }

    /// Total live agents.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.live.len()
    }

    /// Winning kind's agents ranked by kills (descending) then name.
    pub fn winner_agents(&self) -> impl Iterator<Item = &Agent> + '_ {
        self.winner_agents.iter().filter_map(|&i| self.history.get(i))
    }

    /// `(name, kills)` ranking of the winning kind. Empty until the game is
    /// over.
    #[must_use]
    pub fn scoreboard(&self) -> Vec<(String, u32)> {
        self.winner_agents()
            .map(|agent| (agent.name.clone(), agent.kills))
            .collect()
    }

    /// The event sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The event sink, mutably.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Hash of the full simulation state.
    ///
    /// Two worlds with identical state produce identical hashes. Floats
    /// are hashed by bit pattern.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.game_over.hash(&mut hasher);
        self.winner_kind.hash(&mut hasher);
        self.history.len().hash(&mut hasher);

        for agent in &self.history {
            agent.id.hash(&mut hasher);
            agent.kind.hash(&mut hasher);
            agent.position.to_bits().hash(&mut hasher);
            agent.velocity.to_bits().hash(&mut hasher);
            agent.alive.hash(&mut hasher);
            agent.kills.hash(&mut hasher);
            agent.last_collision_tick.hash(&mut hasher);
        }

        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventLog;

    const DT: f32 = 1.0 / 60.0;

    fn still_world(seed: u64) -> World<EventLog> {
        let config = Config::default().with_seed(seed).with_steering(false);
        World::with_sink(config, EventLog::new()).unwrap()
    }

    #[test]
    fn test_new_world_records_seed() {
        let world = World::new(Config::default().with_seed(7)).unwrap();
        assert_eq!(world.seed(), 7);
        assert_eq!(world.tick(), 0);
        assert_eq!(world.total_count(), 0);

        let unseeded = World::new(Config::default()).unwrap();
        assert_eq!(unseeded.config().seed, Some(unseeded.seed()));
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(World::new(Config::default().with_size(-1.0, 10.0)).is_err());
    }

    #[test]
    fn test_spawn_tracks_all_lists() {
        let mut world = still_world(1);
        let id = world
            .spawn(Kind::Paper, Vec2::new(10.0, 20.0), None)
            .unwrap();

        assert_eq!(world.total_count(), 1);
        assert_eq!(world.count(Kind::Paper), 1);
        assert_eq!(world.history().len(), 1);
        assert_eq!(world.get(id).unwrap().position, Vec2::new(10.0, 20.0));
        assert_eq!(world.sink().spawns()[0].id, id);
    }

    #[test]
    fn test_spawn_tagged() {
        let mut world = still_world(1);
        assert!(world.spawn_tagged("rock", Vec2::ZERO, None).unwrap().is_some());
        assert!(world.spawn_tagged("Rock", Vec2::ZERO, None).is_err());
        assert_eq!(world.total_count(), 1);
    }

    #[test]
    fn test_cap_rejects_and_partial_random() {
        let config = Config::default().with_seed(3).with_max_population(5);
        let mut world = World::new(config).unwrap();

        assert_eq!(world.spawn_random(Kind::Rock, 3).len(), 3);
        assert_eq!(world.spawn_random(Kind::Paper, 10).len(), 2);
        assert_eq!(world.spawn(Kind::Scissors, Vec2::ZERO, None), None);
        assert_eq!(world.spawn_tagged("nonsense", Vec2::ZERO, None).unwrap(), None);
        assert_eq!(world.total_count(), 5);
    }

    #[test]
    fn test_spawn_batch_sizes() {
        let mut world = still_world(5);
        assert_eq!(world.spawn_batch(None).len(), 30);
        assert_eq!(world.spawn_batch(Some(2)).len(), 6);
        for kind in Kind::ALL {
            assert_eq!(world.count(kind), 12);
        }
    }

    #[test]
    fn test_uneven_batch_within_range() {
        let mut world = still_world(11);
        world.spawn_uneven_batch(UNEVEN_BATCH_RANGE);
        for kind in Kind::ALL {
            assert!(UNEVEN_BATCH_RANGE.contains(&(world.count(kind) as u32)));
        }

        #[allow(clippy::reversed_empty_ranges)]
        let empty = world.spawn_uneven_batch(5..=1);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_update_kills_and_reports() {
        let mut world = still_world(42);
        let rock = world.spawn(Kind::Rock, Vec2::new(100.0, 100.0), None).unwrap();
        let scissors = world
            .spawn(Kind::Scissors, Vec2::new(105.0, 100.0), None)
            .unwrap();
        world.spawn(Kind::Paper, Vec2::new(900.0, 600.0), Some(Vec2::ZERO));

        let report = world.update(DT);

        assert!(report.advanced);
        assert_eq!(report.tick, 0);
        assert_eq!(
            report.outcomes,
            vec![CollisionOutcome::Kill {
                winner: rock,
                loser: scissors
            }]
        );
        assert_eq!(report.deaths, vec![scissors]);
        assert!(!report.game_over);
        assert_eq!(world.tick(), 1);
        assert_eq!(world.count(Kind::Scissors), 0);
        assert!(!world.get(scissors).unwrap().alive);
        assert_eq!(world.history().len(), 3);
    }

    #[test]
    fn test_paused_update_is_noop() {
        let mut world = still_world(1);
        world.spawn(Kind::Rock, Vec2::new(100.0, 100.0), Some(Vec2::new(50.0, 0.0)));
        assert!(world.toggle_pause());

        let before = world.state_hash();
        let report = world.update(DT);
        assert!(!report.advanced);
        assert_eq!(world.tick(), 0);
        assert_eq!(world.state_hash(), before);

        assert!(!world.toggle_pause());
        world.update(DT);
        assert_eq!(world.tick(), 1);
    }

    #[test]
    fn test_single_kind_wins_immediately() {
        let mut world = still_world(1);
        world.spawn(Kind::Paper, Vec2::new(100.0, 100.0), None);
        let report = world.update(DT);
        assert!(report.game_over);
        assert_eq!(world.winner_kind(), Some(Kind::Paper));

        // Terminal until reset
        let after = world.update(DT);
        assert!(!after.advanced);
        assert_eq!(world.tick(), 1);
    }

    #[test]
    fn test_empty_world_never_wins() {
        let mut world = still_world(1);
        world.update(DT);
        assert!(!world.is_game_over());
        assert_eq!(world.tick(), 1);
        assert!(world.scoreboard().is_empty());
    }

    #[test]
    fn test_scoreboard_includes_dead_and_is_ranked() {
        let mut world = still_world(8);
        let hunter = world
            .spawn(Kind::Rock, Vec2::new(100.0, 100.0), Some(Vec2::ZERO))
            .unwrap();
        world.spawn(Kind::Scissors, Vec2::new(110.0, 100.0), Some(Vec2::ZERO));
        world.spawn(Kind::Rock, Vec2::new(600.0, 400.0), Some(Vec2::ZERO));
        world.spawn(Kind::Rock, Vec2::new(900.0, 400.0), Some(Vec2::ZERO));

        assert!(world.scoreboard().is_empty());
        world.update(DT);
        assert!(world.is_game_over());

        let board = world.scoreboard();
        assert_eq!(board.len(), 3);
        assert_eq!(board[0], (world.get(hunter).unwrap().name.clone(), 1));
        assert_eq!(board[1].1, 0);
        assert!(board[1].0 < board[2].0);
    }

    #[test]
    fn test_clear_keeps_tick_and_sink() {
        let mut world = still_world(2);
        world.spawn_batch(Some(2));
        world.update(DT);
        world.clear();

        assert_eq!(world.total_count(), 0);
        assert!(world.history().is_empty());
        assert_eq!(world.tick(), 1);
        assert_eq!(world.sink().spawns().len(), 6);
        assert!(!world.is_game_over());
    }

    #[test]
    fn test_reset_reseeds_and_keeps_ids_unique() {
        let mut world = still_world(2);
        let first: Vec<_> = world.spawn_batch(Some(1));
        world.update(DT);

        assert_eq!(world.reset(Some(99)), 99);
        assert_eq!(world.seed(), 99);
        assert_eq!(world.config().seed, Some(99));
        assert_eq!(world.tick(), 0);
        assert!(world.sink().spawns().is_empty());

        let second = world.spawn_batch(Some(1));
        assert!(second.iter().all(|id| !first.contains(id)));
        assert!(second[0] > *first.last().unwrap());
    }

    #[test]
    fn test_reset_reproduces_fresh_world() {
        let mut reused = still_world(1);
        reused.spawn_batch(Some(3));
        reused.reset(Some(77));
        reused.spawn_batch(Some(3));

        let mut fresh = still_world(77);
        fresh.spawn_batch(Some(3));

        let pos = |w: &World<EventLog>| w.agents().map(|a| a.position).collect::<Vec<_>>();
        let names = |w: &World<EventLog>| w.agents().map(|a| a.name.clone()).collect::<Vec<_>>();
        assert_eq!(pos(&reused), pos(&fresh));
        assert_eq!(names(&reused), names(&fresh));
    }

    #[test]
    fn test_runtime_toggles() {
        let mut world = still_world(1);
        world.set_steering(true);
        world.set_boundary_mode(BoundaryMode::Wrap);
        assert!(world.config().steering);
        assert_eq!(world.config().boundary, BoundaryMode::Wrap);
        assert!(world.toggle_debug());
        assert!(world.is_debug());
    }

    #[test]
    fn test_drain_spawn_queue_respects_cap() {
        use crate::ingest::{spawn_queue, SpawnRequest};

        let config = Config::default().with_seed(1).with_max_population(2);
        let mut world = World::new(config).unwrap();
        let (tx, mut rx) = spawn_queue(10);
        for _ in 0..3 {
            assert!(tx.try_enqueue(SpawnRequest {
                kind: Kind::Rock,
                x: 50.0,
                y: 50.0,
                original_x: None,
                original_y: None,
                adjusted: false,
            }));
        }

        assert_eq!(world.drain_spawn_queue(&mut rx), 2);
        assert_eq!(world.total_count(), 2);
        assert_eq!(tx.pending(), 0);
    }

    #[test]
    fn test_state_hash_tracks_changes() {
        let mut a = still_world(4);
        let mut b = still_world(4);
        a.spawn_batch(Some(3));
        b.spawn_batch(Some(3));
        assert_eq!(a.state_hash(), b.state_hash());

        a.update(DT);
        assert_ne!(a.state_hash(), b.state_hash());
        b.update(DT);
        assert_eq!(a.state_hash(), b.state_hash());
    }
}
