//! Single-session runner.
//!
//! Builds a world from a config, spawns the initial population, drives it
//! with a fixed timestep until one kind is left (or the step budget runs
//! out) and records everything needed to replay the session.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use rps_core::agent::AgentId;
use rps_core::config::Config;
use rps_core::error::{Result, SimError};
use rps_core::events::{EventLog, EventStats};
use rps_core::kind::Kind;
use rps_core::math::Vec2;
use rps_core::replay::{InitialBatch, Replay};
use rps_core::world::{TickReport, World};

/// Timestep of one frame at 60 FPS.
pub const DEFAULT_DT: f32 = 1.0 / 60.0;

/// Ten minutes of simulated time at 60 updates per second.
pub const DEFAULT_MAX_STEPS: u64 = 36_000;

/// How a session is driven.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSettings {
    /// Initial population. `None` spawns the config's default batch.
    pub batch: Option<InitialBatch>,
    /// Timestep passed to every update.
    pub dt: f32,
    /// Update budget before the session is called undecided.
    pub max_steps: u64,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            batch: None,
            dt: DEFAULT_DT,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

/// One scoreboard line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Agent name.
    pub name: String,
    /// Agents it eliminated.
    pub kills: u32,
}

/// Converts the world's `(name, kills)` pairs.
pub fn score_entries(scoreboard: Vec<(String, u32)>) -> Vec<ScoreEntry> {
    scoreboard
        .into_iter()
        .map(|(name, kills)| ScoreEntry { name, kills })
        .collect()
}

/// End-of-session report printed by the `run` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Session seed.
    pub seed: u64,
    /// Updates driven.
    pub steps: u64,
    /// World tick reached. Stops advancing once the session is decided.
    pub tick: u64,
    /// Whether exactly one kind is left.
    pub game_over: bool,
    /// The surviving kind.
    pub winner: Option<Kind>,
    /// Live agents per kind.
    pub counts: BTreeMap<Kind, usize>,
    /// Winning kind's agents ranked by kills, empty while undecided.
    pub scoreboard: Vec<ScoreEntry>,
    /// Spawn and collision totals.
    pub stats: EventStats,
    /// Final world state hash.
    pub final_hash: u64,
}

/// Drives one recorded session.
pub struct HeadlessRunner {
    world: World<EventLog>,
    replay: Replay,
    settings: RunSettings,
    steps: u64,
}

impl HeadlessRunner {
    /// Build the world and spawn the initial population.
    pub fn new(config: Config, settings: RunSettings) -> Result<Self> {
        if !(settings.dt.is_finite() && settings.dt > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "timestep must be positive, got {}",
                settings.dt
            )));
        }

        let mut world = World::with_sink(config, EventLog::new())?;
        let mut replay = Replay::for_world(&world, settings.dt);

        let batch = settings
            .batch
            .unwrap_or(InitialBatch::Balanced(world.config().spawn_batch_size));
        let spawned = match batch {
            InitialBatch::Balanced(per_kind) => world.spawn_batch(Some(per_kind)),
            InitialBatch::Uneven { min, max } => world.spawn_uneven_batch(min..=max),
        };
        replay.set_batch(batch);

        tracing::info!(
            seed = world.seed(),
            spawned = spawned.len(),
            ?batch,
            "Session ready"
        );

        Ok(Self {
            world,
            replay,
            settings,
            steps: 0,
        })
    }

    /// Spawn an agent between updates and record it for replay.
    pub fn spawn(&mut self, kind: Kind, position: Vec2) -> Option<AgentId> {
        let id = self.world.spawn(kind, position, None)?;
        self.replay.record_spawn(self.steps, kind, position);
        Some(id)
    }

    /// Advance one update.
    pub fn step(&mut self) -> TickReport {
        self.steps += 1;
        self.world.update(self.settings.dt)
    }

    /// Whether the session is decided or out of budget.
    pub fn is_finished(&self) -> bool {
        self.world.is_game_over() || self.steps >= self.settings.max_steps
    }

    /// Step until finished and summarize.
    pub fn run(&mut self) -> RunSummary {
        while !self.is_finished() {
            self.step();
        }

        if self.world.is_game_over() {
            tracing::info!(
                winner = ?self.world.winner_kind(),
                tick = self.world.tick(),
                "Session decided"
            );
        } else {
            tracing::warn!(steps = self.steps, "Step budget exhausted before one kind won");
        }

        self.summary()
    }

    /// Snapshot of the current state.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            seed: self.world.seed(),
            steps: self.steps,
            tick: self.world.tick(),
            game_over: self.world.is_game_over(),
            winner: self.world.winner_kind(),
            counts: self.world.counts(),
            scoreboard: score_entries(self.world.scoreboard()),
            stats: self.world.sink().stats(),
            final_hash: self.world.state_hash(),
        }
    }

    /// Replay of the session so far.
    pub fn replay(&self) -> Replay {
        let mut replay = self.replay.clone();
        replay.finalize(self.steps, self.world.tick(), self.world.state_hash());
        replay
    }

    /// Updates driven so far.
    pub const fn steps(&self) -> u64 {
        self.steps
    }

    /// The world being driven.
    pub const fn world(&self) -> &World<EventLog> {
        &self.world
    }

    /// Write the event log as pretty JSON.
    pub fn write_events(&self, path: &Path) -> Result<()> {
        write_json(path, self.world.sink())
    }
}

/// Serialize `value` as pretty JSON to `path`, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| SimError::InvalidState(format!("Failed to serialize {}: {e}", path.display())))?;
    std::fs::write(path, json)?;
    Ok(())
}
