//! Replay recording and verification.
//!
//! A replay stores the session config and seed, the initial batch, and
//! every explicit spawn keyed by the update step it preceded. Since the
//! simulation is deterministic this is enough to rebuild the exact final
//! state, which is checked against the recorded state hash.
//!
//! Spawns are keyed by update step rather than world tick because a world
//! that has reached game over stops advancing its tick while the driver
//! keeps calling `update`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Result, SimError};
use crate::events::EventSink;
use crate::kind::Kind;
use crate::math::Vec2;
use crate::world::World;

/// Replay file format version for compatibility.
pub const REPLAY_VERSION: u32 = 1;

/// Population spawned before the first update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitialBatch {
    /// The same number of every kind.
    Balanced(u32),
    /// A per-kind count drawn from `min..=max`.
    Uneven {
        /// Smallest count.
        min: u32,
        /// Largest count.
        max: u32,
    },
}

/// An explicit spawn made between updates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplaySpawn {
    /// Number of updates that had run when the spawn happened.
    pub step: u64,
    /// Kind spawned.
    pub kind: Kind,
    /// Spawn x.
    pub x: f32,
    /// Spawn y.
    pub y: f32,
}

/// Complete replay data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replay {
    /// Replay format version.
    pub version: u32,
    /// Session config.
    pub config: Config,
    /// Session seed.
    pub seed: u64,
    /// Fixed timestep passed to every update.
    pub dt: f32,
    /// Population spawned before the first update.
    pub batch: Option<InitialBatch>,
    /// Explicit spawns in step order.
    pub spawns: Vec<ReplaySpawn>,
    /// Number of updates driven.
    pub steps: u64,
    /// World tick at the end of the run.
    pub final_tick: u64,
    /// World state hash at the end of the run.
    pub final_hash: u64,
}

impl Replay {
    /// Start a replay for a session.
    #[must_use]
    pub fn new(config: Config, seed: u64, dt: f32) -> Self {
        Self {
            version: REPLAY_VERSION,
            config,
            seed,
            dt,
            batch: None,
            spawns: Vec::new(),
            steps: 0,
            final_tick: 0,
            final_hash: 0,
        }
    }

    /// Start a replay matching `world`'s config and seed.
    #[must_use]
    pub fn for_world<S: EventSink>(world: &World<S>, dt: f32) -> Self {
        Self::new(world.config().clone(), world.seed(), dt)
    }

    /// Record the initial batch.
    pub fn set_batch(&mut self, batch: InitialBatch) {
        self.batch = Some(batch);
    }

    /// Record an explicit spawn made after `step` updates.
    pub fn record_spawn(&mut self, step: u64, kind: Kind, position: Vec2) {
        self.spawns.push(ReplaySpawn {
            step,
            kind,
            x: position.x,
            y: position.y,
        });
    }

    /// Finalize with the end-of-run state.
    pub fn finalize(&mut self, steps: u64, final_tick: u64, final_hash: u64) {
        self.steps = steps;
        self.final_tick = final_tick;
        self.final_hash = final_hash;
    }

    /// Spawns made after exactly `step` updates.
    pub fn spawns_at(&self, step: u64) -> impl Iterator<Item = &ReplaySpawn> + '_ {
        self.spawns.iter().filter(move |spawn| spawn.step == step)
    }

    /// Save the replay to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = bincode::serialize(self)
            .map_err(|e| SimError::InvalidState(format!("Failed to serialize replay: {e}")))?;
        std::fs::write(path.as_ref(), bytes)?;
        Ok(())
    }

    /// Load a replay from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let replay: Self = bincode::deserialize(&bytes)
            .map_err(|e| SimError::InvalidState(format!("Failed to deserialize replay: {e}")))?;

        if replay.version != REPLAY_VERSION {
            return Err(SimError::InvalidState(format!(
                "Replay version mismatch: expected {}, got {}",
                REPLAY_VERSION, replay.version
            )));
        }

        Ok(replay)
    }

    /// Re-simulate the recorded session and return the resulting world.
    pub fn run(&self) -> Result<World> {
        let mut world = World::new(self.config.clone().with_seed(self.seed))?;

        match self.batch {
            Some(InitialBatch::Balanced(size)) => {
                world.spawn_batch(Some(size));
            }
            Some(InitialBatch::Uneven { min, max }) => {
                world.spawn_uneven_batch(min..=max);
            }
            None => {}
        }

        let mut spawns: Vec<&ReplaySpawn> = self.spawns.iter().collect();
        spawns.sort_by_key(|spawn| spawn.step);
        let mut spawns = spawns.into_iter().peekable();

        for step in 0..=self.steps {
            while let Some(spawn) = spawns.next_if(|spawn| spawn.step <= step) {
                world.spawn(spawn.kind, Vec2::new(spawn.x, spawn.y), None);
            }
            if step < self.steps {
                world.update(self.dt);
            }
        }

        Ok(world)
    }

    /// Re-simulate and check the final state hash.
    pub fn verify(&self) -> Result<World> {
        let world = self.run()?;
        let actual = world.state_hash();
        if actual != self.final_hash {
            return Err(SimError::ReplayMismatch {
                tick: world.tick(),
                expected: self.final_hash,
                actual,
            });
        }
        tracing::info!(steps = self.steps, tick = world.tick(), "Replay verified");
        Ok(world)
    }

    /// Total number of updates in the replay.
    #[must_use]
    pub const fn duration(&self) -> u64 {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    /// Drive a world the way a runner would, recording as it goes.
    fn record(seed: u64, steps: u64) -> Replay {
        let config = Config::default().with_seed(seed);
        let mut world = World::new(config).unwrap();
        let mut replay = Replay::for_world(&world, DT);

        replay.set_batch(InitialBatch::Balanced(5));
        world.spawn_batch(Some(5));

        for step in 0..steps {
            if step == 10 {
                let position = Vec2::new(300.0, 300.0);
                world.spawn(Kind::Paper, position, None);
                replay.record_spawn(step, Kind::Paper, position);
            }
            world.update(DT);
        }

        replay.finalize(steps, world.tick(), world.state_hash());
        replay
    }

    #[test]
    fn test_replay_reproduces_run() {
        let replay = record(42, 60);
        let world = replay.verify().unwrap();
        assert_eq!(world.tick(), replay.final_tick);
        assert_eq!(world.history().len(), 16);
    }

    #[test]
    fn test_tampered_hash_is_detected() {
        let mut replay = record(42, 30);
        replay.final_hash ^= 1;
        assert!(matches!(
            replay.verify(),
            Err(SimError::ReplayMismatch { .. })
        ));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.replay");

        let replay = record(7, 20);
        replay.save(&path).unwrap();
        let loaded = Replay::load(&path).unwrap();

        assert_eq!(loaded, replay);
        loaded.verify().unwrap();
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.replay");

        let mut replay = record(7, 1);
        replay.version = REPLAY_VERSION + 1;
        replay.save(&path).unwrap();

        assert!(matches!(Replay::load(&path), Err(SimError::InvalidState(_))));
    }

    #[test]
    fn test_spawns_at_step() {
        let replay = record(1, 20);
        assert_eq!(replay.spawns_at(10).count(), 1);
        assert_eq!(replay.spawns_at(11).count(), 0);
        assert_eq!(replay.duration(), 20);
    }

    #[test]
    fn test_uneven_batch_replays() {
        let config = Config::default().with_seed(5);
        let mut world = World::new(config).unwrap();
        let mut replay = Replay::for_world(&world, DT);
        replay.set_batch(InitialBatch::Uneven { min: 30, max: 60 });
        world.spawn_uneven_batch(30..=60);
        for _ in 0..15 {
            world.update(DT);
        }
        replay.finalize(15, world.tick(), world.state_hash());

        let rerun = replay.verify().unwrap();
        assert_eq!(rerun.history().len(), world.history().len());
    }
}
