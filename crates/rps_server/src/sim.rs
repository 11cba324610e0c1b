//! Simulation task.
//!
//! Owns the world. Each tick it drains the spawn queue, advances the world
//! one fixed step and publishes a snapshot for status queries.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use rps_core::ingest::SpawnReceiver;
use rps_core::kind::Kind;
use rps_core::world::{TickReport, World};

/// What status queries see of the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// World tick.
    pub tick: u64,
    /// Live agents.
    pub population: usize,
    /// Live agents per kind.
    pub counts: BTreeMap<Kind, usize>,
    /// Hard ceiling on live agents.
    pub max_population: usize,
    /// Exactly one kind left.
    pub game_over: bool,
    /// The surviving kind.
    pub winner: Option<Kind>,
}

impl WorldSnapshot {
    /// Capture `world`.
    pub fn of(world: &World) -> Self {
        Self {
            tick: world.tick(),
            population: world.total_count(),
            counts: world.counts(),
            max_population: world.config().max_population,
            game_over: world.is_game_over(),
            winner: world.winner_kind(),
        }
    }
}

/// Drives the world on the simulation task.
pub struct SimDriver {
    world: World,
    receiver: SpawnReceiver,
    snapshot: watch::Sender<WorldSnapshot>,
    dt: f32,
}

impl SimDriver {
    /// Wrap `world`. Returns the driver and a handle for reading snapshots.
    pub fn new(world: World, receiver: SpawnReceiver, dt: f32) -> (Self, watch::Receiver<WorldSnapshot>) {
        let (snapshot, rx) = watch::channel(WorldSnapshot::of(&world));
        (
            Self {
                world,
                receiver,
                snapshot,
                dt,
            },
            rx,
        )
    }

    /// One tick: drain pending spawns, update, publish.
    pub fn tick(&mut self) -> TickReport {
        let spawned = self.world.drain_spawn_queue(&mut self.receiver);
        if spawned > 0 {
            tracing::debug!(spawned, tick = self.world.tick(), "Applied queued spawns");
        }

        let was_over = self.world.is_game_over();
        let report = self.world.update(self.dt);
        if report.game_over && !was_over {
            tracing::info!(winner = ?self.world.winner_kind(), tick = self.world.tick(), "Game over");
        }

        self.snapshot.send_replace(WorldSnapshot::of(&self.world));
        report
    }

    /// The world being driven.
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Tick every `period` until `stop` turns true or its sender is
    /// dropped, then hand the world back.
    pub async fn run(mut self, period: Duration, mut stop: watch::Receiver<bool>) -> World {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick();
                }
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!(tick = self.world.tick(), population = self.world.total_count(), "Simulation stopped");
        self.world
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rps_core::config::Config;
    use rps_core::ingest::{spawn_queue, SpawnRequest};

    fn request(kind: Kind, x: f32, y: f32) -> SpawnRequest {
        SpawnRequest {
            kind,
            x,
            y,
            original_x: None,
            original_y: None,
            adjusted: false,
        }
    }

    #[test]
    fn test_tick_drains_then_publishes() {
        let world = World::new(Config::default().with_seed(1).with_steering(false)).unwrap();
        let (tx, rx) = spawn_queue(10);
        let (mut driver, snapshots) = SimDriver::new(world, rx, 1.0 / 60.0);

        assert!(tx.try_enqueue(request(Kind::Rock, 100.0, 100.0)));
        assert!(tx.try_enqueue(request(Kind::Paper, 900.0, 600.0)));
        assert_eq!(snapshots.borrow().population, 0);

        driver.tick();
        let snapshot = snapshots.borrow().clone();
        assert_eq!(snapshot.tick, 1);
        assert_eq!(snapshot.population, 2);
        assert_eq!(snapshot.counts[&Kind::Scissors], 0);
        assert_eq!(tx.pending(), 0);
    }

    #[test]
    fn test_game_over_published() {
        let world = World::new(Config::default().with_seed(1).with_steering(false)).unwrap();
        let (tx, rx) = spawn_queue(10);
        let (mut driver, snapshots) = SimDriver::new(world, rx, 1.0 / 60.0);

        tx.try_enqueue(request(Kind::Scissors, 100.0, 100.0));
        tx.try_enqueue(request(Kind::Rock, 105.0, 100.0));
        driver.tick();

        let snapshot = snapshots.borrow().clone();
        assert!(snapshot.game_over);
        assert_eq!(snapshot.winner, Some(Kind::Rock));
        assert_eq!(snapshot.population, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_signal() {
        let world = World::new(Config::default().with_seed(3)).unwrap();
        let (_tx, rx) = spawn_queue(10);
        let (driver, _snapshots) = SimDriver::new(world, rx, 1.0 / 60.0);
        let (stop_tx, stop_rx) = watch::channel(false);

        let task = tokio::spawn(driver.run(Duration::from_millis(10), stop_rx));
        tokio::time::sleep(Duration::from_millis(95)).await;
        stop_tx.send(true).unwrap();

        let world = task.await.unwrap();
        assert!(world.tick() >= 5);
    }
}
