//! Test fixtures and helpers.
//!
//! Pre-built worlds and scenarios for consistent testing.

use rps_core::prelude::*;

/// Timestep used by fixtures, one frame at 60 FPS.
pub const DT: f32 = 1.0 / 60.0;

/// Default config with a fixed seed and steering off, so agents only move
/// along their initial velocity.
#[must_use]
pub fn still_config(seed: u64) -> Config {
    Config::default().with_seed(seed).with_steering(false)
}

/// Seeded world holding `per_kind` agents of every kind at random
/// positions.
///
/// # Panics
///
/// Never with the default config.
#[must_use]
pub fn balanced_world(seed: u64, per_kind: u32) -> World {
    let mut world = World::new(Config::default().with_seed(seed)).expect("default config is valid");
    world.spawn_batch(Some(per_kind));
    world
}

/// Empty world recording events.
///
/// # Panics
///
/// Panics if `config` is invalid.
#[must_use]
pub fn logged_world(config: Config) -> World<EventLog> {
    World::with_sink(config, EventLog::new()).expect("fixture config must be valid")
}

/// Stationary agent (zero initial velocity).
///
/// # Panics
///
/// Panics if the world is at its population cap.
pub fn place<S: EventSink>(world: &mut World<S>, kind: Kind, x: f32, y: f32) -> AgentId {
    world
        .spawn(kind, Vec2::new(x, y), Some(Vec2::ZERO))
        .expect("fixture world is under its population cap")
}

/// Two overlapping agents in a still world, about to collide on the next
/// update. Returns the world and the ids of `first` and `second`.
#[must_use]
pub fn duel(seed: u64, first: Kind, second: Kind) -> (World<EventLog>, AgentId, AgentId) {
    let mut world = logged_world(still_config(seed));
    let a = place(&mut world, first, 100.0, 100.0);
    let b = place(&mut world, second, 105.0, 100.0);
    (world, a, b)
}

/// A spawn made before a given update step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptedSpawn {
    /// Number of updates run before this spawn.
    pub step: u64,
    /// Kind to spawn.
    pub kind: Kind,
    /// Spawn position.
    pub position: Vec2,
    /// Optional initial velocity.
    pub velocity: Option<Vec2>,
}

/// Drive `world` for `steps` updates, applying `script` (sorted by step)
/// at the matching step boundaries. Returns how many scripted spawns were
/// accepted.
pub fn run_script<S: EventSink>(world: &mut World<S>, script: &[ScriptedSpawn], steps: u64, dt: f32) -> usize {
    let mut accepted = 0;
    let mut pending = script.iter().peekable();

    for step in 0..=steps {
        while let Some(spawn) = pending.next_if(|spawn| spawn.step <= step) {
            if world.spawn(spawn.kind, spawn.position, spawn.velocity).is_some() {
                accepted += 1;
            }
        }
        if step < steps {
            world.update(dt);
        }
    }

    accepted
}
