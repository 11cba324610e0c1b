//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the world produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! A session must be fully reproducible from its seed. Sources of
//! non-determinism include:
//!
//! - **Unseeded randomness**: every draw must come from the world's
//!   seeded streams, never from `thread_rng`.
//!
//! - **Map iteration order**: per-kind data lives in fixed-order arrays
//!   and `BTreeMap`s, never in `HashMap`s.
//!
//! - **Floating-point evaluation order**: motion and collision math must
//!   run in the same order every time. Agents update in spawn order and
//!   collision pairs resolve in id order.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: individual modules are reproducible for a seed
//! 2. **Property tests**: arbitrary spawn scripts still replay exactly
//! 3. **Replay tests**: a recorded session re-simulates to its final hash
//! 4. **Parallel tests**: N worlds run on separate threads all match

use std::thread;

use rps_core::replay::Replay;
use rps_core::world::World;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic world).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "World is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a setup/step loop multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `ticks` - Number of steps per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one step
/// * `hash` - Function to compute the state hash
///
/// # Example
///
/// ```
/// use rps_core::prelude::*;
/// use rps_test_utils::determinism::verify_determinism;
///
/// let result = verify_determinism(
///     3,
///     100,
///     || {
///         let mut world = World::new(Config::default().with_seed(42)).unwrap();
///         world.spawn_batch(Some(10));
///         world
///     },
///     |world| {
///         world.update(1.0 / 60.0);
///     },
///     |world| world.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run two worlds from the same setup with a fixed `dt` and compare their
/// final hashes.
pub fn verify_world_determinism<F>(setup_fn: F, num_ticks: u64, dt: f32) -> bool
where
    F: Fn() -> World,
{
    let result = verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |world| {
            world.update(dt);
        },
        |world| world.state_hash(),
    );
    result.is_deterministic
}

/// Run `num_worlds` worlds on scoped threads and collect final hashes.
///
/// Catches non-determinism that only shows up under thread scheduling or
/// memory layout differences.
pub fn run_parallel_worlds<F>(setup_fn: F, num_worlds: usize, num_ticks: u64, dt: f32) -> DeterminismResult
where
    F: Fn() -> World + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_worlds)
            .map(|_| {
                s.spawn(|| {
                    let mut world = setup_fn();
                    for _ in 0..num_ticks {
                        world.update(dt);
                    }
                    world.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("world thread panicked"))
            .collect()
    });

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    DeterminismResult {
        is_deterministic,
        hashes,
        ticks: num_ticks,
    }
}

/// Step two worlds side by side, returning the first tick whose hashes
/// differ.
///
/// `None` means the runs agreed throughout; `Some(0)` means the setups
/// already differed.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64, dt: f32) -> Option<u64>
where
    F: Fn() -> World,
{
    let mut first = setup_fn();
    let mut second = setup_fn();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        first.update(dt);
        second.update(dt);

        if first.state_hash() != second.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Re-run a replay twice and check both runs land on its recorded hash.
pub fn verify_replay_determinism(replay: &Replay) -> bool {
    let Ok(first) = replay.run() else {
        return false;
    };
    let Ok(second) = replay.run() else {
        return false;
    };
    first.state_hash() == replay.final_hash && second.state_hash() == replay.final_hash
}

/// Proptest strategies for determinism testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing of the world.
pub mod strategies {
    use proptest::prelude::*;
    use rps_core::kind::Kind;
    use rps_core::math::Vec2;

    use crate::fixtures::ScriptedSpawn;

    /// Any of the three kinds.
    pub fn arb_kind() -> impl Strategy<Value = Kind> {
        prop_oneof![Just(Kind::Rock), Just(Kind::Paper), Just(Kind::Scissors)]
    }

    /// A position inside a `width` x `height` arena.
    pub fn arb_position(width: f32, height: f32) -> impl Strategy<Value = Vec2> {
        (0.0..width, 0.0..height).prop_map(|(x, y)| Vec2::new(x, y))
    }

    /// An initial velocity, absent about a quarter of the time.
    pub fn arb_velocity() -> impl Strategy<Value = Option<Vec2>> {
        proptest::option::weighted(0.75, (-120.0f32..120.0, -120.0f32..120.0).prop_map(|(x, y)| Vec2::new(x, y)))
    }

    /// A single scripted spawn somewhere in the first `max_step` updates.
    pub fn arb_spawn(width: f32, height: f32, max_step: u64) -> impl Strategy<Value = ScriptedSpawn> {
        (0..max_step, arb_kind(), arb_position(width, height), arb_velocity()).prop_map(
            |(step, kind, position, velocity)| ScriptedSpawn {
                step,
                kind,
                position,
                velocity,
            },
        )
    }

    /// Up to `max_len` scripted spawns, sorted by step, in the default
    /// 1200 x 800 arena.
    pub fn arb_spawn_script(max_len: usize, max_step: u64) -> impl Strategy<Value = Vec<ScriptedSpawn>> {
        proptest::collection::vec(arb_spawn(1200.0, 800.0, max_step), 0..max_len).prop_map(|mut script| {
            script.sort_by_key(|spawn| spawn.step);
            script
        })
    }
}
