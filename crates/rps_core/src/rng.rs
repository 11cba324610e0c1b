//! Seeded random number source.
//!
//! Every stochastic decision in a session (spawn positions, initial
//! headings and speeds, name picks, degenerate bounce normals) draws from
//! a [`SimRng`] derived from the session seed. ChaCha output is specified
//! independently of platform, so a seed reproduces a run anywhere.

use std::f32::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::math::Vec2;

/// Generator used for all simulation randomness.
pub type SimRng = ChaCha8Rng;

/// Upper bound (exclusive) for freshly drawn session seeds.
pub const SEED_SPACE: u64 = 1_000_000;

/// Stream used by the name allocator, kept apart from the motion stream so
/// name picks never shift spawn positions.
const NAME_STREAM: u64 = 1;

/// Generator for the main simulation stream.
#[must_use]
pub fn seeded(seed: u64) -> SimRng {
    SimRng::seed_from_u64(seed)
}

/// Generator for the name stream of the same seed.
#[must_use]
pub fn seeded_names(seed: u64) -> SimRng {
    let mut rng = SimRng::seed_from_u64(seed);
    rng.set_stream(NAME_STREAM);
    rng
}

/// Draw a new session seed from OS entropy.
#[must_use]
pub fn fresh_seed() -> u64 {
    rand::thread_rng().gen_range(0..SEED_SPACE)
}

/// Unit vector with a uniformly random heading.
pub fn random_heading<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    Vec2::from_angle(rng.gen_range(0.0..TAU))
}

/// Uniform draw from `[min, max]`, tolerating `min == max`.
pub fn uniform<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max > min {
        rng.gen_range(min..=max)
    } else {
        min
    }
}
