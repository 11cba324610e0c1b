//! Headless runner for the rock-paper-scissors world.
//!
//! Runs sessions without rendering. This enables:
//!
//! - **Single runs**: drive a seeded session to its end and report the
//!   winner and scoreboard as JSON
//! - **Batch experiments**: many seeds in parallel, aggregated win rates
//! - **Replay verification**: check that a recorded session reproduces
//!   its final state hash
//! - **Interactive sessions**: a controller drives the world over JSON
//!   lines on stdin/stdout
//!
//! See [`protocol`] for the interactive command/response format.
//!
//! # Example
//!
//! ```bash
//! # Run one session and record it
//! cargo run -p rps_headless -- run --seed 42 --record replay.bin
//!
//! # Verify the recording
//! cargo run -p rps_headless -- replay --file replay.bin --verify
//!
//! # Drive interactively
//! echo '{"cmd":"batch"}' | cargo run -p rps_headless -- session
//! ```

pub mod batch;
pub mod protocol;
pub mod runner;
pub mod session;

pub use batch::{run_batch, BatchConfig, BatchResults, BatchSummary};
pub use protocol::{Command, Response};
pub use runner::{HeadlessRunner, RunSettings, RunSummary};
pub use session::Session;
