//! # RPS Core
//!
//! Deterministic simulation core for the rock-paper-scissors world.
//!
//! This crate contains **only** simulation logic:
//! - No rendering
//! - No IO inside the tick loop
//! - No unseeded randomness (everything derives from one seed)
//!
//! This separation enables:
//! - Headless runs and batch experiments
//! - Replay recording and verification
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`kind`] - The three kinds and the dominance cycle
//! - [`agent`] - Agent state, motion and steering
//! - [`factory`] - Seeded agent construction and id allocation
//! - [`names`] - Unique display names
//! - [`collision`] - Pairwise collision detection and resolution
//! - [`world`] - The orchestrator owning the population
//! - [`ingest`] - Spawn request validation and the bounded spawn queue
//! - [`events`] - Event sink interface and the recording event log
//! - [`replay`] - Recorded sessions and their verification
//! - [`config`] - Session configuration loaded from RON
//! - [`rng`] - Seed handling and the deterministic random streams
//! - [`math`] - 2D vector math

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod agent;
pub mod collision;
pub mod config;
pub mod error;
pub mod events;
pub mod factory;
pub mod ingest;
pub mod kind;
pub mod math;
pub mod names;
pub mod replay;
pub mod rng;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::agent::{Agent, AgentId};
    pub use crate::collision::{CollisionOutcome, CollisionPair, CollisionResolver};
    pub use crate::config::{BoundaryMode, Config, KindProfile, Rgb, SpeedRange};
    pub use crate::error::{Result, SimError};
    pub use crate::events::{CollisionEvent, EventLog, EventSink, EventStats, SpawnEvent};
    pub use crate::factory::AgentFactory;
    pub use crate::ingest::{spawn_queue, SpawnReceiver, SpawnRequest, SpawnSender};
    pub use crate::kind::{Kind, Outcome};
    pub use crate::math::Vec2;
    pub use crate::world::{TickReport, World};
}
