//! JSON protocol for interactive sessions.
//!
//! The session reads one JSON command per line on stdin and answers with
//! one JSON response per line on stdout. Logs go to stderr.
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","tick":0,"seed":42}
//! -> {"cmd":"batch","count":5}
//! <- {"type":"spawned","ids":[0,1,...,14]}
//! -> {"cmd":"spawn","kind":"rock","x":100,"y":100}
//! <- {"type":"spawned","ids":[15]}
//! -> {"cmd":"random","kind":"paper","count":2}
//! <- {"type":"spawned","ids":[16,17]}
//! -> {"cmd":"tick","count":60}
//! <- {"type":"status","tick":60,"counts":{"Rock":6,...},...}
//! -> {"cmd":"pause"}
//! <- {"type":"ack","cmd":"pause"}
//! -> {"cmd":"quit"}
//! <- {"type":"ack","cmd":"quit"}
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use rps_core::agent::AgentId;
use rps_core::config::BoundaryMode;
use rps_core::kind::Kind;

use crate::runner::ScoreEntry;

/// Protocol version reported in the `ready` line.
pub const PROTOCOL_VERSION: &str = "1.0";

// ============================================================================
// Input Commands (controller -> session)
// ============================================================================

/// Commands accepted by an interactive session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Spawn one agent from a lowercase kind tag.
    Spawn { kind: String, x: f32, y: f32 },

    /// Spawn `count` (or the configured batch size) of one kind at random
    /// positions.
    Random {
        kind: String,
        #[serde(default)]
        count: Option<u32>,
    },

    /// Spawn `count` (or the configured batch size) of every kind.
    Batch {
        #[serde(default)]
        count: Option<u32>,
    },

    /// Spawn an uneven random mix, `min..=max` per kind.
    Mix {
        #[serde(default = "default_mix_min")]
        min: u32,
        #[serde(default = "default_mix_max")]
        max: u32,
    },

    /// Advance by `count` updates (default 1).
    Tick {
        #[serde(default = "default_tick_count")]
        count: u32,
    },

    /// Toggle pause.
    Pause,

    /// Toggle the debug flag.
    Debug,

    /// Turn steering on or off.
    Steering { enabled: bool },

    /// Switch edge behavior.
    Boundary { mode: BoundaryMode },

    /// Remove every agent, keeping the seed and tick.
    Clear,

    /// Start over, optionally with a new seed.
    Reset {
        #[serde(default)]
        seed: Option<u64>,
    },

    /// Query state without advancing.
    Status,

    /// Current state hash.
    Hash,

    /// End the session.
    Quit,
}

impl Command {
    /// Name used in `ack` and `error` responses.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Spawn { .. } => "spawn",
            Self::Random { .. } => "random",
            Self::Batch { .. } => "batch",
            Self::Mix { .. } => "mix",
            Self::Tick { .. } => "tick",
            Self::Pause => "pause",
            Self::Debug => "debug",
            Self::Steering { .. } => "steering",
            Self::Boundary { .. } => "boundary",
            Self::Clear => "clear",
            Self::Reset { .. } => "reset",
            Self::Status => "status",
            Self::Hash => "hash",
            Self::Quit => "quit",
        }
    }
}

fn default_tick_count() -> u32 {
    1
}

fn default_mix_min() -> u32 {
    *rps_core::world::UNEVEN_BATCH_RANGE.start()
}

fn default_mix_max() -> u32 {
    *rps_core::world::UNEVEN_BATCH_RANGE.end()
}

// ============================================================================
// Output Responses (session -> controller)
// ============================================================================

/// Responses written by an interactive session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Session is ready to accept commands.
    Ready { version: String, tick: u64, seed: u64 },

    /// Command applied.
    Ack { cmd: String },

    /// Agents created, possibly fewer than requested at the population cap.
    Spawned { ids: Vec<AgentId> },

    /// Session reset.
    Reset { seed: u64 },

    /// Current state.
    Status(StatusReport),

    /// State hash for determinism checks.
    Hash { tick: u64, hash: u64 },

    /// Command could not be applied; the session continues.
    Error {
        message: String,
        cmd: Option<String>,
    },
}

/// Body of a `status` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Current tick.
    pub tick: u64,
    /// Live agents per kind.
    pub counts: BTreeMap<Kind, usize>,
    /// Total live agents.
    pub total: usize,
    /// Pause flag.
    pub paused: bool,
    /// Debug flag.
    pub debug: bool,
    /// Steering on.
    pub steering: bool,
    /// Edge behavior.
    pub boundary: BoundaryMode,
    /// Exactly one kind left.
    pub game_over: bool,
    /// The surviving kind.
    pub winner: Option<Kind>,
    /// Ranked winners, empty until game over.
    pub scoreboard: Vec<ScoreEntry>,
}
