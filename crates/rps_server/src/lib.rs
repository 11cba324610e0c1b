//! # RPS Spawn Server
//!
//! Runs a live world without rendering and lets external clients add
//! agents to it.
//!
//! Clients connect over TCP and exchange JSON lines. A spawn request is
//! validated and clamped on the connection task, then pushed onto the
//! bounded spawn queue; the simulation task drains the queue at each tick
//! boundary. See [`protocol`] for the message format.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

use rps_core::config::Config;
use rps_core::error::SimError;
use rps_core::ingest::{DEFAULT_MARGIN, DEFAULT_QUEUE_CAPACITY};

pub mod protocol;
pub mod server;
pub mod sim;

pub use server::Server;

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Socket failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The world could not be built.
    #[error("Simulation error: {0}")]
    Sim(#[from] SimError),

    /// A response could not be encoded.
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// The simulation task panicked or was cancelled.
    #[error("Simulation task failed: {0}")]
    TaskFailed(String),

    /// A server setting is unusable.
    #[error("Invalid server config: {0}")]
    InvalidConfig(String),
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: String,
    /// Port to listen on. 0 picks a free port.
    pub port: u16,
    /// World updates per second.
    pub tick_rate: u32,
    /// Pending spawn requests before new ones are refused.
    pub queue_capacity: usize,
    /// Distance from the edge that off-screen spawns move to.
    pub margin: f32,
    /// Agents per kind spawned before the first tick.
    pub initial_batch: Option<u32>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            tick_rate: 60,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            margin: DEFAULT_MARGIN,
            initial_batch: None,
        }
    }
}

impl ServerConfig {
    /// `host:port` to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Fixed timestep matching the tick rate.
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    /// Reject unusable settings.
    pub fn validate(&self) -> Result<()> {
        if self.tick_rate == 0 {
            return Err(ServerError::InvalidConfig("tick_rate must be positive".to_string()));
        }
        if self.queue_capacity == 0 {
            return Err(ServerError::InvalidConfig("queue_capacity must be positive".to_string()));
        }
        if !(self.margin.is_finite() && self.margin >= 0.0) {
            return Err(ServerError::InvalidConfig(format!("margin must be non-negative, got {}", self.margin)));
        }
        Ok(())
    }

    /// Reject a margin that leaves no room between opposite edges of
    /// `world`'s arena.
    pub fn validate_arena(&self, world: &Config) -> Result<()> {
        let shortest = world.width.min(world.height);
        if 2.0 * self.margin >= shortest {
            return Err(ServerError::InvalidConfig(format!(
                "margin {} must be under half the shortest arena side ({shortest})",
                self.margin
            )));
        }
        Ok(())
    }
}
