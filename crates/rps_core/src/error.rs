//! Error types for the world simulation.

use thiserror::Error;

/// Result type alias using [`SimError`].
pub type Result<T> = std::result::Result<T, SimError>;

/// Top-level error type for all simulation errors.
///
/// Capacity conditions (population cap, full spawn queue) are not errors;
/// they surface as `None`, partial lists or `false`.
#[derive(Debug, Error)]
pub enum SimError {
    /// An agent kind tag that names none of the known kinds.
    #[error("Unknown agent kind: {0}. Valid kinds: rock, paper, scissors")]
    UnknownKind(String),

    /// A configuration value is out of its valid range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file parsing error.
    #[error("Failed to parse config file '{path}': {message}")]
    ConfigParse {
        /// Path to the file that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Filesystem error while reading or writing config and replay files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid simulation or replay state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A replay did not reproduce its recorded final state.
    #[error("Replay diverged at tick {tick}: expected hash {expected}, got {actual}")]
    ReplayMismatch {
        /// Tick the replay ended on.
        tick: u64,
        /// Hash stored in the replay.
        expected: u64,
        /// Hash produced by re-simulation.
        actual: u64,
    },
}
