//! Error types for the arena RL core

use thiserror::Error;

/// Core error type for discretization, configuration and persistence
#[derive(Error, Debug)]
pub enum ArenaError {
    /// Saved table data is short, non-numeric or otherwise unusable
    #[error("Malformed persisted state at line {line}: {reason}")]
    MalformedPersistedState {
        /// 1-based line number where reading stopped
        line: usize,
        /// What was wrong with it
        reason: String,
    },

    /// A bucket index fell outside its dimension
    #[error("Index out of range: {dimension} bucket {index} not in [0, {len})")]
    IndexOutOfRange {
        /// Name of the offending dimension
        dimension: &'static str,
        /// The index that was produced
        index: i64,
        /// Size of the dimension
        len: usize,
    },

    /// Configuration failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArenaError {
    /// Shorthand for a malformed-state error
    #[must_use]
    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedPersistedState {
            line,
            reason: reason.into(),
        }
    }
}

/// Result type alias for arena RL operations
pub type Result<T> = std::result::Result<T, ArenaError>;
