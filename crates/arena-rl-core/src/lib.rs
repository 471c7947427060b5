//! Core types for the arena duel Q-learning agent
//!
//! This crate turns the host's continuous observations into bounded table
//! indices and defines the vocabulary shared with the learning crate:
//! actions, rewards, configuration and errors.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]

pub mod action;
pub mod config;
pub mod discretize;
pub mod error;
pub mod observation;
pub mod reward;
pub mod state;

// Re-export core types
pub use action::{Action, Maneuver};
pub use config::{ArenaConfig, ExplorationConfig, LearningConfig, PersistenceConfig, TableConfig};
pub use discretize::DistanceThresholds;
pub use error::{ArenaError, Result};
pub use observation::{Observation, Scan};
pub use reward::{Reward, RewardAccumulator, RewardEvent, RewardSchedule};
pub use state::{State, TableShape};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Action, ArenaConfig, ArenaError, Maneuver, Observation, Result, Reward, RewardEvent, Scan,
        State, TableShape,
    };
}
