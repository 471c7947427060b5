//! Tabular Q-learning agent for arena duels
//!
//! This crate provides the learning side of the agent:
//! - A dense Q-table over discretized arena states
//! - Epsilon-greedy action selection
//! - The one-step Q-learning update
//! - Text persistence of the table and exploration rate
//! - An episode controller driving it all against the host

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]

pub mod controller;
pub mod learning;
pub mod persistence;
pub mod policy;
pub mod q_table;
pub mod utils;

// Re-export agent components
pub use controller::{
    EpisodeController, EpisodeSummary, Executor, HostEvent, HostSender, Outcome, Phase, TickReport,
};
pub use learning::QLearning;
pub use persistence::PersistedState;
pub use policy::EpsilonGreedy;
pub use q_table::QTable;
pub use utils::EpsilonDecay;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        EpisodeController, EpisodeSummary, Executor, HostSender, Outcome, QLearning, QTable,
        TickReport,
    };
    pub use arena_rl_core::prelude::*;
}
