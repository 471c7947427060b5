//! Epsilon-greedy action selection over the Q-table

use rand::Rng;

use arena_rl_core::State;

use crate::q_table::QTable;

/// Epsilon-greedy selector.
///
/// With probability `epsilon` a uniformly random action is returned,
/// otherwise the table's best action for the state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpsilonGreedy {
    epsilon: f64,
}

impl EpsilonGreedy {
    /// Create a selector with the given exploration rate
    #[must_use]
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon: epsilon.clamp(0.0, 1.0),
        }
    }

    /// Current exploration rate
    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Set the exploration rate
    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon.clamp(0.0, 1.0);
    }

    /// Pick an action for `state`
    pub fn select_action<R: Rng + ?Sized>(&self, table: &QTable, state: &State, rng: &mut R) -> usize {
        select_action(table, state, self.epsilon, rng)
    }
}

/// Pick an action for `state` with exploration rate `epsilon`
pub fn select_action<R: Rng + ?Sized>(
    table: &QTable,
    state: &State,
    epsilon: f64,
    rng: &mut R,
) -> usize {
    if rng.gen::<f64>() < epsilon {
        // Explore: random action
        rng.gen_range(0..table.shape().actions)
    } else {
        // Exploit: best known action
        table.best_action(state)
    }
}
