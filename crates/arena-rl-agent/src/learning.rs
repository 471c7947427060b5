//! One-step tabular Q-learning update

use serde::{Deserialize, Serialize};

use arena_rl_core::{LearningConfig, Reward, State};

use crate::q_table::QTable;

/// Q-learning update rule.
///
/// `Q(s, a) ← (1 - α)·Q(s, a) + α·(r + γ·max_a' Q(s', a'))`
///
/// The bootstrap term uses [`QTable::best_value`], so it inherits the
/// zero-baseline argmax.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QLearning {
    /// Learning rate α
    pub alpha: f64,
    /// Discount factor γ
    pub gamma: f64,
}

impl Default for QLearning {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            gamma: 0.9,
        }
    }
}

impl From<LearningConfig> for QLearning {
    fn from(config: LearningConfig) -> Self {
        Self {
            alpha: config.alpha,
            gamma: config.gamma,
        }
    }
}

impl QLearning {
    /// Create an update rule
    #[must_use]
    pub fn new(alpha: f64, gamma: f64) -> Self {
        Self { alpha, gamma }
    }

    /// Blend of the old estimate and the bootstrapped target
    #[must_use]
    pub fn blend(&self, current: f64, reward: f64, next_best: f64) -> f64 {
        (1.0 - self.alpha) * current + self.alpha * (reward + self.gamma * next_best)
    }

    /// Apply the update to `(prior, action)` and return the new value
    pub fn update(
        &self,
        table: &mut QTable,
        prior: &State,
        action: usize,
        reward: Reward,
        outcome: &State,
    ) -> f64 {
        let next_best = table.best_value(outcome);
        let value = self.blend(table.get(prior, action), reward.value(), next_best);
        table.set(prior, action, value);
        value
    }
}
