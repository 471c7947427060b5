//! Exploration schedule helpers

use arena_rl_core::ExplorationConfig;

/// Per-episode linear epsilon decay with a floor.
///
/// Works on the current value rather than an episode counter, since epsilon
/// is persisted across runs and the counter is not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpsilonDecay {
    /// Amount subtracted per episode
    pub decrement: f64,
    /// Lowest value the decay reaches
    pub floor: f64,
}

impl EpsilonDecay {
    /// Create a new decay
    #[must_use]
    pub fn new(decrement: f64, floor: f64) -> Self {
        Self { decrement, floor }
    }

    /// Epsilon after one more episode
    #[must_use]
    pub fn step(&self, epsilon: f64) -> f64 {
        if epsilon > self.floor {
            (epsilon - self.decrement).max(self.floor)
        } else {
            epsilon
        }
    }

    /// Epsilon after `episodes` more episodes
    #[must_use]
    pub fn advance(&self, epsilon: f64, episodes: usize) -> f64 {
        (0..episodes).fold(epsilon, |eps, _| self.step(eps))
    }
}

impl From<ExplorationConfig> for EpsilonDecay {
    fn from(config: ExplorationConfig) -> Self {
        Self::new(config.epsilon_decrement, config.epsilon_floor)
    }
}
