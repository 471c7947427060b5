//! Configuration for the decision core
//!
//! Every section has working defaults, so a JSON file only needs the fields
//! it wants to change:
//!
//! ```json
//! { "learning": { "gamma": 0.8 }, "persistence": { "save_path": "q_values.data" } }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::action::Action;
use crate::discretize::DistanceThresholds;
use crate::reward::RewardSchedule;
use crate::state::TableShape;
use crate::{ArenaError, Result};

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// Table dimensions and discretization
    pub table: TableConfig,
    /// Update rule parameters
    pub learning: LearningConfig,
    /// Exploration schedule
    pub exploration: ExplorationConfig,
    /// Event rewards
    pub rewards: RewardSchedule,
    /// Save file handling
    pub persistence: PersistenceConfig,
    /// Distance used by forward and backward moves
    pub move_distance: f64,
    /// Random seed for the policy; entropy when absent
    pub seed: Option<u64>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            table: TableConfig::default(),
            learning: LearningConfig::default(),
            exploration: ExplorationConfig::default(),
            rewards: RewardSchedule::default(),
            persistence: PersistenceConfig::default(),
            move_distance: 100.0,
            seed: None,
        }
    }
}

/// Discretization settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Buckets along the arena width
    pub x_buckets: usize,
    /// Buckets along the arena height
    pub y_buckets: usize,
    /// Opponent bearing buckets
    pub bearing_buckets: usize,
    /// Number of enabled actions, taken from the front of [`Action::ALL`]
    pub action_count: usize,
    /// Distance cut-offs; one more bucket than thresholds
    pub distance_thresholds: DistanceThresholds,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            x_buckets: 10,
            y_buckets: 10,
            bearing_buckets: 8,
            action_count: Action::ALL.len(),
            distance_thresholds: DistanceThresholds::default(),
        }
    }
}

impl TableConfig {
    /// Table dimensions implied by these settings
    #[must_use]
    pub fn shape(&self) -> TableShape {
        TableShape {
            x_buckets: self.x_buckets,
            y_buckets: self.y_buckets,
            bearing_buckets: self.bearing_buckets,
            distance_buckets: self.distance_thresholds.bucket_count(),
            actions: self.action_count,
        }
    }
}

/// Q-learning update parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Learning rate
    pub alpha: f64,
    /// Discount factor
    pub gamma: f64,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            gamma: 0.9,
        }
    }
}

/// Per-episode epsilon decay
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorationConfig {
    /// Epsilon when no save file exists
    pub epsilon_start: f64,
    /// Subtracted at every episode end
    pub epsilon_decrement: f64,
    /// Epsilon never decays below this
    pub epsilon_floor: f64,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            epsilon_start: 1.0,
            epsilon_decrement: 0.00001,
            epsilon_floor: 0.01,
        }
    }
}

/// Save file settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Where the table is saved; nothing is persisted when unset
    pub save_path: Option<PathBuf>,
    /// Decimal places written per cell
    pub decimals: u32,
    /// Largest absolute cell value after normalization
    pub normalize_scale: f64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            save_path: None,
            decimals: 2,
            normalize_scale: 99.99,
        }
    }
}

impl ArenaConfig {
    /// Read a JSON configuration file and validate it
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        tracing::debug!(path = %path.as_ref().display(), "loaded configuration");
        Ok(config)
    }

    /// Table dimensions implied by this configuration
    #[must_use]
    pub fn shape(&self) -> TableShape {
        self.table.shape()
    }

    /// Check ranges and cross-field constraints
    pub fn validate(&self) -> Result<()> {
        let table = &self.table;
        if table.x_buckets == 0 || table.y_buckets == 0 || table.bearing_buckets == 0 {
            return Err(invalid("bucket counts must be at least 1"));
        }
        if table.action_count == 0 || table.action_count > Action::ALL.len() {
            return Err(invalid(format!(
                "action_count must be in [1, {}], got {}",
                Action::ALL.len(),
                table.action_count
            )));
        }
        if !table.distance_thresholds.is_ascending() {
            return Err(invalid("distance_thresholds must be finite and strictly ascending"));
        }

        let learning = &self.learning;
        if !(0.0..=1.0).contains(&learning.alpha) {
            return Err(invalid(format!("alpha must be in [0, 1], got {}", learning.alpha)));
        }
        if !(0.0..=1.0).contains(&learning.gamma) {
            return Err(invalid(format!("gamma must be in [0, 1], got {}", learning.gamma)));
        }

        let exploration = &self.exploration;
        if !(0.0..=1.0).contains(&exploration.epsilon_floor)
            || !(exploration.epsilon_floor..=1.0).contains(&exploration.epsilon_start)
        {
            return Err(invalid("epsilon must satisfy 0 <= floor <= start <= 1"));
        }
        if exploration.epsilon_decrement.is_nan() || exploration.epsilon_decrement < 0.0 {
            return Err(invalid("epsilon_decrement must be non-negative"));
        }

        let persistence = &self.persistence;
        if !(persistence.normalize_scale.is_finite() && persistence.normalize_scale > 0.0) {
            return Err(invalid("normalize_scale must be positive and finite"));
        }
        if persistence.decimals > 12 {
            return Err(invalid("decimals must be at most 12"));
        }
        if !(self.move_distance.is_finite() && self.move_distance >= 0.0) {
            return Err(invalid("move_distance must be non-negative and finite"));
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> ArenaError {
    ArenaError::InvalidConfig(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ArenaConfig::default();
        config.validate().unwrap();
        assert_eq!(config.move_distance, 100.0);
        assert_eq!(config.shape(), TableShape::default());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: ArenaConfig = serde_json::from_str(
            r#"{ "learning": { "gamma": 0.8 }, "table": { "action_count": 9 } }"#,
        )
        .unwrap();
        assert_eq!(config.learning.gamma, 0.8);
        assert_eq!(config.learning.alpha, 0.5);
        assert_eq!(config.shape().actions, 9);
        assert_eq!(config.shape().distance_buckets, 4);
        assert_eq!(config.persistence.decimals, 2);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = ArenaConfig::default();
        config.table.action_count = 12;
        assert!(matches!(config.validate(), Err(ArenaError::InvalidConfig(_))));

        let mut config = ArenaConfig::default();
        config.table.distance_thresholds = DistanceThresholds(vec![300.0, 80.0]);
        assert!(config.validate().is_err());

        let mut config = ArenaConfig::default();
        config.exploration.epsilon_start = 0.001;
        assert!(config.validate().is_err());

        let mut config = ArenaConfig::default();
        config.learning.alpha = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arena.json");
        std::fs::write(&path, r#"{ "seed": 7, "move_distance": 80.0 }"#).unwrap();

        let config = ArenaConfig::from_json_file(&path).unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.move_distance, 80.0);
    }
}
