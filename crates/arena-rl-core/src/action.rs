//! Discrete maneuvers and the host commands they translate to

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::discretize::normalize_angle;

/// Closed set of maneuvers the agent can choose from.
///
/// Table columns follow the declaration order; a table with `n` actions uses
/// the first `n` variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Face 0°
    TurnNorth,
    /// Face 45°
    TurnNorthEast,
    /// Face 90°
    TurnEast,
    /// Face 135°
    TurnSouthEast,
    /// Face 180°
    TurnSouth,
    /// Face -135°
    TurnSouthWest,
    /// Face -90°
    TurnWest,
    /// Face -45°
    TurnNorthWest,
    /// Hold position
    Stay,
    /// Drive ahead
    MoveForward,
    /// Reverse
    MoveBackward,
}

impl Action {
    /// Every action in column order
    pub const ALL: [Action; 11] = [
        Action::TurnNorth,
        Action::TurnNorthEast,
        Action::TurnEast,
        Action::TurnSouthEast,
        Action::TurnSouth,
        Action::TurnSouthWest,
        Action::TurnWest,
        Action::TurnNorthWest,
        Action::Stay,
        Action::MoveForward,
        Action::MoveBackward,
    ];

    /// Action for a table column, if there is one
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Table column of this action
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Target heading for the compass turns, normalized into `(-180, 180]`
    #[must_use]
    pub fn bearing(self) -> Option<f64> {
        match self {
            Self::TurnNorth => Some(0.0),
            Self::TurnNorthEast => Some(45.0),
            Self::TurnEast => Some(90.0),
            Self::TurnSouthEast => Some(135.0),
            Self::TurnSouth => Some(180.0),
            Self::TurnSouthWest => Some(-135.0),
            Self::TurnWest => Some(-90.0),
            Self::TurnNorthWest => Some(-45.0),
            Self::Stay | Self::MoveForward | Self::MoveBackward => None,
        }
    }

    /// Host command for this action given the current heading
    #[must_use]
    pub fn maneuver(self, heading: f64, move_distance: f64) -> Maneuver {
        match self {
            Self::Stay => Maneuver::Hold,
            Self::MoveForward => Maneuver::Ahead(move_distance),
            Self::MoveBackward => Maneuver::Back(move_distance),
            turn => Maneuver::Turn {
                degrees: turn_delta(heading, turn.bearing().unwrap_or_default()),
            },
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Command handed to the host for execution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Maneuver {
    /// Turn by a signed delta: positive is clockwise (right)
    Turn {
        /// Turn amount in degrees
        degrees: f64,
    },
    /// Do nothing this tick
    Hold,
    /// Drive forward the given distance
    Ahead(f64),
    /// Drive backward the given distance
    Back(f64),
}

/// Shortest signed turn from `heading` to face `target_bearing`
#[must_use]
pub fn turn_delta(heading: f64, target_bearing: f64) -> f64 {
    normalize_angle(target_bearing - normalize_angle(heading))
}
