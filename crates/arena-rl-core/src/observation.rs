//! Raw observations supplied by the arena host

use serde::{Deserialize, Serialize};

/// Own-state snapshot taken once per decision tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Arena width
    pub arena_width: f64,
    /// Arena height
    pub arena_height: f64,
    /// Own heading in degrees
    pub heading: f64,
}

impl Observation {
    /// Create an observation
    #[must_use]
    pub fn new(x: f64, y: f64, arena_width: f64, arena_height: f64, heading: f64) -> Self {
        Self {
            x,
            y,
            arena_width,
            arena_height,
            heading,
        }
    }
}

/// Radar contact with the opponent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scan {
    /// Bearing to the opponent relative to own heading, in degrees
    pub bearing: f64,
    /// Distance to the opponent
    pub distance: f64,
    /// Opponent heading
    pub heading: f64,
    /// Opponent velocity
    pub velocity: f64,
    /// Own heading when the scan was taken
    pub own_heading: f64,
}

impl Scan {
    /// Absolute bearing to the opponent
    #[must_use]
    pub fn absolute_bearing(&self) -> f64 {
        crate::discretize::absolute_bearing(self.own_heading, self.bearing)
    }
}
