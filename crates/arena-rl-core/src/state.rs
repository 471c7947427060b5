//! Discretized agent state and table dimensions

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ArenaError, Result};

/// Bucketed agent state: own position plus opponent bearing and distance.
///
/// Only [`TableShape::state`] builds one, so every component is inside the
/// shape it was checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct State {
    x: usize,
    y: usize,
    bearing: usize,
    distance: usize,
}

impl State {
    /// X position bucket
    #[must_use]
    pub fn x(&self) -> usize {
        self.x
    }

    /// Y position bucket
    #[must_use]
    pub fn y(&self) -> usize {
        self.y
    }

    /// Opponent bearing bucket
    #[must_use]
    pub fn bearing(&self) -> usize {
        self.bearing
    }

    /// Opponent distance bucket
    #[must_use]
    pub fn distance(&self) -> usize {
        self.distance
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(x={}, y={}, bearing={}, distance={})",
            self.x, self.y, self.bearing, self.distance
        )
    }
}

/// Sizes of the five table dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableShape {
    /// Buckets along the arena width
    pub x_buckets: usize,
    /// Buckets along the arena height
    pub y_buckets: usize,
    /// Opponent bearing buckets
    pub bearing_buckets: usize,
    /// Opponent distance buckets
    pub distance_buckets: usize,
    /// Number of enabled actions
    pub actions: usize,
}

impl Default for TableShape {
    fn default() -> Self {
        Self {
            x_buckets: 10,
            y_buckets: 10,
            bearing_buckets: 8,
            distance_buckets: 4,
            actions: crate::action::Action::ALL.len(),
        }
    }
}

impl TableShape {
    /// Number of distinct states
    #[must_use]
    pub fn state_count(&self) -> usize {
        self.x_buckets * self.y_buckets * self.bearing_buckets * self.distance_buckets
    }

    /// Total number of cells, one per state-action pair
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.state_count() * self.actions
    }

    /// Build a state, rejecting any component outside its dimension.
    ///
    /// Position buckets are signed because an unclamped position can land
    /// below zero or one past the end.
    pub fn state(&self, x: i64, y: i64, bearing: usize, distance: usize) -> Result<State> {
        Ok(State {
            x: check("x", x, self.x_buckets)?,
            y: check("y", y, self.y_buckets)?,
            bearing: check("bearing", bearing as i64, self.bearing_buckets)?,
            distance: check("distance", distance as i64, self.distance_buckets)?,
        })
    }

    /// Offset of the first cell of `state`'s row in a flat buffer.
    ///
    /// Nesting is x, y, bearing, distance, action from outermost to innermost.
    #[must_use]
    pub fn row_offset(&self, state: &State) -> usize {
        (((state.x * self.y_buckets + state.y) * self.bearing_buckets + state.bearing)
            * self.distance_buckets
            + state.distance)
            * self.actions
    }

    /// Iterate over every state in storage order
    pub fn states(&self) -> impl Iterator<Item = State> + '_ {
        (0..self.x_buckets).flat_map(move |x| {
            (0..self.y_buckets).flat_map(move |y| {
                (0..self.bearing_buckets).flat_map(move |bearing| {
                    (0..self.distance_buckets).map(move |distance| State {
                        x,
                        y,
                        bearing,
                        distance,
                    })
                })
            })
        })
    }
}

fn check(dimension: &'static str, index: i64, len: usize) -> Result<usize> {
    if index < 0 || index as usize >= len {
        return Err(ArenaError::IndexOutOfRange {
            dimension,
            index,
            len,
        });
    }
    Ok(index as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_shape() {
        let shape = TableShape::default();
        assert_eq!(shape.state_count(), 10 * 10 * 8 * 4);
        assert_eq!(shape.cell_count(), 10 * 10 * 8 * 4 * 11);
    }

    #[test]
    fn test_state_bounds_checked() {
        let shape = TableShape::default();
        assert!(shape.state(9, 9, 7, 3).is_ok());

        let err = shape.state(10, 0, 0, 0).unwrap_err();
        assert!(matches!(
            err,
            ArenaError::IndexOutOfRange { dimension: "x", index: 10, len: 10 }
        ));
        assert!(shape.state(0, -1, 0, 0).is_err());
        assert!(shape.state(0, 0, 8, 0).is_err());
        assert!(shape.state(0, 0, 0, 4).is_err());
    }

    #[test]
    fn test_row_offsets_follow_storage_order() {
        let shape = TableShape {
            x_buckets: 2,
            y_buckets: 3,
            bearing_buckets: 2,
            distance_buckets: 2,
            actions: 3,
        };

        let offsets: Vec<usize> = shape.states().map(|s| shape.row_offset(&s)).collect();
        assert_eq!(offsets.len(), shape.state_count());
        for (i, offset) in offsets.iter().enumerate() {
            assert_eq!(*offset, i * shape.actions);
        }
    }
}
