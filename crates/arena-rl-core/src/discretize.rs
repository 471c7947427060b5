//! Continuous-to-bucket discretization and angle helpers
//!
//! Every function here is pure. Bearings are in degrees, with 0° pointing
//! north and angles increasing clockwise, the way the arena host reports them.

use serde::{Deserialize, Serialize};

/// Magnitude beyond which the correction loops first reduce with `rem_euclid`.
/// Below it the loops run exactly as written.
const LOOP_LIMIT_DEGREES: f64 = 1.0e6;

/// Fraction of the arena kept clear of the far edge by [`clamp_to_arena`]
const EDGE_MARGIN: f64 = 1.0e-9;

/// Bucket a position along one arena axis.
///
/// Computes `floor(position / (arena_size / bucket_count))`. The caller must
/// clamp `position` into `[0, arena_size)` first (see [`clamp_to_arena`]): a
/// position exactly at `arena_size` yields `bucket_count`, one past the end.
/// The result is signed so that such a slip surfaces as an out-of-range index
/// instead of wrapping.
#[must_use]
pub fn bucket_position(position: f64, arena_size: f64, bucket_count: usize) -> i64 {
    let bucket_size = arena_size / bucket_count as f64;
    (position / bucket_size).floor() as i64
}

/// Clamp a position into `[0, arena_size)`.
#[must_use]
pub fn clamp_to_arena(position: f64, arena_size: f64) -> f64 {
    let upper = arena_size * (1.0 - EDGE_MARGIN);
    if position.is_nan() || position < 0.0 {
        0.0
    } else if position >= upper {
        upper
    } else {
        position
    }
}

/// Bucket an absolute bearing so that bucket 0 is centred on 0°.
///
/// Half a bucket width is added before wrapping into `[0, 360)`.
#[must_use]
pub fn bucket_bearing(bearing_degrees: f64, bucket_count: usize) -> usize {
    let bucket_size = 360.0 / bucket_count as f64;
    let mut adjusted = reduce_large(bearing_degrees + bucket_size / 2.0);

    while adjusted >= 360.0 {
        adjusted -= 360.0;
    }
    while adjusted < 0.0 {
        adjusted += 360.0;
    }

    // Round-off on bucket sizes that do not divide 360 evenly
    ((adjusted / bucket_size).floor() as usize).min(bucket_count - 1)
}

/// Normalize an angle into `(-180, 180]`.
#[must_use]
pub fn normalize_angle(angle_degrees: f64) -> f64 {
    let mut angle = reduce_large(angle_degrees);
    while angle > 180.0 {
        angle -= 360.0;
    }
    while angle <= -180.0 {
        angle += 360.0;
    }
    angle
}

/// Convert a bearing relative to `heading` into an absolute bearing.
///
/// Wraps once in each direction only: sums within `[-360, 720)` land in
/// `[0, 360)`, anything further out is returned partially wrapped. A sum of
/// exactly 360 wraps to 0 so that the result stays half-open; the bearing
/// bucket is the same either way.
#[must_use]
pub fn absolute_bearing(heading: f64, relative_bearing: f64) -> f64 {
    let mut bearing = heading + relative_bearing;
    if bearing >= 360.0 {
        bearing -= 360.0;
    }
    if bearing < 0.0 {
        bearing += 360.0;
        // a tiny negative sum rounds up to 360 itself
        if bearing >= 360.0 {
            bearing = 0.0;
        }
    }
    bearing
}

fn reduce_large(degrees: f64) -> f64 {
    if degrees.abs() > LOOP_LIMIT_DEGREES {
        degrees.rem_euclid(360.0)
    } else {
        degrees
    }
}

/// Ascending distance cut-offs separating the distance buckets.
///
/// `n` thresholds produce `n + 1` buckets; a distance below `thresholds[i]`
/// (and not below any earlier one) lands in bucket `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DistanceThresholds(pub Vec<f64>);

impl Default for DistanceThresholds {
    fn default() -> Self {
        Self(vec![80.0, 300.0, 600.0])
    }
}

impl DistanceThresholds {
    /// Number of buckets these thresholds produce
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.0.len() + 1
    }

    /// Bucket a distance to the opponent
    #[must_use]
    pub fn bucket(&self, distance: f64) -> usize {
        self.0
            .iter()
            .position(|&threshold| distance < threshold)
            .unwrap_or(self.0.len())
    }

    /// Thresholds must be finite and strictly ascending
    #[must_use]
    pub fn is_ascending(&self) -> bool {
        self.0.iter().all(|t| t.is_finite()) && self.0.windows(2).all(|w| w[0] < w[1])
    }
}
