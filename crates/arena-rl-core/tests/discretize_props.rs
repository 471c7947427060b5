//! Property tests for the discretizer

use approx::assert_relative_eq;
use arena_rl_core::discretize::{
    absolute_bearing, bucket_bearing, bucket_position, clamp_to_arena, normalize_angle,
    DistanceThresholds,
};
use arena_rl_core::TableShape;
use proptest::prelude::*;

proptest! {
    #[test]
    fn position_inside_arena_stays_in_range(
        arena in 100.0f64..5000.0,
        frac in 0.0f64..1.0,
        n in 1usize..64,
    ) {
        let p = arena * frac;
        prop_assume!(p < arena);
        let bucket = bucket_position(p, arena, n);
        prop_assert!(bucket >= 0 && (bucket as usize) < n);
    }

    #[test]
    fn clamped_position_always_yields_a_state(
        arena in 100.0f64..5000.0,
        p in -1.0e6f64..1.0e6,
        n in 1usize..64,
    ) {
        let shape = TableShape { x_buckets: n, ..TableShape::default() };
        let bucket = bucket_position(clamp_to_arena(p, arena), arena, n);
        prop_assert!(shape.state(bucket, 0, 0, 0).is_ok());
    }

    #[test]
    fn bearing_bucket_is_periodic(b in -5000.0f64..5000.0, n in 1usize..32) {
        prop_assert_eq!(bucket_bearing(b, n), bucket_bearing(b + 360.0, n));
    }

    #[test]
    fn bearing_bucket_in_range(b in proptest::num::f64::NORMAL, n in 1usize..32) {
        prop_assert!(bucket_bearing(b, n) < n);
    }

    #[test]
    fn normalize_angle_is_idempotent(a in -1.0e5f64..1.0e5) {
        let once = normalize_angle(a);
        prop_assert!(once > -180.0 && once <= 180.0);
        prop_assert_eq!(normalize_angle(once), once);
    }

    #[test]
    fn absolute_bearing_in_range_for_host_inputs(
        heading in 0.0f64..360.0,
        relative in -180.0f64..180.0,
    ) {
        let bearing = absolute_bearing(heading, relative);
        prop_assert!((0.0..360.0).contains(&bearing));
    }

    #[test]
    fn absolute_bearing_just_below_north_stays_in_range(offset in -1.0e-9f64..0.0) {
        let bearing = absolute_bearing(0.0, offset);
        prop_assert!((0.0..360.0).contains(&bearing));
    }

    #[test]
    fn distance_bucket_is_monotonic(a in 0.0f64..2000.0, b in 0.0f64..2000.0) {
        let thresholds = DistanceThresholds::default();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(thresholds.bucket(lo) <= thresholds.bucket(hi));
        prop_assert!(thresholds.bucket(hi) < thresholds.bucket_count());
    }
}

#[test]
fn normalize_angle_matches_modular_reference() {
    for tenth in -7200..7200 {
        let a = f64::from(tenth) / 10.0;
        let reference = {
            let r = (a + 180.0).rem_euclid(360.0) - 180.0;
            if r == -180.0 { 180.0 } else { r }
        };
        assert_relative_eq!(normalize_angle(a), reference, epsilon = 1e-9);
    }
}
