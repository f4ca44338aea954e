//! Helper functions for integration tests

use ndarray::ArrayView1;
use sedcap_rs::output::{Field, Snapshot};

/// Routes `log` output of the solver to the test harness (`RUST_LOG=debug` to see regrids)
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Assert that two depth profiles are close (within tolerance)
pub fn assert_profiles_close(actual: ArrayView1<f64>, expected: ArrayView1<f64>, tolerance: f64, message: &str) {
    assert_eq!(actual.len(), expected.len(), "{}: Dimension mismatch", message);
    for (i, (&a, &e)) in actual.iter().zip(expected.iter()).enumerate() {
        let diff = (a - e).abs();
        assert!(
            diff < tolerance,
            "{}: point {} differs by {} (tolerance {})",
            message, i, diff, tolerance
        );
    }
}

/// Root-mean-square difference between two profiles
pub fn compute_l2_error(actual: ArrayView1<f64>, expected: ArrayView1<f64>) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let sum: f64 = actual.iter().zip(expected.iter()).map(|(a, e)| (a - e).powi(2)).sum();
    (sum / actual.len() as f64).sqrt()
}

/// Compute relative error: |actual - expected| / |expected|
pub fn relative_error(actual: f64, expected: f64) -> f64 {
    if expected.abs() < 1e-10 {
        (actual - expected).abs()
    } else {
        (actual - expected).abs() / expected.abs()
    }
}

/// Complementary error function (Abramowitz & Stegun 7.1.26, |error| < 1.5e-7)
pub fn erfc(x: f64) -> f64 {
    if x < 0.0 {
        return 2.0 - erfc(-x);
    }
    let t = 1.0 / (1.0 + 0.327_591_1 * x);
    let poly = t * (0.254_829_592 + t * (-0.284_496_736 + t * (1.421_413_741 + t * (-1.453_152_027 + t * 1.061_405_429))));
    poly * (-x * x).exp()
}

/// Trapezoidal integral of `values` over `depth`
pub fn trapezoid(depth: ArrayView1<f64>, values: ArrayView1<f64>) -> f64 {
    (1..depth.len())
        .map(|i| 0.5 * (depth[i] - depth[i - 1]) * (values[i] + values[i - 1]))
        .sum()
}

/// Mass of `chemical` per unit area held by the bed (and the overlying water of depth `water_depth`)
pub fn inventory(snapshot: &Snapshot, chemical: usize, water_depth: f64) -> f64 {
    let total = snapshot.profile(Field::Total, chemical).expect("total profile");
    let water = snapshot.overlying_water.as_ref().map_or(0.0, |w| w[chemical]);
    trapezoid(snapshot.depth.view(), total) + water_depth * water
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_relative_error() {
        assert!((relative_error(1.0, 1.0) - 0.0).abs() < 1e-10);
        assert!((relative_error(1.1, 1.0) - 0.1).abs() < 1e-10);
        assert!((relative_error(0.9, 1.0) - 0.1).abs() < 1e-10);
    }

    #[test]
    fn test_erfc_reference_values() {
        assert!((erfc(0.0) - 1.0).abs() < 1e-6);
        assert!((erfc(1.0) - 0.157_299_2).abs() < 1e-6);
        assert!((erfc(-1.0) - 1.842_700_8).abs() < 1e-6);
    }

    #[test]
    fn test_trapezoid_of_linear_profile() {
        let z = array![0.0, 1.0, 3.0];
        let v = array![0.0, 1.0, 3.0];
        assert!((trapezoid(z.view(), v.view()) - 4.5).abs() < 1e-12);
    }
}
