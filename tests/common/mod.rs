//! Shared helpers for the integration tests

#![allow(dead_code)] // each test binary uses a different subset

pub mod builders;
pub mod mock_helpers;

use std::time::Duration;

/// Upper bound for waits on background producers
pub fn test_timeout() -> Duration {
    Duration::from_secs(10)
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}
