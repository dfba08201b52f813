//! Statistics used by the adaptation controller
//!
//! - **dickey_fuller**: unit-root test on the realized-gap series
//! - sample moments shared by the test and the variance comparison

pub mod dickey_fuller;

pub use dickey_fuller::{DickeyFullerResult, DickeyFullerTest};

/// Arithmetic mean; `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Unbiased sample variance; `None` for fewer than two values
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some(ss / (values.len() - 1) as f64)
}
