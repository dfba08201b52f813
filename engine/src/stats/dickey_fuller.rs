//! Dickey-Fuller unit-root test
//!
//! Regresses the first difference on the lagged level with an intercept:
//!
//! ```text
//! Δx[k] = δ · x[k] + β + ε[k],   k = 0..K-2
//! ```
//!
//! and compares `t = δ / se(δ)` against a critical value. A clearly
//! negative `t` means the series pulls back towards its mean, i.e. it no
//! longer behaves like a random walk and its mean can be trusted.
//!
//! # Degeneracy
//!
//! Short series, a constant level, or a perfect fit produce no usable
//! standard error. Such inputs yield `stationary == false` and no
//! t-statistic, so the caller keeps accumulating samples.

use serde::{Deserialize, Serialize};

/// Minimum series length: three regression coefficients' worth of data
/// plus one residual degree of freedom.
pub const MIN_SAMPLE_SIZE: usize = 4;

/// Persistence values this close to 1 make the mean-variance formula blow up
const UNIT_ROOT_GUARD: f64 = 1e-6;

/// Outcome of one Dickey-Fuller run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DickeyFullerResult {
    /// Series length K
    pub sample_size: usize,
    /// Plain sample mean of the series
    pub mean: f64,
    /// OLS slope δ (persistence a = δ + 1)
    pub delta: Option<f64>,
    /// OLS intercept β
    pub intercept: Option<f64>,
    /// OLS residual variance σ²_ε (K - 3 degrees of freedom)
    pub residual_variance: Option<f64>,
    /// δ / se(δ)
    pub t_statistic: Option<f64>,
    /// Variance of the sample mean under an AR(1) model
    ///
    /// Only meaningful when `stationary` is true.
    pub variance_of_mean: Option<f64>,
    /// t-statistic below the critical value
    pub stationary: bool,
}

impl DickeyFullerResult {
    fn degenerate(sample_size: usize, mean: f64) -> Self {
        Self {
            sample_size,
            mean,
            delta: None,
            intercept: None,
            residual_variance: None,
            t_statistic: None,
            variance_of_mean: None,
            stationary: false,
        }
    }

    /// AR(1) persistence a = δ + 1
    pub fn persistence(&self) -> Option<f64> {
        self.delta.map(|d| d + 1.0)
    }
}

/// Dickey-Fuller test with a configurable critical value
///
/// # Example
/// ```
/// use replanner_core_rs::stats::DickeyFullerTest;
///
/// // Alternating series with a little bounded jitter: strongly mean-reverting
/// let series: Vec<f64> = (0..40)
///     .map(|k| {
///         let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
///         sign + ((k * 7919) % 13) as f64 / 100.0
///     })
///     .collect();
/// let result = DickeyFullerTest::default().run(&series);
/// assert!(result.stationary);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DickeyFullerTest {
    critical_value: f64,
}

impl Default for DickeyFullerTest {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CRITICAL_VALUE)
    }
}

impl DickeyFullerTest {
    pub const DEFAULT_CRITICAL_VALUE: f64 = -3.0;

    pub fn new(critical_value: f64) -> Self {
        Self { critical_value }
    }

    pub fn critical_value(&self) -> f64 {
        self.critical_value
    }

    /// Run the test on `series`
    pub fn run(&self, series: &[f64]) -> DickeyFullerResult {
        let k = series.len();
        let mean = if k == 0 {
            0.0
        } else {
            series.iter().sum::<f64>() / k as f64
        };
        if k < MIN_SAMPLE_SIZE || !mean.is_finite() {
            return DickeyFullerResult::degenerate(k, mean);
        }

        // Regressor: lagged level; response: first difference
        let n = (k - 1) as f64;
        let levels = &series[..k - 1];
        let diffs: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();

        let z_bar = levels.iter().sum::<f64>() / n;
        let y_bar = diffs.iter().sum::<f64>() / n;

        let mut s_zz = 0.0;
        let mut s_zy = 0.0;
        let mut z_sq = 0.0;
        for (z, y) in levels.iter().zip(&diffs) {
            let dz = z - z_bar;
            s_zz += dz * dz;
            s_zy += dz * (y - y_bar);
            z_sq += z * z;
        }

        // Constant level (up to rounding in z_bar)
        if !(s_zz > 1e-12 * z_sq.max(f64::MIN_POSITIVE)) {
            return DickeyFullerResult::degenerate(k, mean);
        }

        let delta = s_zy / s_zz;
        let intercept = y_bar - delta * z_bar;

        let sse: f64 = levels
            .iter()
            .zip(&diffs)
            .map(|(z, y)| {
                let e = y - delta * z - intercept;
                e * e
            })
            .sum();
        let dof = (k - 3) as f64;
        let residual_variance = sse / dof;

        let std_err = (residual_variance / s_zz).sqrt();
        if !std_err.is_finite() || std_err <= 0.0 {
            return DickeyFullerResult::degenerate(k, mean);
        }
        let t_statistic = delta / std_err;

        DickeyFullerResult {
            sample_size: k,
            mean,
            delta: Some(delta),
            intercept: Some(intercept),
            residual_variance: Some(residual_variance),
            t_statistic: Some(t_statistic),
            variance_of_mean: ar1_variance_of_mean(residual_variance, delta + 1.0, k),
            stationary: t_statistic < self.critical_value,
        }
    }
}

/// `σ² / K² · (K + 2a·(K(1−a) − (1−a^K)) / (1−a)²)`
///
/// `None` near the unit root or when the result is not a finite,
/// non-negative number.
pub fn ar1_variance_of_mean(residual_variance: f64, a: f64, k: usize) -> Option<f64> {
    let one_minus_a = 1.0 - a;
    if one_minus_a.abs() < UNIT_ROOT_GUARD {
        return None;
    }
    let kf = k as f64;
    let a_pow_k = a.powi(k.min(i32::MAX as usize) as i32);
    let correction = 2.0 * a * (kf * one_minus_a - (1.0 - a_pow_k)) / (one_minus_a * one_minus_a);
    let value = residual_variance / (kf * kf) * (kf + correction);

    (value.is_finite() && value >= 0.0).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_series_not_stationary() {
        let result = DickeyFullerTest::default().run(&[10.0; 30]);
        assert!(!result.stationary);
        assert_eq!(result.t_statistic, None);
        assert_eq!(result.mean, 10.0);
    }

    #[test]
    fn test_repeating_decimal_constant_not_stationary() {
        let result = DickeyFullerTest::default().run(&[0.1; 17]);
        assert!(!result.stationary);
        assert_eq!(result.t_statistic, None);
    }

    #[test]
    fn test_short_series_not_stationary() {
        let result = DickeyFullerTest::default().run(&[1.0, -1.0, 1.0]);
        assert!(!result.stationary);
        assert_eq!(result.sample_size, 3);
    }

    #[test]
    fn test_empty_series() {
        let result = DickeyFullerTest::default().run(&[]);
        assert!(!result.stationary);
        assert_eq!(result.mean, 0.0);
    }

    #[test]
    fn test_linear_trend_is_degenerate() {
        // Δx is constant: perfect fit with δ = 0, zero residuals
        let series: Vec<f64> = (0..20).map(|k| k as f64).collect();
        let result = DickeyFullerTest::default().run(&series);
        assert!(!result.stationary);
        assert_eq!(result.t_statistic, None);
    }

    #[test]
    fn test_variance_of_mean_white_noise_limit() {
        // a = 0: formula collapses to σ² / K
        let v = ar1_variance_of_mean(2.0, 0.0, 100).unwrap();
        assert!((v - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_variance_of_mean_guard_near_unit_root() {
        assert_eq!(ar1_variance_of_mean(1.0, 1.0, 100), None);
        assert_eq!(ar1_variance_of_mean(1.0, 1.0 - 1e-9, 100), None);
    }
}
