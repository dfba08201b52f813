//! Realized-gap samples

use crate::stats::sample_variance;
use serde::{Deserialize, Serialize};

/// Population mean gap of every replication for one iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapSample {
    pub iteration: usize,
    pub replication_gaps: Vec<f64>,
}

impl GapSample {
    pub fn new(iteration: usize, replication_gaps: Vec<f64>) -> Self {
        Self {
            iteration,
            replication_gaps,
        }
    }

    /// Same value observed on `replications` replications (no sampling noise)
    pub fn uniform(iteration: usize, value: f64, replications: usize) -> Self {
        Self::new(iteration, vec![value; replications.max(1)])
    }

    /// Iteration mean gap; 0 for an empty sample
    pub fn mean(&self) -> f64 {
        crate::stats::mean(&self.replication_gaps).unwrap_or(0.0)
    }

    /// Variance of the iteration mean due to replication noise
    ///
    /// Sample variance across replications divided by their count.
    /// Infinite with fewer than two replications: the noise level cannot
    /// be judged.
    pub fn within_variance_of_mean(&self) -> f64 {
        match sample_variance(&self.replication_gaps) {
            Some(v) => v / self.replication_gaps.len() as f64,
            None => f64::INFINITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_within_variance() {
        let sample = GapSample::new(3, vec![1.0, 3.0]);
        assert_eq!(sample.mean(), 2.0);
        // sample variance 2.0, over 2 replications
        assert_eq!(sample.within_variance_of_mean(), 1.0);
    }

    #[test]
    fn test_uniform_sample_has_zero_within_variance() {
        let sample = GapSample::uniform(0, 10.0, 4);
        assert_eq!(sample.replication_gaps.len(), 4);
        assert_eq!(sample.within_variance_of_mean(), 0.0);
    }

    #[test]
    fn test_single_replication_within_variance_unknown() {
        assert!(GapSample::new(0, vec![1.0]).within_variance_of_mean().is_infinite());
        assert_eq!(GapSample::new(0, vec![]).mean(), 0.0);
    }
}
