//! Replanner Policy Module
//!
//! A replanner policy decides which ranked candidates switch to their
//! candidate plan this iteration. All policies implement
//! [`ReplannerPolicy`] and are built from a [`PolicyConfig`]:
//!
//! 1. **TrustRegion**: greedy packing bounded by the slot-change budget T
//! 2. **Uniform**: every candidate replans with a fixed probability
//! 3. **TopShare**: the best-ranked fraction of candidates replans
//!
//! ```rust
//! use replanner_core_rs::policy::{create_policy, PolicyConfig};
//!
//! let config: PolicyConfig = serde_json::from_str(
//!     r#"{ "type": "uniform", "replanning_rate": 0.1 }"#,
//! ).unwrap();
//! let policy = create_policy(&config);
//! assert_eq!(policy.name(), "uniform");
//! ```

mod top_share;
mod trust_region;
mod uniform;

pub use top_share::TopSharePolicy;
pub use trust_region::TrustRegionPolicy;
pub use uniform::UniformPolicy;

use crate::models::{EnsembleError, ReplicationEnsemble};
use crate::rng::RngManager;
use crate::selection::{CandidateScore, PackerConfig, ReplicationAggregate, Selection};
use serde::{Deserialize, Serialize};

/// Everything a policy may look at for one iteration
#[derive(Debug, Clone, Copy)]
pub struct SelectionContext<'a> {
    pub ensemble: &'a ReplicationEnsemble,
    /// Candidates in processing order (descending score)
    pub ranked: &'a [CandidateScore],
    /// Current slot-change budget
    pub trust_region: u32,
}

/// Per-iteration replanner selection
pub trait ReplannerPolicy: Send {
    /// Short identifier used in events
    fn name(&self) -> &'static str;

    /// Decide for every ranked candidate
    ///
    /// Decisions are returned in `ctx.ranked` order.
    fn select(
        &mut self,
        ctx: &SelectionContext<'_>,
        rng: &mut RngManager,
    ) -> Result<Selection, EnsembleError>;
}

/// Policy selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PolicyConfig {
    /// Greedy trust-region packing
    TrustRegion {
        #[serde(default)]
        count_vacated_slots: bool,
        #[serde(default)]
        admit_negative_gaps: bool,
        #[serde(default)]
        aggregation: ReplicationAggregate,
    },

    /// Independent Bernoulli draw per candidate
    Uniform {
        /// Probability in `[0, 1]`
        replanning_rate: f64,
        #[serde(default)]
        admit_negative_gaps: bool,
    },

    /// Best `ceil(share · N)` candidates
    TopShare {
        /// Fraction in `[0, 1]`
        share: f64,
        #[serde(default)]
        admit_negative_gaps: bool,
    },
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig::TrustRegion {
            count_vacated_slots: false,
            admit_negative_gaps: false,
            aggregation: ReplicationAggregate::Mean,
        }
    }
}

impl PolicyConfig {
    /// Check parameter ranges
    pub fn validate(&self) -> Result<(), String> {
        match self {
            PolicyConfig::TrustRegion { .. } => Ok(()),
            PolicyConfig::Uniform {
                replanning_rate, ..
            } => check_unit_interval("replanning_rate", *replanning_rate),
            PolicyConfig::TopShare { share, .. } => check_unit_interval("share", *share),
        }
    }
}

fn check_unit_interval(name: &str, value: f64) -> Result<(), String> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(format!("{} must be within [0, 1], got {}", name, value))
    }
}

/// Build the policy described by `config`
pub fn create_policy(config: &PolicyConfig) -> Box<dyn ReplannerPolicy> {
    match config {
        PolicyConfig::TrustRegion {
            count_vacated_slots,
            admit_negative_gaps,
            aggregation,
        } => Box::new(TrustRegionPolicy::new(PackerConfig {
            count_vacated_slots: *count_vacated_slots,
            admit_negative_gaps: *admit_negative_gaps,
            aggregation: *aggregation,
        })),
        PolicyConfig::Uniform {
            replanning_rate,
            admit_negative_gaps,
        } => Box::new(UniformPolicy::new(*replanning_rate, *admit_negative_gaps)),
        PolicyConfig::TopShare {
            share,
            admit_negative_gaps,
        } => Box::new(TopSharePolicy::new(*share, *admit_negative_gaps)),
    }
}
