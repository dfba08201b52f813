//! Replanner selection: scoring, slot bookkeeping and trust-region packing
//!
//! # Pipeline
//!
//! ```text
//! ReplicationEnsemble
//!     → ScoreEstimator::estimate     (gap per agent, self-excluding mean)
//!     → ScoreEstimator::rank         (seeded shuffle, stable sort by score)
//!     → TrustRegionPacker::pack      (greedy, one candidate at a time)
//!     → Selection                    (accepted agent ids)
//! ```
//!
//! The packer owns its [`SlotLedger`] for exactly one sequential pass.
//! Nothing else holds a reference to it while candidates are being
//! committed; callers only get it back, read-only, in the outcome.

pub mod ledger;
pub mod packer;
pub mod score;

pub use ledger::SlotLedger;
pub use packer::{PackerConfig, PackingCandidate, PackingOutcome, ReplicationAggregate, TrustRegionPacker};
pub use score::{CandidateScore, ScoreConfig, ScoreEstimator, ScoreReport};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Why a candidate did or did not get to replan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Agent switches to its candidate plan
    Accepted,
    /// Switching would push a slot's change beyond the trust region
    RejectedInfeasible,
    /// Decision score below zero and negative gaps are not admitted
    RejectedNegativeGap,
    /// Policy-specific limit (sampling draw, quota)
    RejectedByPolicy,
}

/// Decision for one candidate, in processing order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplanDecision {
    pub agent_id: String,
    /// Decision score used for ranking
    pub score: f64,
    pub verdict: Verdict,
    /// Aggregated hypothetical max slot change; `None` if not evaluated or
    /// the candidate touches no slot
    pub anticipated_change: Option<f64>,
}

/// Result of one policy pass
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub policy: &'static str,
    pub decisions: Vec<ReplanDecision>,
    /// Final slot ledger, for policies that maintain one
    pub ledger: Option<SlotLedger>,
}

impl Selection {
    pub fn new(policy: &'static str, decisions: Vec<ReplanDecision>) -> Self {
        Self {
            policy,
            decisions,
            ledger: None,
        }
    }

    /// Accepted agent ids in processing order
    pub fn accepted_ids(&self) -> Vec<&str> {
        self.decisions
            .iter()
            .filter(|d| d.verdict == Verdict::Accepted)
            .map(|d| d.agent_id.as_str())
            .collect()
    }

    /// Accepted agent ids as a sorted set
    pub fn accepted_set(&self) -> BTreeSet<String> {
        self.accepted_ids().into_iter().map(str::to_string).collect()
    }

    pub fn count(&self, verdict: Verdict) -> usize {
        self.decisions.iter().filter(|d| d.verdict == verdict).count()
    }

    /// Sum of decision scores over accepted agents
    pub fn accepted_score(&self) -> f64 {
        self.decisions
            .iter()
            .filter(|d| d.verdict == Verdict::Accepted)
            .map(|d| d.score)
            .sum()
    }
}
