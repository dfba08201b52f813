//! Uniform replanning
//!
//! Each candidate replans with probability `replanning_rate`, regardless
//! of slot usage. Baseline for comparing against trust-region packing.

use super::{ReplannerPolicy, SelectionContext};
use crate::models::EnsembleError;
use crate::rng::RngManager;
use crate::selection::{ReplanDecision, Selection, Verdict};

pub struct UniformPolicy {
    replanning_rate: f64,
    admit_negative_gaps: bool,
}

impl UniformPolicy {
    pub fn new(replanning_rate: f64, admit_negative_gaps: bool) -> Self {
        Self {
            replanning_rate,
            admit_negative_gaps,
        }
    }
}

impl ReplannerPolicy for UniformPolicy {
    fn name(&self) -> &'static str {
        "uniform"
    }

    fn select(
        &mut self,
        ctx: &SelectionContext<'_>,
        rng: &mut RngManager,
    ) -> Result<Selection, EnsembleError> {
        let decisions = ctx
            .ranked
            .iter()
            .map(|c| {
                // Draw for every candidate so the stream does not depend on scores
                let drawn = rng.chance(self.replanning_rate);
                let verdict = if !self.admit_negative_gaps && c.decision_score < 0.0 {
                    Verdict::RejectedNegativeGap
                } else if drawn {
                    Verdict::Accepted
                } else {
                    Verdict::RejectedByPolicy
                };
                ReplanDecision {
                    agent_id: c.agent_id.clone(),
                    score: c.decision_score,
                    verdict,
                    anticipated_change: None,
                }
            })
            .collect();

        Ok(Selection::new(self.name(), decisions))
    }
}
