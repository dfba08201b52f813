//! Top-share replanning
//!
//! The best `ceil(share · N)` ranked candidates replan.

use super::{ReplannerPolicy, SelectionContext};
use crate::models::EnsembleError;
use crate::rng::RngManager;
use crate::selection::{ReplanDecision, Selection, Verdict};

pub struct TopSharePolicy {
    share: f64,
    admit_negative_gaps: bool,
}

impl TopSharePolicy {
    pub fn new(share: f64, admit_negative_gaps: bool) -> Self {
        Self {
            share,
            admit_negative_gaps,
        }
    }

    /// Number of candidates allowed to replan out of `n`
    pub fn quota(&self, n: usize) -> usize {
        ((self.share * n as f64).ceil() as usize).min(n)
    }
}

impl ReplannerPolicy for TopSharePolicy {
    fn name(&self) -> &'static str {
        "top_share"
    }

    fn select(
        &mut self,
        ctx: &SelectionContext<'_>,
        _rng: &mut RngManager,
    ) -> Result<Selection, EnsembleError> {
        let quota = self.quota(ctx.ranked.len());
        let mut accepted = 0;

        let decisions = ctx
            .ranked
            .iter()
            .map(|c| {
                let verdict = if !self.admit_negative_gaps && c.decision_score < 0.0 {
                    Verdict::RejectedNegativeGap
                } else if accepted < quota {
                    accepted += 1;
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
