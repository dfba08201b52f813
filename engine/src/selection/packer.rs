//! Trust-region packer
//!
//! Greedy, resource-constrained selection of replanning agents.
//!
//! # Algorithm
//!
//! Candidates arrive ranked by descending decision score. For each one, in
//! order, and for each replication `r` it is evaluated on:
//!
//! ```text
//! candidate_max_r = max(max_change_r, max over touched slots (1 + change_r[slot]))
//! anticipated     = aggregate_r(candidate_max_r)        (mean or worst case)
//! accept          ⇔ anticipated ≤ T
//! ```
//!
//! Acceptance commits the candidate's touched slots to the ledger before
//! the next candidate is examined. Rejection leaves the ledger untouched.
//!
//! # Sequential by construction
//!
//! Every feasibility check reads counters written by earlier acceptances,
//! so the pass cannot be split across threads. The ledger is a local value
//! of [`TrustRegionPacker::pack`] and is only handed out once the pass is
//! complete.
//!
//! # Guarantees
//!
//! - [`ReplicationAggregate::Worst`]: every slot's committed change, in
//!   every replication, is at most T.
//! - [`ReplicationAggregate::Mean`]: every accepted candidate's anticipated
//!   change is at most T. With a single replication this is the per-slot
//!   bound above.

use super::ledger::SlotLedger;
use super::score::CandidateScore;
use super::{ReplanDecision, Verdict};
use crate::models::{footprint, AgentObservations, EnsembleError, Slot};
use serde::{Deserialize, Serialize};

/// How per-replication hypothetical maxima are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplicationAggregate {
    /// Average over replications
    #[default]
    Mean,
    /// Largest value over replications
    Worst,
}

/// Packer options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PackerConfig {
    /// Slots an agent leaves also consume trust-region budget
    #[serde(default)]
    pub count_vacated_slots: bool,
    /// Candidates with a negative decision score may still be accepted
    #[serde(default)]
    pub admit_negative_gaps: bool,
    #[serde(default)]
    pub aggregation: ReplicationAggregate,
}

/// One candidate as the packer sees it
#[derive(Debug, Clone, PartialEq)]
pub struct PackingCandidate {
    pub agent_id: String,
    pub score: f64,
    /// `(replication, changed slots)` for every replication considered
    pub footprints: Vec<(usize, Vec<Slot>)>,
}

impl PackingCandidate {
    pub fn new(agent_id: impl Into<String>, score: f64) -> Self {
        Self {
            agent_id: agent_id.into(),
            score,
            footprints: Vec::new(),
        }
    }

    /// Builder: changed slots in replication `r`
    pub fn with_footprint(mut self, r: usize, slots: Vec<Slot>) -> Self {
        self.footprints.push((r, slots));
        self
    }

    /// Build from a scored agent and its observations
    pub fn from_observations(
        scored: &CandidateScore,
        agent: &AgentObservations,
        count_vacated: bool,
    ) -> Result<Self, EnsembleError> {
        let footprints = scored
            .eligible_replications
            .iter()
            .map(|&r| {
                let obs = agent.require(r)?;
                Ok((r, footprint(&obs.current_slots, &obs.candidate_slots, count_vacated)))
            })
            .collect::<Result<Vec<_>, EnsembleError>>()?;

        Ok(Self {
            agent_id: scored.agent_id.clone(),
            score: scored.decision_score,
            footprints,
        })
    }

    /// Touches no slot in any replication considered
    pub fn is_inert(&self) -> bool {
        self.footprints.iter().all(|(_, slots)| slots.is_empty())
    }
}

/// Decisions of one pass plus the final ledger
#[derive(Debug, Clone, PartialEq)]
pub struct PackingOutcome {
    pub decisions: Vec<ReplanDecision>,
    pub ledger: SlotLedger,
}

/// Greedy trust-region selection
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustRegionPacker {
    config: PackerConfig,
}

impl TrustRegionPacker {
    pub fn new(config: PackerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> PackerConfig {
        self.config
    }

    /// Run one sequential pass over `candidates` (already ranked)
    ///
    /// `replications` sizes the ledger; every footprint must reference a
    /// replication below it.
    pub fn pack(
        &self,
        candidates: &[PackingCandidate],
        trust_region: u32,
        replications: usize,
    ) -> Result<PackingOutcome, EnsembleError> {
        for candidate in candidates {
            if let Some(&(r, _)) = candidate.footprints.iter().find(|(r, _)| *r >= replications) {
                return Err(EnsembleError::ReplicationOutOfRange {
                    agent_id: candidate.agent_id.clone(),
                    replication: r,
                    replications,
                });
            }
        }

        let mut ledger = SlotLedger::new(replications);
        let mut decisions = Vec::with_capacity(candidates.len());
        let bound = f64::from(trust_region);

        for candidate in candidates {
            if !self.config.admit_negative_gaps && candidate.score < 0.0 {
                decisions.push(decision(candidate, Verdict::RejectedNegativeGap, None));
                continue;
            }

            if candidate.is_inert() {
                decisions.push(decision(candidate, Verdict::Accepted, None));
                continue;
            }

            let anticipated = self.anticipated_change(&ledger, candidate);
            if anticipated <= bound {
                for (r, slots) in &candidate.footprints {
                    ledger.commit(*r, slots);
                }
                decisions.push(decision(candidate, Verdict::Accepted, Some(anticipated)));
            } else {
                decisions.push(decision(candidate, Verdict::RejectedInfeasible, Some(anticipated)));
            }
        }

        Ok(PackingOutcome { decisions, ledger })
    }

    /// Aggregated hypothetical max change if `candidate` were committed
    ///
    /// `0.0` for a candidate without footprints.
    pub fn anticipated_change(&self, ledger: &SlotLedger, candidate: &PackingCandidate) -> f64 {
        if candidate.footprints.is_empty() {
            return 0.0;
        }
        let maxima = candidate
            .footprints
            .iter()
            .map(|(r, slots)| f64::from(ledger.candidate_max(*r, slots)));

        match self.config.aggregation {
            ReplicationAggregate::Mean => maxima.sum::<f64>() / candidate.footprints.len() as f64,
            ReplicationAggregate::Worst => maxima.fold(0.0, f64::max),
        }
    }
}

fn decision(candidate: &PackingCandidate, verdict: Verdict, anticipated: Option<f64>) -> ReplanDecision {
    ReplanDecision {
        agent_id: candidate.agent_id.clone(),
        score: candidate.score,
        verdict,
        anticipated_change: anticipated,
    }
}
