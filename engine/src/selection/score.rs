//! Decision scores for replanning candidates
//!
//! For agent `n` and replication `r`:
//!
//! ```text
//! gap_r(n) = score(candidate plan, r) - score(current plan, r)
//! ```
//!
//! The decision score averages `gap_r` over the replications that did
//! *not* generate the candidate plan. A plan computed against one network
//! state tends to look good on exactly that state; leaving it out keeps
//! the estimate honest.
//!
//! Scoring is read-only over the ensemble. With the `parallel` feature the
//! per-agent work runs on the rayon pool; results are identical.

use crate::models::{AgentObservations, EnsembleError, ReplicationEnsemble};
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Scoring options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreConfig {
    /// Leave the generating replication out of the decision score
    pub self_exclusion: bool,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            self_exclusion: true,
        }
    }
}

/// One agent's decision score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    /// Position of the agent in the ensemble
    pub agent_index: usize,
    pub agent_id: String,
    /// Mean gap over `eligible_replications`
    pub decision_score: f64,
    /// Replications the decision is evaluated on (sorted)
    pub eligible_replications: Vec<usize>,
}

/// Scores of all agents plus the population gap per replication
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreReport {
    /// In ensemble order
    pub candidates: Vec<CandidateScore>,
    /// Mean of `gap_r` over all agents, one entry per replication
    pub replication_mean_gaps: Vec<f64>,
}

/// Computes and ranks decision scores
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreEstimator {
    config: ScoreConfig,
}

impl ScoreEstimator {
    pub fn new(config: ScoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> ScoreConfig {
        self.config
    }

    /// Replications an agent's decision is evaluated on
    ///
    /// With self-exclusion the generating replication is dropped, unless it
    /// is the only one.
    pub fn eligible_replications(&self, generating: Option<usize>, replications: usize) -> Vec<usize> {
        match generating {
            Some(g) if self.config.self_exclusion && replications > 1 => {
                (0..replications).filter(|&r| r != g).collect()
            }
            _ => (0..replications).collect(),
        }
    }

    /// Score a single agent
    pub fn score_agent(
        &self,
        agent_index: usize,
        agent: &AgentObservations,
        replications: usize,
    ) -> Result<CandidateScore, EnsembleError> {
        let eligible = self.eligible_replications(agent.generating_replication(), replications);

        let mut total = 0.0;
        for &r in &eligible {
            total += agent.require(r)?.gap();
        }

        Ok(CandidateScore {
            agent_index,
            agent_id: agent.id().to_string(),
            decision_score: total / eligible.len() as f64,
            eligible_replications: eligible,
        })
    }

    /// Validate the ensemble and score every agent
    pub fn estimate(&self, ensemble: &ReplicationEnsemble) -> Result<ScoreReport, EnsembleError> {
        ensemble.validate()?;
        let replications = ensemble.replications();

        #[cfg(feature = "parallel")]
        let candidates = ensemble
            .agents()
            .par_iter()
            .enumerate()
            .map(|(i, agent)| self.score_agent(i, agent, replications))
            .collect::<Result<Vec<_>, _>>()?;

        #[cfg(not(feature = "parallel"))]
        let candidates = ensemble
            .agents()
            .iter()
            .enumerate()
            .map(|(i, agent)| self.score_agent(i, agent, replications))
            .collect::<Result<Vec<_>, _>>()?;

        let replication_mean_gaps = population_mean_gaps(ensemble)?;

        Ok(ScoreReport {
            candidates,
            replication_mean_gaps,
        })
    }

    /// Seeded shuffle, then stable sort by descending decision score
    ///
    /// Equal scores end up in shuffled order instead of ensemble order, so
    /// ties do not systematically favour agents listed first.
    pub fn rank(mut candidates: Vec<CandidateScore>, rng: &mut RngManager) -> Vec<CandidateScore> {
        rng.shuffle(&mut candidates);
        candidates.sort_by(|a, b| b.decision_score.total_cmp(&a.decision_score));
        candidates
    }
}

/// Mean gap over all agents per replication; zeros for an empty population
fn population_mean_gaps(ensemble: &ReplicationEnsemble) -> Result<Vec<f64>, EnsembleError> {
    let replications = ensemble.replications();
    let mut sums = vec![0.0; replications];
    for agent in ensemble.agents() {
        for (r, sum) in sums.iter_mut().enumerate() {
            *sum += agent.require(r)?.gap();
        }
    }

    let n = ensemble.num_agents();
    if n == 0 {
        return Ok(sums);
    }
    Ok(sums.into_iter().map(|s| s / n as f64).collect())
}
