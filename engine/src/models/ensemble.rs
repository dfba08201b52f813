//! Per-iteration input: agents observed across a replication ensemble
//!
//! The collaborator (mobility simulation + plan generation) fills one
//! [`ReplicationEnsemble`] per outer iteration. Every agent must carry a
//! complete observation for every replication; [`ReplicationEnsemble::validate`]
//! enforces this before any selection work starts.
//!
//! # Critical Invariants
//!
//! - **Completeness**: no agent may miss a replication the engine consults
//! - **Finite scores**: NaN or infinite plan scores are rejected
//! - **Unique identities**: one entry per agent id

use crate::models::slot::Slot;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Contract violations in the supplied iteration data
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EnsembleError {
    #[error("Ensemble must contain at least one replication")]
    NoReplications,

    #[error("Agent {agent_id} has no observation for replication {replication}")]
    MissingReplication { agent_id: String, replication: usize },

    #[error("Agent {agent_id} has {actual} replication entries, ensemble has {expected}")]
    ReplicationCountMismatch {
        agent_id: String,
        expected: usize,
        actual: usize,
    },

    #[error("Agent {agent_id} has a non-finite score in replication {replication}")]
    NonFiniteScore { agent_id: String, replication: usize },

    #[error("Agent {agent_id} names generating replication {replication}, ensemble has {replications}")]
    InvalidGeneratingReplication {
        agent_id: String,
        replication: usize,
        replications: usize,
    },

    #[error("Duplicate agent id: {0}")]
    DuplicateAgent(String),

    #[error("Candidate {0} does not match any agent in the ensemble")]
    UnknownAgent(String),

    #[error("Agent {agent_id} references replication {replication}, only {replications} considered")]
    ReplicationOutOfRange {
        agent_id: String,
        replication: usize,
        replications: usize,
    },
}

/// What one replication says about one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationObservation {
    /// Score of the plan the agent currently executes
    pub current_score: f64,
    /// Score of the hypothetical (candidate) plan
    pub candidate_score: f64,
    /// Slots touched by the current plan; empty for newly active agents
    pub current_slots: Vec<Slot>,
    /// Slots touched by the candidate plan
    pub candidate_slots: Vec<Slot>,
}

impl ReplicationObservation {
    /// Gap of switching: candidate minus current. Positive is improvement.
    pub fn gap(&self) -> f64 {
        self.candidate_score - self.current_score
    }
}

/// One agent's data across all replications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentObservations {
    id: String,
    generating_replication: Option<usize>,
    replications: Vec<Option<ReplicationObservation>>,
}

impl AgentObservations {
    /// Create an agent with `replications` empty observation slots
    pub fn new(id: impl Into<String>, replications: usize) -> Self {
        Self {
            id: id.into(),
            generating_replication: None,
            replications: vec![None; replications],
        }
    }

    /// Builder: mark the replication the candidate plan was computed against
    pub fn with_generating_replication(mut self, replication: usize) -> Self {
        self.generating_replication = Some(replication);
        self
    }

    /// Builder: store the observation for replication `r`
    ///
    /// Entries beyond the current length extend the vector; validation later
    /// reports the length mismatch.
    pub fn with_observation(mut self, r: usize, observation: ReplicationObservation) -> Self {
        self.set_observation(r, observation);
        self
    }

    pub fn set_observation(&mut self, r: usize, observation: ReplicationObservation) {
        if r >= self.replications.len() {
            self.replications.resize(r + 1, None);
        }
        self.replications[r] = Some(observation);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn generating_replication(&self) -> Option<usize> {
        self.generating_replication
    }

    /// Observation for replication `r`, if present
    pub fn observation(&self, r: usize) -> Option<&ReplicationObservation> {
        self.replications.get(r).and_then(|o| o.as_ref())
    }

    /// Observation for replication `r` or a contract-violation error
    pub fn require(&self, r: usize) -> Result<&ReplicationObservation, EnsembleError> {
        self.observation(r)
            .ok_or_else(|| EnsembleError::MissingReplication {
                agent_id: self.id.clone(),
                replication: r,
            })
    }

    pub fn replication_slots(&self) -> usize {
        self.replications.len()
    }
}

/// R network-state realizations and the agents observed on them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationEnsemble {
    replications: usize,
    agents: Vec<AgentObservations>,
}

impl ReplicationEnsemble {
    pub fn new(replications: usize) -> Self {
        Self {
            replications,
            agents: Vec::new(),
        }
    }

    pub fn with_agents(replications: usize, agents: Vec<AgentObservations>) -> Self {
        Self {
            replications,
            agents,
        }
    }

    pub fn add_agent(&mut self, agent: AgentObservations) {
        self.agents.push(agent);
    }

    pub fn replications(&self) -> usize {
        self.replications
    }

    pub fn agents(&self) -> &[AgentObservations] {
        &self.agents
    }

    pub fn num_agents(&self) -> usize {
        self.agents.len()
    }

    /// Check every invariant listed in the module docs
    pub fn validate(&self) -> Result<(), EnsembleError> {
        if self.replications == 0 {
            return Err(EnsembleError::NoReplications);
        }

        let mut seen = HashSet::with_capacity(self.agents.len());
        for agent in &self.agents {
            if !seen.insert(agent.id()) {
                return Err(EnsembleError::DuplicateAgent(agent.id().to_string()));
            }

            if agent.replication_slots() != self.replications {
                return Err(EnsembleError::ReplicationCountMismatch {
                    agent_id: agent.id().to_string(),
                    expected: self.replications,
                    actual: agent.replication_slots(),
                });
            }

            if let Some(generating) = agent.generating_replication() {
                if generating >= self.replications {
                    return Err(EnsembleError::InvalidGeneratingReplication {
                        agent_id: agent.id().to_string(),
                        replication: generating,
                        replications: self.replications,
                    });
                }
            }

            for r in 0..self.replications {
                let obs = agent.require(r)?;
                if !obs.current_score.is_finite() || !obs.candidate_score.is_finite() {
                    return Err(EnsembleError::NonFiniteScore {
                        agent_id: agent.id().to_string(),
                        replication: r,
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(current: f64, candidate: f64) -> ReplicationObservation {
        ReplicationObservation {
            current_score: current,
            candidate_score: candidate,
            current_slots: vec![],
            candidate_slots: vec![Slot::new("l1", 0)],
        }
    }

    #[test]
    fn test_complete_ensemble_validates() {
        let agent = AgentObservations::new("a1", 2)
            .with_observation(0, obs(1.0, 2.0))
            .with_observation(1, obs(1.0, 3.0));
        let ensemble = ReplicationEnsemble::with_agents(2, vec![agent]);

        assert!(ensemble.validate().is_ok());
    }

    #[test]
    fn test_missing_replication_rejected() {
        let agent = AgentObservations::new("a1", 2).with_observation(0, obs(1.0, 2.0));
        let ensemble = ReplicationEnsemble::with_agents(2, vec![agent]);

        assert_eq!(
            ensemble.validate(),
            Err(EnsembleError::MissingReplication {
                agent_id: "a1".to_string(),
                replication: 1,
            })
        );
    }

    #[test]
    fn test_nan_score_rejected() {
        let agent = AgentObservations::new("a1", 1).with_observation(0, obs(f64::NAN, 2.0));
        let ensemble = ReplicationEnsemble::with_agents(1, vec![agent]);

        assert!(matches!(
            ensemble.validate(),
            Err(EnsembleError::NonFiniteScore { .. })
        ));
    }

    #[test]
    fn test_duplicate_agent_rejected() {
        let a = AgentObservations::new("a1", 1).with_observation(0, obs(0.0, 1.0));
        let ensemble = ReplicationEnsemble::with_agents(1, vec![a.clone(), a]);

        assert_eq!(
            ensemble.validate(),
            Err(EnsembleError::DuplicateAgent("a1".to_string()))
        );
    }

    #[test]
    fn test_generating_replication_out_of_range() {
        let agent = AgentObservations::new("a1", 1)
            .with_observation(0, obs(0.0, 1.0))
            .with_generating_replication(3);
        let ensemble = ReplicationEnsemble::with_agents(1, vec![agent]);

        assert!(matches!(
            ensemble.validate(),
            Err(EnsembleError::InvalidGeneratingReplication { replication: 3, .. })
        ));
    }

    #[test]
    fn test_zero_replications_rejected() {
        let ensemble = ReplicationEnsemble::new(0);
        assert_eq!(ensemble.validate(), Err(EnsembleError::NoReplications));
    }
}
