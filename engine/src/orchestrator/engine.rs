//! Replanner engine - per-iteration control loop
//!
//! # Iteration
//!
//! ```text
//! 1. Check ensemble size against the manager's R
//! 2. Validate + score every agent (ScoreEstimator)
//! 3. Seeded shuffle, stable sort by descending score
//! 4. Policy pass over the ranked candidates (TrustRegionPacker by default)
//! 5. Register the iteration's gap sample with the ParameterManager
//! 6. Emit events to the sink
//! ```
//!
//! Steps 1-4 only read engine state; a failing iteration leaves T, R, the
//! window and the RNG exactly as they were.

use crate::adaptation::{Adaptation, AdaptationAction, AdaptationConfig, GapSample, ParameterManager, TrustRegionState};
use crate::events::EventSink;
use crate::models::{EnsembleError, Event, EventLog, ReplicationEnsemble};
use crate::orchestrator::checkpoint::{compute_config_hash, EngineSnapshot};
use crate::policy::{create_policy, PolicyConfig, ReplannerPolicy, SelectionContext};
use crate::rng::RngManager;
use crate::selection::{ScoreConfig, ScoreEstimator, Selection, Verdict};
use crate::stats::DickeyFullerResult;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Configuration
// ============================================================================

/// Complete engine configuration
///
/// # Example
/// ```
/// use replanner_core_rs::EngineConfig;
///
/// let config = EngineConfig::from_json_str(r#"{
///     "rng_seed": 7,
///     "policy": { "type": "top_share", "share": 0.1 },
///     "adaptation": { "initial_trust_region": 4, "initial_replications": 2 }
/// }"#).unwrap();
///
/// assert_eq!(config.adaptation.initial_trust_region, 4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// RNG seed for tie-breaking and sampling policies
    #[serde(default = "default_seed")]
    pub rng_seed: u64,

    #[serde(default)]
    pub score: ScoreConfig,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub adaptation: AdaptationConfig,

    /// Report `schedule_exhausted` once this many consecutive adaptations
    /// hit the T = 1 floor
    #[serde(default)]
    pub max_impossible_reductions: Option<u32>,
}

fn default_seed() -> u64 {
    4711
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rng_seed: default_seed(),
            score: ScoreConfig::default(),
            policy: PolicyConfig::default(),
            adaptation: AdaptationConfig::default(),
            max_impossible_reductions: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        serde_json::from_str(json)
            .map_err(|e| EngineError::SerializationError(format!("Config parse failed: {}", e)))
    }

    pub fn to_json(&self) -> Result<String, EngineError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| EngineError::SerializationError(format!("Config serialization failed: {}", e)))
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        self.policy.validate().map_err(EngineError::InvalidConfig)?;
        self.adaptation.validate().map_err(EngineError::InvalidConfig)?;
        if self.max_impossible_reductions == Some(0) {
            return Err(EngineError::InvalidConfig(
                "max_impossible_reductions must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Ensemble error: {0}")]
    Ensemble(#[from] EnsembleError),

    #[error("Ensemble has {actual} replications, engine expects R = {expected}")]
    EnsembleSizeMismatch { expected: usize, actual: usize },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Config mismatch: snapshot hash {expected}, config hash {actual}")]
    ConfigMismatch { expected: String, actual: String },

    #[error("Event sink failed: {0}")]
    Sink(String),
}

// ============================================================================
// Results
// ============================================================================

/// Outcome of one outer iteration
#[derive(Debug, Clone, PartialEq)]
pub struct IterationResult {
    pub iteration: usize,
    /// Agents permitted to switch to their candidate plan, in ranked order
    pub accepted: Vec<String>,
    /// Mean population gap over replications
    pub mean_gap: f64,
    /// T used for this iteration's selection
    pub trust_region: u32,
    /// R of the supplied ensemble
    pub replications: usize,
    /// T for the next iteration
    pub next_trust_region: u32,
    /// R the next ensemble must have
    pub next_replications: usize,
    /// Dickey-Fuller result when the window was long enough
    pub stationarity: Option<DickeyFullerResult>,
    pub adaptation: Option<Adaptation>,
    /// Impossible-reduction limit reached
    pub schedule_exhausted: bool,
    pub selection: Selection,
}

// ============================================================================
// Engine
// ============================================================================

/// Adaptive replanner-selection engine
pub struct ReplannerEngine<S: EventSink = EventLog> {
    config: EngineConfig,
    config_hash: String,
    estimator: ScoreEstimator,
    policy: Box<dyn ReplannerPolicy>,
    manager: ParameterManager,
    rng: RngManager,
    iteration: usize,
    sink: S,
}

impl<S: EventSink> ReplannerEngine<S> {
    pub fn new(config: EngineConfig, sink: S) -> Result<Self, EngineError> {
        config.validate()?;
        let config_hash = compute_config_hash(&config)?;
        let manager = ParameterManager::new(config.adaptation.clone()).map_err(EngineError::InvalidConfig)?;

        Ok(Self {
            estimator: ScoreEstimator::new(config.score),
            policy: create_policy(&config.policy),
            rng: RngManager::new(config.rng_seed),
            manager,
            iteration: 0,
            config_hash,
            config,
            sink,
        })
    }

    /// Resume from a snapshot taken with an identical config
    pub fn restore(config: EngineConfig, snapshot: EngineSnapshot, sink: S) -> Result<Self, EngineError> {
        let mut engine = Self::new(config, sink)?;
        if snapshot.config_hash != engine.config_hash {
            return Err(EngineError::ConfigMismatch {
                expected: snapshot.config_hash,
                actual: engine.config_hash,
            });
        }

        engine.manager = ParameterManager::from_snapshot(engine.config.adaptation.clone(), snapshot.manager)
            .map_err(|e| EngineError::SerializationError(format!("Invalid manager snapshot: {}", e)))?;
        engine.rng = RngManager::new(snapshot.rng_state);
        engine.iteration = snapshot.iteration;
        Ok(engine)
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            iteration: self.iteration,
            rng_state: self.rng.get_state(),
            manager: self.manager.snapshot(),
            config_hash: self.config_hash.clone(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn config_hash(&self) -> &str {
        &self.config_hash
    }

    /// Index of the next iteration to run
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Current (T, R)
    pub fn state(&self) -> TrustRegionState {
        self.manager.state()
    }

    pub fn manager(&self) -> &ParameterManager {
        &self.manager
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Impossible-reduction limit reached
    pub fn schedule_exhausted(&self) -> bool {
        self.config
            .max_impossible_reductions
            .is_some_and(|limit| self.manager.impossible_reductions() >= limit)
    }

    /// Run one outer iteration on `ensemble`
    pub fn run_iteration(&mut self, ensemble: &ReplicationEnsemble) -> Result<IterationResult, EngineError> {
        let state = self.manager.state();
        if ensemble.replications() != state.replications {
            return Err(EngineError::EnsembleSizeMismatch {
                expected: state.replications,
                actual: ensemble.replications(),
            });
        }

        let report = self.estimator.estimate(ensemble)?;

        // Work on a copy so a failing policy pass leaves the stream untouched
        let mut rng = self.rng.clone();
        let ranked = ScoreEstimator::rank(report.candidates, &mut rng);
        let ctx = SelectionContext {
            ensemble,
            ranked: &ranked,
            trust_region: state.trust_region,
        };
        let selection = self.policy.select(&ctx, &mut rng)?;
        self.rng = rng;

        let iteration = self.iteration;
        self.iteration += 1;

        let sample = GapSample::new(iteration, report.replication_mean_gaps);
        let mean_gap = sample.mean();
        let outcome = self.manager.register_sample(sample);
        let next = self.manager.state();

        tracing::debug!(
            iteration,
            policy = selection.policy,
            candidates = ranked.len(),
            accepted = selection.count(Verdict::Accepted),
            mean_gap,
            trust_region = next.trust_region,
            replications = next.replications,
            "iteration complete"
        );

        let result = IterationResult {
            iteration,
            accepted: selection.accepted_ids().into_iter().map(str::to_string).collect(),
            mean_gap,
            trust_region: state.trust_region,
            replications: state.replications,
            next_trust_region: next.trust_region,
            next_replications: next.replications,
            stationarity: outcome.test,
            adaptation: outcome.adaptation,
            schedule_exhausted: self.schedule_exhausted(),
            selection,
        };

        if result.schedule_exhausted {
            tracing::info!(
                iteration,
                impossible_reductions = self.manager.impossible_reductions(),
                "trust-region schedule exhausted"
            );
        }

        self.emit_events(&result, outcome.window_len, outcome.min_required)?;
        Ok(result)
    }

    fn emit_events(
        &mut self,
        result: &IterationResult,
        window_len: usize,
        min_required: usize,
    ) -> Result<(), EngineError> {
        let iteration = result.iteration;
        let selection = &result.selection;
        let mut events = vec![Event::SelectionCompleted {
            iteration,
            policy: selection.policy.to_string(),
            candidates: selection.decisions.len(),
            accepted: selection.count(Verdict::Accepted),
            rejected_infeasible: selection.count(Verdict::RejectedInfeasible),
            rejected_negative_gap: selection.count(Verdict::RejectedNegativeGap),
            rejected_by_policy: selection.count(Verdict::RejectedByPolicy),
            accepted_score: selection.accepted_score(),
        }];

        if let Some(test) = &result.stationarity {
            events.push(Event::StationarityChecked {
                iteration,
                window_len,
                min_required,
                t_statistic: test.t_statistic,
                stationary: test.stationary,
            });
        }

        if let Some(adaptation) = &result.adaptation {
            events.push(match adaptation.action {
                AdaptationAction::TrustRegionHalved { from, to } => Event::TrustRegionHalved {
                    iteration,
                    old_trust_region: from,
                    new_trust_region: to,
                    within_variance: adaptation.within_variance,
                    between_variance: adaptation.between_variance,
                },
                AdaptationAction::ReplicationsDoubled { from, to, floor_hit } => Event::ReplicationsDoubled {
                    iteration,
                    old_replications: from,
                    new_replications: to,
                    floor_hit,
                    impossible_reductions: self.manager.impossible_reductions(),
                    within_variance: adaptation.within_variance,
                    between_variance: adaptation.between_variance,
                },
            });
        }

        events.push(Event::IterationRecord {
            iteration,
            mean_gap: result.mean_gap,
            trust_region: result.trust_region,
            replications: result.replications,
            within_variance: result.adaptation.as_ref().map(|a| a.within_variance),
            between_variance: result.adaptation.as_ref().map(|a| a.between_variance),
            t_statistic: result.stationarity.as_ref().and_then(|t| t.t_statistic),
        });

        for event in &events {
            self.sink
                .record(event)
                .map_err(|e| EngineError::Sink(format!("{} at iteration {}: {}", event.event_type(), iteration, e)))?;
        }
        Ok(())
    }
}
