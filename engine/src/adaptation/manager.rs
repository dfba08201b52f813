//! Parameter manager
//!
//! # State machine
//!
//! ```text
//! Accumulating ──(window ≥ min && Dickey-Fuller rejects unit root)──► StationaryDetected
//!      ▲                                                                     │
//!      └──────────────── adapt (T, R), clear window ─────────────────────────┘
//! ```
//!
//! # Adaptation rule
//!
//! - `within`: replication noise in the per-iteration mean (averaged over
//!   the window)
//! - `between`: variance of the per-iteration means
//!
//! | condition          | T > 1       | T == 1                       |
//! |--------------------|-------------|------------------------------|
//! | within < between   | T ← T / 2   | R ← 2R, impossible += 1      |
//! | within ≥ between   | R ← 2R      | R ← 2R                       |
//!
//! # Critical Invariants
//!
//! - T ≥ 1 and never increases
//! - R ≥ 1 and never decreases
//! - The window never holds more than `max_window` samples

use super::sample::GapSample;
use crate::stats::dickey_fuller::MIN_SAMPLE_SIZE;
use crate::stats::{sample_variance, DickeyFullerResult, DickeyFullerTest};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Controller settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptationConfig {
    /// Starting slot-change budget T
    pub initial_trust_region: u32,
    /// Starting replication count R
    pub initial_replications: usize,
    /// Window length required before testing, at R = 2
    ///
    /// Scaled by sqrt(2 / R): more replications mean less noisy samples.
    pub min_evaluated_iterations: usize,
    /// Oldest samples are dropped beyond this length
    pub max_window: usize,
    /// Dickey-Fuller critical value
    pub critical_value: f64,
}

impl Default for AdaptationConfig {
    fn default() -> Self {
        Self {
            initial_trust_region: 16,
            initial_replications: 2,
            min_evaluated_iterations: 10,
            max_window: 50,
            critical_value: DickeyFullerTest::DEFAULT_CRITICAL_VALUE,
        }
    }
}

impl AdaptationConfig {
    /// Window length required before testing at `replications`
    pub fn min_evaluated_iterations_for(&self, replications: usize) -> usize {
        let scale = (2.0 / replications.max(1) as f64).sqrt();
        let scaled = (self.min_evaluated_iterations as f64 * scale).ceil() as usize;
        scaled.max(MIN_SAMPLE_SIZE)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.initial_trust_region < 1 {
            return Err("initial_trust_region must be at least 1".to_string());
        }
        if self.initial_replications < 1 {
            return Err("initial_replications must be at least 1".to_string());
        }
        if !self.critical_value.is_finite() {
            return Err(format!("critical_value must be finite, got {}", self.critical_value));
        }
        let required = self.min_evaluated_iterations_for(self.initial_replications);
        if self.max_window < required {
            return Err(format!(
                "max_window {} is shorter than the {} samples required at R = {}",
                self.max_window, required, self.initial_replications
            ));
        }
        Ok(())
    }
}

/// Current (T, R)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustRegionState {
    pub trust_region: u32,
    pub replications: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagerPhase {
    Accumulating,
    StationaryDetected,
}

/// What changed on detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AdaptationAction {
    TrustRegionHalved { from: u32, to: u32 },
    ReplicationsDoubled { from: usize, to: usize, floor_hit: bool },
}

/// One adaptation step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adaptation {
    pub iteration: usize,
    pub action: AdaptationAction,
    pub within_variance: f64,
    pub between_variance: f64,
    pub t_statistic: Option<f64>,
    /// Window length at detection (before clearing)
    pub window_len: usize,
}

/// Result of registering one sample
#[derive(Debug, Clone, PartialEq)]
pub struct SampleOutcome {
    pub phase: ManagerPhase,
    pub window_len: usize,
    pub min_required: usize,
    /// Present when the window was long enough to test
    pub test: Option<DickeyFullerResult>,
    pub adaptation: Option<Adaptation>,
}

/// Serializable controller state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerSnapshot {
    pub state: TrustRegionState,
    pub impossible_reductions: u32,
    pub window: Vec<GapSample>,
}

/// Owner of (T, R) and the gap window
#[derive(Debug, Clone)]
pub struct ParameterManager {
    config: AdaptationConfig,
    test: DickeyFullerTest,
    state: TrustRegionState,
    window: VecDeque<GapSample>,
    impossible_reductions: u32,
}

impl ParameterManager {
    pub fn new(config: AdaptationConfig) -> Result<Self, String> {
        config.validate()?;
        Ok(Self {
            test: DickeyFullerTest::new(config.critical_value),
            state: TrustRegionState {
                trust_region: config.initial_trust_region,
                replications: config.initial_replications,
            },
            window: VecDeque::with_capacity(config.max_window),
            impossible_reductions: 0,
            config,
        })
    }

    /// Rebuild from a snapshot taken with the same config
    pub fn from_snapshot(config: AdaptationConfig, snapshot: ManagerSnapshot) -> Result<Self, String> {
        let mut manager = Self::new(config)?;
        if snapshot.state.trust_region < 1 || snapshot.state.replications < 1 {
            return Err(format!(
                "snapshot state T = {}, R = {} violates the floor of 1",
                snapshot.state.trust_region, snapshot.state.replications
            ));
        }
        if snapshot.window.len() > manager.config.max_window {
            return Err(format!(
                "snapshot window holds {} samples, max_window is {}",
                snapshot.window.len(),
                manager.config.max_window
            ));
        }
        manager.state = snapshot.state;
        manager.impossible_reductions = snapshot.impossible_reductions;
        manager.window = snapshot.window.into();
        Ok(manager)
    }

    pub fn snapshot(&self) -> ManagerSnapshot {
        ManagerSnapshot {
            state: self.state,
            impossible_reductions: self.impossible_reductions,
            window: self.window.iter().cloned().collect(),
        }
    }

    pub fn config(&self) -> &AdaptationConfig {
        &self.config
    }

    pub fn state(&self) -> TrustRegionState {
        self.state
    }

    pub fn trust_region(&self) -> u32 {
        self.state.trust_region
    }

    pub fn replications(&self) -> usize {
        self.state.replications
    }

    /// Consecutive detections at T == 1 since T last shrank
    pub fn impossible_reductions(&self) -> u32 {
        self.impossible_reductions
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    pub fn window(&self) -> impl Iterator<Item = &GapSample> {
        self.window.iter()
    }

    /// Samples required before testing at the current R
    pub fn min_evaluated_iterations(&self) -> usize {
        self.config
            .min_evaluated_iterations_for(self.state.replications)
    }

    /// Append a sample, test, and adapt if stationary
    pub fn register_sample(&mut self, sample: GapSample) -> SampleOutcome {
        let iteration = sample.iteration;
        if self.window.len() >= self.config.max_window {
            self.window.pop_front();
        }
        self.window.push_back(sample);

        let window_len = self.window.len();
        let min_required = self.min_evaluated_iterations();
        if window_len < min_required {
            return SampleOutcome {
                phase: ManagerPhase::Accumulating,
                window_len,
                min_required,
                test: None,
                adaptation: None,
            };
        }

        let means: Vec<f64> = self.window.iter().map(GapSample::mean).collect();
        let result = self.test.run(&means);
        if !result.stationary {
            return SampleOutcome {
                phase: ManagerPhase::Accumulating,
                window_len,
                min_required,
                test: Some(result),
                adaptation: None,
            };
        }

        let within = self.within_variance();
        let between = sample_variance(&means).unwrap_or(0.0);
        let action = self.adapt(within, between);
        self.window.clear();

        tracing::info!(
            iteration,
            ?action,
            within,
            between,
            trust_region = self.state.trust_region,
            replications = self.state.replications,
            "gap series stationary, parameters adapted"
        );

        SampleOutcome {
            phase: ManagerPhase::StationaryDetected,
            window_len,
            min_required,
            adaptation: Some(Adaptation {
                iteration,
                action,
                within_variance: within,
                between_variance: between,
                t_statistic: result.t_statistic,
                window_len,
            }),
            test: Some(result),
        }
    }

    /// Mean replication noise over the window
    fn within_variance(&self) -> f64 {
        let n = self.window.len();
        if n == 0 {
            return f64::INFINITY;
        }
        self.window
            .iter()
            .map(GapSample::within_variance_of_mean)
            .sum::<f64>()
            / n as f64
    }

    fn adapt(&mut self, within: f64, between: f64) -> AdaptationAction {
        if within < between {
            if self.state.trust_region > 1 {
                let from = self.state.trust_region;
                self.state.trust_region = (from / 2).max(1);
                self.impossible_reductions = 0;
                AdaptationAction::TrustRegionHalved {
                    from,
                    to: self.state.trust_region,
                }
            } else {
                self.impossible_reductions = self.impossible_reductions.saturating_add(1);
                self.double_replications(true)
            }
        } else {
            self.double_replications(false)
        }
    }

    fn double_replications(&mut self, floor_hit: bool) -> AdaptationAction {
        let from = self.state.replications;
        self.state.replications = from.saturating_mul(2);
        AdaptationAction::ReplicationsDoubled {
            from,
            to: self.state.replications,
            floor_hit,
        }
    }
}
