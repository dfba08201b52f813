//! Structured events emitted by the engine.
//!
//! Every significant decision of an iteration is captured as an [`Event`]:
//! - **Selection**: how many candidates the policy saw and accepted
//! - **Stationarity**: each Dickey-Fuller check on the gap window
//! - **Adaptation**: trust-region halvings and replication doublings
//! - **Record**: one summary row per iteration
//!
//! Events are handed to an injected [`EventSink`](crate::events::EventSink);
//! the engine itself never writes files.
//!
//! # Example
//!
//! ```rust
//! use replanner_core_rs::models::{Event, EventLog};
//!
//! let mut log = EventLog::new();
//! log.log(Event::IterationRecord {
//!     iteration: 3,
//!     mean_gap: 0.42,
//!     trust_region: 8,
//!     replications: 2,
//!     within_variance: None,
//!     between_variance: None,
//!     t_statistic: None,
//! });
//!
//! assert_eq!(log.events_at_iteration(3).len(), 1);
//! ```

use serde::{Deserialize, Serialize};

/// Engine event capturing one decision or summary.
///
/// All events carry the outer iteration index for ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Replanner policy finished its pass over the ranked candidates
    SelectionCompleted {
        iteration: usize,
        policy: String,
        candidates: usize,
        accepted: usize,
        rejected_infeasible: usize,
        rejected_negative_gap: usize,
        rejected_by_policy: usize,
        /// Sum of decision scores of accepted agents
        accepted_score: f64,
    },

    /// Dickey-Fuller test ran on the gap window
    StationarityChecked {
        iteration: usize,
        window_len: usize,
        min_required: usize,
        t_statistic: Option<f64>,
        stationary: bool,
    },

    /// Stationary regime with between-iteration variance dominating
    TrustRegionHalved {
        iteration: usize,
        old_trust_region: u32,
        new_trust_region: u32,
        within_variance: f64,
        between_variance: f64,
    },

    /// Sampling noise dominates, or the trust region is already at its floor
    ReplicationsDoubled {
        iteration: usize,
        old_replications: usize,
        new_replications: usize,
        /// The doubling replaces an impossible trust-region reduction
        floor_hit: bool,
        impossible_reductions: u32,
        within_variance: f64,
        between_variance: f64,
    },

    /// Per-iteration summary row
    IterationRecord {
        iteration: usize,
        mean_gap: f64,
        trust_region: u32,
        replications: usize,
        within_variance: Option<f64>,
        between_variance: Option<f64>,
        t_statistic: Option<f64>,
    },
}

impl Event {
    /// Outer iteration index of this event
    pub fn iteration(&self) -> usize {
        match self {
            Event::SelectionCompleted { iteration, .. } => *iteration,
            Event::StationarityChecked { iteration, .. } => *iteration,
            Event::TrustRegionHalved { iteration, .. } => *iteration,
            Event::ReplicationsDoubled { iteration, .. } => *iteration,
            Event::IterationRecord { iteration, .. } => *iteration,
        }
    }

    /// Variant name as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::SelectionCompleted { .. } => "SelectionCompleted",
            Event::StationarityChecked { .. } => "StationarityChecked",
            Event::TrustRegionHalved { .. } => "TrustRegionHalved",
            Event::ReplicationsDoubled { .. } => "ReplicationsDoubled",
            Event::IterationRecord { .. } => "IterationRecord",
        }
    }

    /// True for events that changed (T, R)
    pub fn is_adaptation(&self) -> bool {
        matches!(
            self,
            Event::TrustRegionHalved { .. } | Event::ReplicationsDoubled { .. }
        )
    }
}

/// In-memory event log with simple queries.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn events_at_iteration(&self, iteration: usize) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.iteration() == iteration)
            .collect()
    }

    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// All (T, R) changes in order
    pub fn adaptations(&self) -> Vec<&Event> {
        self.events.iter().filter(|e| e.is_adaptation()).collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(iteration: usize) -> Event {
        Event::IterationRecord {
            iteration,
            mean_gap: 1.0,
            trust_region: 4,
            replications: 2,
            within_variance: None,
            between_variance: None,
            t_statistic: None,
        }
    }

    #[test]
    fn test_event_log_query_by_type() {
        let mut log = EventLog::new();
        log.log(record(1));
        log.log(Event::TrustRegionHalved {
            iteration: 1,
            old_trust_region: 4,
            new_trust_region: 2,
            within_variance: 0.0,
            between_variance: 1.0,
        });
        log.log(record(2));

        assert_eq!(log.events_of_type("IterationRecord").len(), 2);
        assert_eq!(log.events_of_type("TrustRegionHalved").len(), 1);
        assert_eq!(log.adaptations().len(), 1);
        assert_eq!(log.events_at_iteration(1).len(), 2);
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let json = serde_json::to_value(record(5)).unwrap();
        assert_eq!(json["type"], "iteration_record");
        assert_eq!(json["iteration"], 5);
    }

    #[test]
    fn test_event_log_clear() {
        let mut log = EventLog::new();
        log.log(record(1));
        log.clear();
        assert!(log.is_empty());
    }
}
