//! Replanner Core - adaptive replanner selection
//!
//! Decides, once per outer iteration of an iterative transport-equilibrium
//! search, which agents may switch to their candidate plan, and adapts how
//! aggressive that selection is as the search converges.
//!
//! # Architecture
//!
//! - **models**: Iteration input (agents, replications, slots) and events
//! - **selection**: Decision scores and greedy trust-region packing
//! - **policy**: Replanner policies behind one trait
//! - **stats**: Dickey-Fuller stationarity test
//! - **adaptation**: Parameter manager owning (T, R)
//! - **orchestrator**: Per-iteration loop and checkpoints
//! - **events**: Event sinks
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. Every accepted candidate's anticipated slot change is at most T; the
//!    per-slot bound holds under `ReplicationAggregate::Worst`, or under
//!    `Mean` with a single replication
//! 2. T ≥ 1 never increases, R ≥ 1 never decreases
//! 3. All randomness is deterministic (seeded RNG)

// Module declarations
pub mod adaptation;
pub mod events;
pub mod models;
pub mod orchestrator;
pub mod policy;
pub mod rng;
pub mod selection;
pub mod stats;

// Re-exports for convenience
pub use adaptation::{AdaptationConfig, GapSample, ParameterManager, TrustRegionState};
pub use events::{EventSink, NullSink, TsvSink};
pub use models::{
    AgentObservations, EnsembleError, Event, EventLog, ReplicationEnsemble, ReplicationObservation, Slot,
};
pub use orchestrator::{EngineConfig, EngineError, EngineSnapshot, IterationResult, ReplannerEngine};
pub use policy::{PolicyConfig, ReplannerPolicy};
pub use rng::RngManager;
pub use selection::{ScoreEstimator, TrustRegionPacker};
pub use stats::{DickeyFullerResult, DickeyFullerTest};
