//! Stationarity-driven adaptation of (T, R)
//!
//! The [`ParameterManager`] is the only owner of the trust region T and
//! the replication count R. It collects one [`GapSample`] per iteration
//! and, once the realized gap has stopped drifting, decides whether the
//! remaining fluctuation comes from the dynamics (tighten T) or from
//! sampling noise (grow R).

pub mod manager;
pub mod sample;

pub use manager::{
    Adaptation, AdaptationAction, AdaptationConfig, ManagerPhase, ManagerSnapshot, ParameterManager,
    SampleOutcome, TrustRegionState,
};
pub use sample::GapSample;
