//! Domain models for replanner selection

pub mod ensemble;
pub mod event;
pub mod slot;

// Re-exports
pub use ensemble::{AgentObservations, EnsembleError, ReplicationEnsemble, ReplicationObservation};
pub use event::{Event, EventLog};
pub use slot::{footprint, Slot};
