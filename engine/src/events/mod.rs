//! Event sinks
//!
//! The engine emits [`Event`](crate::models::Event)s to whatever sink the
//! caller injects. Provided sinks:
//! - [`EventLog`](crate::models::EventLog): in-memory, queryable
//! - [`NullSink`]: discards everything
//! - [`TsvSink`]: one tab-separated row per iteration record
//! - [`JsonLinesSink`]: every event as one JSON object per line

pub mod sink;

pub use sink::{EventSink, JsonLinesSink, NullSink, TsvSink};
