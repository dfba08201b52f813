//! Orchestrator - the per-iteration selection and adaptation loop
//!
//! See `engine.rs` for the loop and `checkpoint.rs` for save/resume.

pub mod checkpoint;
pub mod engine;

pub use checkpoint::{compute_config_hash, EngineSnapshot};
pub use engine::{EngineConfig, EngineError, IterationResult, ReplannerEngine};
