//! Deterministic random number generation
//!
//! Uses xorshift64* for fast, reproducible tie-breaking and sampling.
//! CRITICAL: All randomness in the engine MUST go through this module.

mod xorshift;

pub use xorshift::RngManager;
