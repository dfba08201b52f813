//! xorshift64* random number generator
//!
//! 64-bit state, 64-bit output. Passes BigCrush, which is more than enough
//! for shuffling candidate lists and drawing uniform replanning decisions.
//!
//! # Determinism
//!
//! Same seed → same candidate permutation → same accepted set. Selection
//! runs must be reproducible for regression tests and for resuming a run
//! from a checkpoint.

use serde::{Deserialize, Serialize};

/// Deterministic random number generator using xorshift64*
///
/// # Example
/// ```
/// use replanner_core_rs::RngManager;
///
/// let mut rng = RngManager::new(12345);
/// let mut order = vec![0, 1, 2, 3, 4];
/// rng.shuffle(&mut order);
/// assert_eq!(order.len(), 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngManager {
    state: u64,
}

impl RngManager {
    /// Create a new RNG with given seed
    ///
    /// A zero seed is mapped to 1 (xorshift requires a non-zero state).
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u64 value
    pub fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Generate random index in `[0, upper)`
    ///
    /// # Panics
    /// Panics if `upper == 0`
    pub fn below(&mut self, upper: usize) -> usize {
        assert!(upper > 0, "upper bound must be positive");
        (self.next() % upper as u64) as usize
    }

    /// Current RNG state (for checkpointing)
    ///
    /// `RngManager::new(rng.get_state())` continues the same sequence.
    pub fn get_state(&self) -> u64 {
        self.state
    }

    /// Generate random f64 in `[0.0, 1.0)`
    pub fn next_f64(&mut self) -> f64 {
        let value = self.next();
        (value >> 11) as f64 * (1.0 / ((1u64 << 53) as f64))
    }

    /// Standard normal deviate (Box–Muller, one value per call)
    pub fn next_gaussian(&mut self) -> f64 {
        // 1 - u keeps the log argument in (0, 1]
        let u1 = 1.0 - self.next_f64();
        let u2 = self.next_f64();
        (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }

    /// Bernoulli draw with success probability `p` (clamped to `[0, 1]`)
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p.clamp(0.0, 1.0)
    }

    /// In-place Fisher–Yates shuffle
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.below(i + 1);
            items.swap(i, j);
        }
    }
}
