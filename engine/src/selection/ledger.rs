//! Per-replication slot change counters
//!
//! One map `slot → change count` and one running maximum per
//! replication. Counters start at zero every iteration.

use crate::models::Slot;
use std::collections::HashMap;

/// Committed occupancy changes of one packing pass
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SlotLedger {
    changes: Vec<HashMap<Slot, u32>>,
    max_change: Vec<u32>,
}

impl SlotLedger {
    pub fn new(replications: usize) -> Self {
        Self {
            changes: vec![HashMap::new(); replications],
            max_change: vec![0; replications],
        }
    }

    pub fn replications(&self) -> usize {
        self.changes.len()
    }

    /// Committed change count of `slot` in replication `r`
    pub fn change(&self, r: usize, slot: &Slot) -> u32 {
        self.changes
            .get(r)
            .and_then(|m| m.get(slot))
            .copied()
            .unwrap_or(0)
    }

    /// Largest committed change in replication `r`
    pub fn max_change(&self, r: usize) -> u32 {
        self.max_change.get(r).copied().unwrap_or(0)
    }

    /// Largest committed change over all replications
    pub fn overall_max_change(&self) -> u32 {
        self.max_change.iter().copied().max().unwrap_or(0)
    }

    /// Slots with a non-zero count in replication `r`
    pub fn changed_slots(&self, r: usize) -> impl Iterator<Item = (&Slot, u32)> + '_ {
        self.changes
            .get(r)
            .into_iter()
            .flat_map(|m| m.iter().map(|(s, c)| (s, *c)))
    }

    /// Max change of replication `r` if `slots` were committed on top
    ///
    /// `r` must be `< replications()`.
    pub(crate) fn candidate_max(&self, r: usize, slots: &[Slot]) -> u32 {
        let counts = &self.changes[r];
        slots
            .iter()
            .map(|s| 1 + counts.get(s).copied().unwrap_or(0))
            .fold(self.max_change[r], u32::max)
    }

    /// Increment every slot in `slots` for replication `r`
    ///
    /// `r` must be `< replications()`.
    pub(crate) fn commit(&mut self, r: usize, slots: &[Slot]) {
        let counts = &mut self.changes[r];
        let max = &mut self.max_change[r];
        for slot in slots {
            let count = counts.entry(slot.clone()).or_insert(0);
            *count += 1;
            *max = (*max).max(*count);
        }
    }
}
