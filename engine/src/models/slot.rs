//! Space-time slots and plan footprints
//!
//! A slot is one `(location, time bin)` cell, e.g. a road link during one
//! hour. Plans are given as ordered sequences of slots; the same slot may
//! appear several times (a plan crossing the same link twice in one bin).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One capacity-bounded space-time cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Slot {
    /// Location identifier (link, stop, facility)
    pub location: String,
    /// Time bin index
    pub time_bin: u32,
}

impl Slot {
    pub fn new(location: impl Into<String>, time_bin: u32) -> Self {
        Self {
            location: location.into(),
            time_bin,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.location, self.time_bin)
    }
}

/// Distinct slots whose occupancy changes when switching from `current`
/// to `candidate`.
///
/// Occupancy is compared as multisets. A slot whose count grows is *added*
/// and always part of the footprint; a slot whose count shrinks is
/// *vacated* and only included when `count_vacated` is set. The result is
/// sorted and free of duplicates.
///
/// # Example
/// ```
/// use replanner_core_rs::models::{footprint, Slot};
///
/// let current = vec![Slot::new("a", 1), Slot::new("b", 1)];
/// let candidate = vec![Slot::new("a", 1), Slot::new("c", 1)];
///
/// assert_eq!(footprint(&current, &candidate, false), vec![Slot::new("c", 1)]);
/// assert_eq!(footprint(&current, &candidate, true).len(), 2);
/// ```
pub fn footprint(current: &[Slot], candidate: &[Slot], count_vacated: bool) -> Vec<Slot> {
    let mut net: BTreeMap<&Slot, i64> = BTreeMap::new();
    for slot in candidate {
        *net.entry(slot).or_insert(0) += 1;
    }
    for slot in current {
        *net.entry(slot).or_insert(0) -= 1;
    }

    net.into_iter()
        .filter(|&(_, delta)| delta > 0 || (count_vacated && delta < 0))
        .map(|(slot, _)| slot.clone())
        .collect()
}
