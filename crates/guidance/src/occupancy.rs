//! Lot-full output signal

use slot_map::EmptySlotSet;
use tracing::debug;

/// Edge-triggered lot-full signal.
///
/// Holds the last level written to the output line and reports a new level
/// only when it differs. A level counts as written only once [`record`] is
/// called, so a failed write is retried on the next tick.
///
/// [`record`]: OccupancySignal::record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OccupancySignal {
    previous: bool,
}

impl OccupancySignal {
    /// Start from the level currently on the line
    pub fn new(current_level: bool) -> Self {
        Self {
            previous: current_level,
        }
    }

    /// Lot-full level for a set of empty slots (`true` = full)
    pub fn level_for(empty_set: &EmptySlotSet) -> bool {
        empty_set.is_empty()
    }

    /// Pure decision: the level the line should carry
    pub fn decide(empty_set: &EmptySlotSet, previous_output: bool) -> (bool, bool) {
        let level = Self::level_for(empty_set);
        (level, level != previous_output)
    }

    /// Returns `Some(level)` when the line must be written
    pub fn pending(&self, empty_set: &EmptySlotSet) -> Option<bool> {
        let (level, changed) = Self::decide(empty_set, self.previous);
        changed.then_some(level)
    }

    /// Note that `level` is now on the line
    pub fn record(&mut self, level: bool) {
        if level != self.previous {
            debug!("Lot-full signal edge: {} -> {}", self.previous, level);
        }
        self.previous = level;
    }

    /// Last level recorded
    pub fn level(&self) -> bool {
        self.previous
    }
}
