//! Guidance phases

use ring_buffer::RingBuffer;
use serde::{Deserialize, Serialize};
use slot_map::SlotId;
use std::fmt;
use std::time::Instant;

/// Discrete phase of the guidance state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Idle,
    SenseWait,
    GuideSlot,
    GuideFull,
    GuideDone,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "IDLE",
            Phase::SenseWait => "SENSE_WAIT",
            Phase::GuideSlot => "GUIDE_SLOT",
            Phase::GuideFull => "GUIDE_FULL",
            Phase::GuideDone => "GUIDE_DONE",
        };
        f.write_str(name)
    }
}

/// Phase together with the data only that phase owns
#[derive(Debug, Clone, Default)]
pub enum PhaseState {
    #[default]
    Idle,
    SenseWait {
        since: Instant,
    },
    GuideSlot {
        since: Instant,
        /// Most recent candidates, oldest dropped first
        history: RingBuffer<SlotId>,
        /// Consecutive ticks that saw no free slot
        empty_ticks: u32,
    },
    GuideFull {
        since: Instant,
    },
    GuideDone {
        since: Instant,
        /// `None` when the lot was full
        target: Option<SlotId>,
    },
}

impl PhaseState {
    pub fn phase(&self) -> Phase {
        match self {
            PhaseState::Idle => Phase::Idle,
            PhaseState::SenseWait { .. } => Phase::SenseWait,
            PhaseState::GuideSlot { .. } => Phase::GuideSlot,
            PhaseState::GuideFull { .. } => Phase::GuideFull,
            PhaseState::GuideDone { .. } => Phase::GuideDone,
        }
    }

    /// Time of the last phase entry (IDLE carries no timer)
    pub fn since(&self) -> Option<Instant> {
        match self {
            PhaseState::Idle => None,
            PhaseState::SenseWait { since }
            | PhaseState::GuideSlot { since, .. }
            | PhaseState::GuideFull { since }
            | PhaseState::GuideDone { since, .. } => Some(*since),
        }
    }
}
