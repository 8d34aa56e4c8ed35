//! Guidance state machine
//!
//! Each tick takes the presence-sensor level, the current empty-slot set
//! and the wall-clock time. [`transition`] is a pure function from the old
//! state to the new state plus the effects the driver must carry out;
//! [`GuidanceStateMachine`] owns the state across ticks.

use ring_buffer::RingBuffer;
use slot_map::{EmptySlotSet, SlotId};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::GuidanceConfig;
use crate::phase::{Phase, PhaseState};

/// Inputs for one tick
#[derive(Debug, Clone, Copy)]
pub struct TickInput<'a> {
    /// Presence sensor reports a vehicle
    pub sensor_active: bool,
    /// Slots judged empty this frame
    pub empty_slots: &'a EmptySlotSet,
    pub now: Instant,
}

/// Effects produced by a transition, executed by the driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuidanceEffect {
    PhaseChanged { from: Phase, to: Phase },
    /// Candidate reached the stability threshold
    Committed(SlotId),
    /// Guidance ended with no free slot
    LotFull,
    /// New text for the message sink
    Message(String),
}

/// Complete machine state
#[derive(Debug, Clone)]
pub struct GuidanceState {
    pub phase: PhaseState,
    /// Current guidance text, kept until replaced
    pub message: String,
}

impl GuidanceState {
    pub fn idle(config: &GuidanceConfig) -> Self {
        Self {
            phase: PhaseState::Idle,
            message: config.messages.idle.clone(),
        }
    }
}

fn elapsed(since: Instant, now: Instant) -> Duration {
    now.saturating_duration_since(since)
}

/// Lowest column index wins, row A before row B on ties
fn best_candidate(empty: &EmptySlotSet) -> Option<SlotId> {
    empty.iter().copied().min_by_key(|id| id.priority())
}

/// Advance the machine by one tick.
pub fn transition(
    state: GuidanceState,
    input: &TickInput<'_>,
    config: &GuidanceConfig,
) -> (GuidanceState, Vec<GuidanceEffect>) {
    let GuidanceState { phase, mut message } = state;
    let from = phase.phase();
    let mut effects = Vec::new();

    let next = match phase {
        PhaseState::Idle => {
            if input.sensor_active {
                PhaseState::SenseWait { since: input.now }
            } else {
                PhaseState::Idle
            }
        }

        PhaseState::SenseWait { since } => {
            let confirm = Duration::from_millis(config.sense_confirm_ms);
            if !input.sensor_active {
                PhaseState::Idle
            } else if elapsed(since, input.now) >= confirm {
                if input.empty_slots.is_empty() {
                    PhaseState::GuideFull { since: input.now }
                } else {
                    PhaseState::GuideSlot {
                        since: input.now,
                        history: RingBuffer::new(config.history_len),
                        empty_ticks: 0,
                    }
                }
            } else {
                PhaseState::SenseWait { since }
            }
        }

        PhaseState::GuideSlot {
            since,
            mut history,
            empty_ticks,
        } => match best_candidate(input.empty_slots) {
            None => {
                let empty_ticks = empty_ticks + 1;
                if empty_ticks >= config.full_fallback_ticks.max(1) {
                    PhaseState::GuideFull { since: input.now }
                } else {
                    PhaseState::GuideSlot {
                        since,
                        history,
                        empty_ticks,
                    }
                }
            }
            Some(candidate) => {
                history.push(candidate);
                if history.count(&candidate) >= config.stability_threshold {
                    effects.push(GuidanceEffect::Committed(candidate));
                    message = config.messages.guide_to(candidate);
                    effects.push(GuidanceEffect::Message(message.clone()));
                    PhaseState::GuideDone {
                        since: input.now,
                        target: Some(candidate),
                    }
                } else {
                    PhaseState::GuideSlot {
                        since,
                        history,
                        empty_ticks: 0,
                    }
                }
            }
        },

        PhaseState::GuideFull { .. } => {
            effects.push(GuidanceEffect::LotFull);
            message = config.messages.full.clone();
            effects.push(GuidanceEffect::Message(message.clone()));
            PhaseState::GuideDone {
                since: input.now,
                target: None,
            }
        }

        PhaseState::GuideDone { since, target } => {
            let hold = Duration::from_millis(config.message_hold_ms);
            if elapsed(since, input.now) > hold {
                if message != config.messages.idle {
                    message = config.messages.idle.clone();
                    effects.push(GuidanceEffect::Message(message.clone()));
                }
                PhaseState::Idle
            } else {
                PhaseState::GuideDone { since, target }
            }
        }
    };

    let to = next.phase();
    if from != to {
        effects.insert(0, GuidanceEffect::PhaseChanged { from, to });
    }

    (
        GuidanceState {
            phase: next,
            message,
        },
        effects,
    )
}

/// Owns the guidance state for the lifetime of the control loop
#[derive(Debug, Clone)]
pub struct GuidanceStateMachine {
    config: GuidanceConfig,
    state: GuidanceState,
}

impl GuidanceStateMachine {
    /// Create a machine in IDLE with the idle message
    pub fn new(config: GuidanceConfig) -> Self {
        Self {
            state: GuidanceState::idle(&config),
            config,
        }
    }

    /// Run one tick and return the effects to execute
    pub fn tick(&mut self, input: TickInput<'_>) -> Vec<GuidanceEffect> {
        let state = std::mem::replace(
            &mut self.state,
            GuidanceState {
                phase: PhaseState::Idle,
                message: String::new(),
            },
        );
        let (next, effects) = transition(state, &input, &self.config);
        self.state = next;

        for effect in &effects {
            match effect {
                GuidanceEffect::PhaseChanged { from, to } => {
                    info!("Guidance phase {} -> {}", from, to)
                }
                GuidanceEffect::Committed(slot) => info!("Guidance committed to {}", slot),
                GuidanceEffect::LotFull => warn!("No free slot, announcing lot full"),
                GuidanceEffect::Message(text) => debug!("Guidance message: {}", text),
            }
        }

        effects
    }

    pub fn phase(&self) -> Phase {
        self.state.phase.phase()
    }

    pub fn message(&self) -> &str {
        &self.state.message
    }

    /// Time of the last phase entry
    pub fn phase_started_at(&self) -> Option<Instant> {
        self.state.phase.since()
    }

    /// Candidate history, only present while in GUIDE_SLOT
    pub fn history(&self) -> Option<&RingBuffer<SlotId>> {
        match &self.state.phase {
            PhaseState::GuideSlot { history, .. } => Some(history),
            _ => None,
        }
    }

    /// Slot the vehicle was sent to, held while in GUIDE_DONE
    pub fn committed_target(&self) -> Option<SlotId> {
        match &self.state.phase {
            PhaseState::GuideDone { target, .. } => *target,
            _ => None,
        }
    }

    pub fn state(&self) -> &GuidanceState {
        &self.state
    }

    pub fn config(&self) -> &GuidanceConfig {
        &self.config
    }

    /// Drop back to IDLE with the idle message
    pub fn reset(&mut self) {
        self.state = GuidanceState::idle(&self.config);
    }
}

impl Default for GuidanceStateMachine {
    fn default() -> Self {
        Self::new(GuidanceConfig::default())
    }
}
