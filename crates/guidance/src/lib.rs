//! Parking Guidance Core
//!
//! Converts noisy per-frame empty-slot sets into one stable decision:
//! - Lot-full output level with edge-triggered writes
//! - Timed, debounced guidance state machine
//! - Human-readable guidance messages

pub mod config;
pub mod machine;
pub mod occupancy;
pub mod phase;

pub use config::{GuidanceConfig, GuidanceMessages};
pub use machine::{transition, GuidanceEffect, GuidanceState, GuidanceStateMachine, TickInput};
pub use occupancy::OccupancySignal;
pub use phase::{Phase, PhaseState};
