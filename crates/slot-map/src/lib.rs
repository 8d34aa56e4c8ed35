//! Parking Slot Map
//!
//! Turns detector output into slot identities:
//! - Geometry and detection types shared with the detector boundary
//! - Slot registry built once from a calibration frame
//! - Per-frame assignment of "empty" detections to registered slots

pub mod assign;
pub mod detection;
pub mod geometry;
pub mod registry;
pub mod slot;

pub use assign::{assign, EmptySlotSet};
pub use detection::{Detection, DetectionClass};
pub use geometry::{BoundingBox, Point};
pub use registry::{RowSplit, SlotRegistry, TOP_ROW_SLOTS};
pub use slot::{Row, Slot, SlotId};

use thiserror::Error;

/// Slot map error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotMapError {
    #[error("Invalid slot id: {0:?}")]
    InvalidSlotId(String),
}
