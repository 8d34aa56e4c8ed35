//! Detector output consumed by the slot map

use serde::{Deserialize, Serialize};

use crate::geometry::BoundingBox;

/// Detection class reported by the parking-space detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionClass {
    /// Free parking space
    Empty,
    /// Parking space holding a vehicle
    Occupied,
    /// Anything else the model reports
    Other,
}

impl DetectionClass {
    /// Map a detector label to a class.
    ///
    /// The field model labels spaces `space-empty` / `space-occupied`.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "space-empty" | "empty" => DetectionClass::Empty,
            "space-occupied" | "occupied" => DetectionClass::Occupied,
            _ => DetectionClass::Other,
        }
    }

    /// Slot-shaped detections are the ones used for calibration
    pub fn is_slot(&self) -> bool {
        matches!(self, DetectionClass::Empty | DetectionClass::Occupied)
    }
}

/// A single classified bounding box from one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class: DetectionClass,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(class: DetectionClass, bbox: BoundingBox) -> Self {
        Self { class, bbox }
    }

    /// Convenience constructor for an empty-space detection
    pub fn empty(bbox: BoundingBox) -> Self {
        Self::new(DetectionClass::Empty, bbox)
    }

    /// Convenience constructor for an occupied-space detection
    pub fn occupied(bbox: BoundingBox) -> Self {
        Self::new(DetectionClass::Occupied, bbox)
    }

    /// Non-finite coordinates make a detection unusable
    pub fn is_well_formed(&self) -> bool {
        self.bbox.is_finite()
    }
}
