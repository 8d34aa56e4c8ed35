//! Per-frame empty-slot assignment

use std::collections::BTreeSet;
use tracing::debug;

use crate::detection::{Detection, DetectionClass};
use crate::registry::SlotRegistry;
use crate::slot::SlotId;

/// Slots judged empty in the current frame
pub type EmptySlotSet = BTreeSet<SlotId>;

/// Map every `Empty` detection to its nearest registered slot.
///
/// Other classes are ignored. Several detections landing on the same slot
/// collapse into one entry.
pub fn assign(detections: &[Detection], registry: &SlotRegistry) -> EmptySlotSet {
    let mut empty = EmptySlotSet::new();
    for det in detections {
        if det.class != DetectionClass::Empty {
            continue;
        }
        if !det.is_well_formed() {
            debug!("Discarding malformed detection: {:?}", det.bbox);
            continue;
        }
        if let Some(id) = registry.nearest(det.bbox.center()) {
            empty.insert(id);
        }
    }
    empty
}
