//! Slot registry built from a single calibration frame

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::detection::Detection;
use crate::geometry::{BoundingBox, Point};
use crate::slot::{Row, Slot, SlotId};

/// Slots in the top row of the field layout
pub const TOP_ROW_SLOTS: usize = 17;

/// How calibration detections are split into rows A and B
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "strategy")]
pub enum RowSplit {
    /// First `top` slots by vertical center form row A
    FixedCount { top: usize },
    /// Split at the largest gap between consecutive vertical centers
    VerticalGap,
}

impl Default for RowSplit {
    fn default() -> Self {
        RowSplit::FixedCount { top: TOP_ROW_SLOTS }
    }
}

impl RowSplit {
    /// Number of slots (sorted by vertical center) that belong to row A
    fn top_count(&self, centers_y: &[f32]) -> usize {
        match *self {
            RowSplit::FixedCount { top } => top.min(centers_y.len()),
            RowSplit::VerticalGap => {
                if centers_y.len() < 2 {
                    return centers_y.len();
                }
                let mut best = (0usize, f32::NEG_INFINITY);
                for (i, pair) in centers_y.windows(2).enumerate() {
                    let gap = pair[1] - pair[0];
                    if gap > best.1 {
                        best = (i, gap);
                    }
                }
                best.0 + 1
            }
        }
    }
}

/// Immutable map of slot ids to reference centers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotRegistry {
    /// Row A left-to-right, then row B left-to-right
    slots: Vec<Slot>,
}

impl SlotRegistry {
    /// Build the registry from one calibration frame.
    ///
    /// Only `Empty`/`Occupied` detections with finite coordinates count.
    /// Returns an empty registry when none are present; callers treat that
    /// as "layout unknown".
    pub fn build(detections: &[Detection], split: RowSplit) -> Self {
        let mut raw: Vec<(Point, BoundingBox)> = Vec::new();
        for det in detections {
            if !det.class.is_slot() {
                continue;
            }
            if !det.is_well_formed() {
                debug!("Discarding malformed calibration detection: {:?}", det.bbox);
                continue;
            }
            raw.push((det.bbox.center(), det.bbox));
        }

        if raw.is_empty() {
            warn!("No slot-shaped detections in calibration frame");
            return Self::default();
        }

        raw.sort_by(|a, b| a.0.y.total_cmp(&b.0.y));
        let centers_y: Vec<f32> = raw.iter().map(|(c, _)| c.y).collect();
        let top = split.top_count(&centers_y);
        let bottom = raw.split_off(top);

        let mut slots = Vec::with_capacity(raw.len() + bottom.len());
        for (row, mut part) in [(Row::A, raw), (Row::B, bottom)] {
            part.sort_by(|a, b| a.0.x.total_cmp(&b.0.x));
            for (position, (center, bbox)) in (1u32..).zip(part) {
                slots.push(Slot {
                    id: SlotId::at(row, position),
                    center,
                    bbox,
                });
            }
        }

        info!(
            "Slot registry built with {} slots: {:?}",
            slots.len(),
            slots.iter().map(|s| s.id.to_string()).collect::<Vec<_>>()
        );

        Self { slots }
    }

    /// Id of the slot whose center is closest to `point`
    pub fn nearest(&self, point: Point) -> Option<SlotId> {
        let mut best: Option<(SlotId, f32)> = None;
        for slot in &self.slots {
            let d2 = slot.center.distance_sq(&point);
            match best {
                Some((_, best_d2)) if d2 >= best_d2 => {}
                _ => best = Some((slot.id, d2)),
            }
        }
        best.map(|(id, _)| id)
    }

    /// Look up a slot by id
    pub fn get(&self, id: SlotId) -> Option<&Slot> {
        self.slots.iter().find(|s| s.id == id)
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn ids(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.slots.iter().map(|s| s.id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
