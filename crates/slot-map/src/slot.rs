//! Slot identities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::geometry::{BoundingBox, Point};
use crate::SlotMapError;

/// Parking row, `A` is the row nearest the top of the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Row {
    A,
    B,
}

impl Row {
    /// Tie-break rank: row A wins over row B
    pub fn rank(&self) -> u8 {
        match self {
            Row::A => 0,
            Row::B => 1,
        }
    }

    pub fn letter(&self) -> char {
        match self {
            Row::A => 'A',
            Row::B => 'B',
        }
    }
}

/// Slot identity `{Row}{Index}`, index is 1-based left-to-right within the row
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotId {
    row: Row,
    index: u32,
}

impl SlotId {
    /// Build an id; `index` must be positive
    pub fn new(row: Row, index: u32) -> Result<Self, SlotMapError> {
        if index == 0 {
            return Err(SlotMapError::InvalidSlotId(format!("{}0", row.letter())));
        }
        Ok(Self { row, index })
    }

    /// Registry-internal constructor, `index` starts at 1
    pub(crate) fn at(row: Row, index: u32) -> Self {
        debug_assert!(index > 0);
        Self { row, index }
    }

    pub fn row(&self) -> Row {
        self.row
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    /// Guidance priority: lower column index first, then row A before row B
    pub fn priority(&self) -> (u32, u8) {
        (self.index, self.row.rank())
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row.letter(), self.index)
    }
}

impl FromStr for SlotId {
    type Err = SlotMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SlotMapError::InvalidSlotId(s.to_string());
        let mut chars = s.chars();
        let row = match chars.next() {
            Some('A') => Row::A,
            Some('B') => Row::B,
            _ => return Err(invalid()),
        };
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let index: u32 = digits.parse().map_err(|_| invalid())?;
        SlotId::new(row, index).map_err(|_| invalid())
    }
}

impl TryFrom<String> for SlotId {
    type Error = SlotMapError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<SlotId> for String {
    fn from(id: SlotId) -> Self {
        id.to_string()
    }
}

/// One registered parking space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub id: SlotId,
    /// Centroid of the calibration bounding box
    pub center: Point,
    /// Calibration bounding box
    pub bbox: BoundingBox,
}
