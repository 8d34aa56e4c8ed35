//! Frame source and detector boundary
//!
//! Camera acquisition and model inference live outside this crate. The
//! traits here are what the control loop consumes; the replay
//! implementation plays back recorded detector output (JSON lines) and is
//! what the binary runs against.

use line_io::MemoryLine;
use serde::{Deserialize, Serialize};
use slot_map::{BoundingBox, Detection, DetectionClass};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Feed error types
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Feed I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed frame record on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Detector failed: {0}")]
    Detector(String),
}

/// Source of frames; `Ok(None)` signals end of stream
pub trait FrameSource {
    type Frame;

    fn next_frame(&mut self) -> Result<Option<Self::Frame>, FeedError>;
}

/// Object detector run on one frame
pub trait Detector<F> {
    fn detect(&mut self, frame: &F) -> Result<Vec<RawDetection>, FeedError>;
}

/// Detector output as reported, before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    /// Model class label, e.g. `space-empty`
    pub label: String,
    /// Corner box `[x1, y1, x2, y2]`, absent when the model gave none
    #[serde(default)]
    pub bbox: Option<[f32; 4]>,
}

impl RawDetection {
    pub fn new(label: impl Into<String>, bbox: [f32; 4]) -> Self {
        Self {
            label: label.into(),
            bbox: Some(bbox),
        }
    }

    /// Validated detection, `None` when the box is missing or non-finite
    pub fn to_detection(&self) -> Option<Detection> {
        let bbox = BoundingBox::from(self.bbox?);
        let det = Detection::new(DetectionClass::from_label(&self.label), bbox);
        det.is_well_formed().then_some(det)
    }
}

/// Convert raw detector output, dropping malformed items
pub fn normalize(raw: &[RawDetection]) -> Vec<Detection> {
    let detections: Vec<Detection> = raw.iter().filter_map(RawDetection::to_detection).collect();
    let dropped = raw.len() - detections.len();
    if dropped > 0 {
        debug!("Dropped {} malformed detections", dropped);
    }
    detections
}

/// One recorded frame: detector output plus optional presence level
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    #[serde(default)]
    pub presence: Option<bool>,
    #[serde(default)]
    pub detections: Vec<RawDetection>,
}

/// Plays back recorded frames from JSON lines
pub struct ReplayFeed<R> {
    reader: R,
    line_no: usize,
    presence: Option<MemoryLine>,
}

impl ReplayFeed<BufReader<File>> {
    /// Open a replay file
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FeedError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        info!("Replaying detector output from {}", path.display());
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> ReplayFeed<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            presence: None,
        }
    }

    /// Drive a simulated presence sensor from the recorded `presence` field
    pub fn with_presence(mut self, line: MemoryLine) -> Self {
        self.presence = Some(line);
        self
    }
}

impl<R: BufRead> FrameSource for ReplayFeed<R> {
    type Frame = RecordedFrame;

    fn next_frame(&mut self) -> Result<Option<RecordedFrame>, FeedError> {
        let mut buf = String::new();
        loop {
            buf.clear();
            if self.reader.read_line(&mut buf)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            if !buf.trim().is_empty() {
                break;
            }
        }

        let frame: RecordedFrame =
            serde_json::from_str(buf.trim()).map_err(|source| FeedError::Parse {
                line: self.line_no,
                source,
            })?;

        if let (Some(line), Some(level)) = (&self.presence, frame.presence) {
            line.set(level);
        }
        Ok(Some(frame))
    }
}

/// Detector for recorded frames: returns what was recorded
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordedDetector;

impl Detector<RecordedFrame> for RecordedDetector {
    fn detect(&mut self, frame: &RecordedFrame) -> Result<Vec<RawDetection>, FeedError> {
        Ok(frame.detections.clone())
    }
}
