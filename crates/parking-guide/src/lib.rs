//! Parking Guide
//!
//! Entrance guidance loop for a parking lot: fuses recorded or live
//! detector output with a presence sensor, drives the lot-full line and
//! shows where the waiting vehicle should park.

pub mod config;
pub mod driver;
pub mod feed;
pub mod sink;
pub mod telemetry;

pub use config::{AppConfig, LineBackend};
pub use driver::{Driver, StopReason, TickReport};
pub use feed::{
    Detector, FeedError, FrameSource, RawDetection, RecordedDetector, RecordedFrame, ReplayFeed,
};
pub use sink::{ConsoleSink, MessageSink};
pub use telemetry::{init_logging, install_metrics_exporter};

use line_io::LineError;
use thiserror::Error;

/// Driver error types
#[derive(Error, Debug)]
pub enum GuideError {
    #[error("Calibration failed: no parking slots found in the calibration frame")]
    Calibration,

    #[error("Frame acquisition failed: {0}")]
    Feed(#[from] FeedError),

    #[error("Line I/O failed: {0}")]
    Line(#[from] LineError),

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Metrics setup failed: {0}")]
    Metrics(String),
}
