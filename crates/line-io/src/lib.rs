//! Digital Line Access
//!
//! Boolean read/write capabilities for the two hardware lines at the lot
//! entrance:
//! - Presence sensor input (vehicle waiting at the gate)
//! - Lot-full output
//!
//! Backends: Linux GPIO character device (`gpiod`) for the field unit,
//! shared in-memory lines for simulation and tests.

pub mod chip;
pub mod memory;

pub use chip::{apply_polarity, GpioInput, GpioOutput, DEFAULT_CHIP};
pub use memory::MemoryLine;

use thiserror::Error;

/// Line access error types
#[derive(Error, Debug)]
pub enum LineError {
    #[error("Failed to open GPIO chip '{chip}': {source}")]
    Chip {
        chip: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to request GPIO line {offset}: {source}")]
    Request {
        offset: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("GPIO line {offset} I/O error: {source}")]
    Io {
        offset: u32,
        #[source]
        source: std::io::Error,
    },
}

/// Presence sensor capability (`true` = vehicle present)
pub trait PresenceSensor {
    fn is_active(&mut self) -> Result<bool, LineError>;
}

/// Digital output capability
pub trait OutputLine {
    fn write(&mut self, level: bool) -> Result<(), LineError>;

    /// Level last driven onto the line
    fn read_current(&self) -> bool;
}

impl<T: PresenceSensor + ?Sized> PresenceSensor for Box<T> {
    fn is_active(&mut self) -> Result<bool, LineError> {
        (**self).is_active()
    }
}

impl<T: OutputLine + ?Sized> OutputLine for Box<T> {
    fn write(&mut self, level: bool) -> Result<(), LineError> {
        (**self).write(level)
    }

    fn read_current(&self) -> bool {
        (**self).read_current()
    }
}
