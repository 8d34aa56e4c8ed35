//! Linux GPIO character-device backend (`gpiod`)
//!
//! Each line is requested once from its chip: the trigger as an input, the
//! lot-full line as an output driven low until the driver says otherwise.

use gpiod::{Chip, Input, Lines, Options, Output};
use tracing::{debug, info};

use crate::{LineError, OutputLine, PresenceSensor};

/// Chip used when the configuration names none
pub const DEFAULT_CHIP: &str = "gpiochip0";

const CONSUMER: &str = "parking-guide";

/// Map between logical and electrical levels; symmetric for both directions
pub fn apply_polarity(level: bool, active_high: bool) -> bool {
    level == active_high
}

fn open_chip(chip: &str) -> Result<Chip, LineError> {
    Chip::new(chip).map_err(|source| LineError::Chip {
        chip: chip.to_string(),
        source,
    })
}

/// Presence sensor on one input line
pub struct GpioInput {
    offset: u32,
    active_high: bool,
    request: Lines<Input>,
}

impl GpioInput {
    pub fn request(chip: &str, offset: u32, active_high: bool) -> Result<Self, LineError> {
        let options = Options::input([offset]).consumer(CONSUMER);
        let request = open_chip(chip)?
            .request_lines(options)
            .map_err(|source| LineError::Request { offset, source })?;

        info!("GPIO {}:{} requested as input", chip, offset);
        Ok(Self {
            offset,
            active_high,
            request,
        })
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }
}

impl PresenceSensor for GpioInput {
    fn is_active(&mut self) -> Result<bool, LineError> {
        let [raw] = self
            .request
            .get_values([false; 1])
            .map_err(|source| LineError::Io {
                offset: self.offset,
                source,
            })?;
        Ok(apply_polarity(raw, self.active_high))
    }
}

/// Lot-full indicator on one output line
pub struct GpioOutput {
    offset: u32,
    active_high: bool,
    request: Lines<Output>,
    /// Last logical level driven
    current: bool,
}

impl GpioOutput {
    /// Request `offset` as an output driven to logical `initial`
    pub fn request(
        chip: &str,
        offset: u32,
        active_high: bool,
        initial: bool,
    ) -> Result<Self, LineError> {
        let options = Options::output([offset])
            .values([apply_polarity(initial, active_high)])
            .consumer(CONSUMER);
        let request = open_chip(chip)?
            .request_lines(options)
            .map_err(|source| LineError::Request { offset, source })?;

        info!("GPIO {}:{} requested as output, initial level {}", chip, offset, initial);
        Ok(Self {
            offset,
            active_high,
            request,
            current: initial,
        })
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }
}

impl OutputLine for GpioOutput {
    fn write(&mut self, level: bool) -> Result<(), LineError> {
        self.request
            .set_values([apply_polarity(level, self.active_high)])
            .map_err(|source| LineError::Io {
                offset: self.offset,
                source,
            })?;
        debug!("GPIO {} <- {}", self.offset, level);
        self.current = level;
        Ok(())
    }

    fn read_current(&self) -> bool {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_high_passes_through() {
        assert!(apply_polarity(true, true));
        assert!(!apply_polarity(false, true));
    }

    #[test]
    fn test_active_low_inverts() {
        assert!(!apply_polarity(true, false));
        assert!(apply_polarity(false, false));
    }

    #[test]
    fn test_missing_chip_reports_name() {
        let err = GpioOutput::request("gpiochip-absent", 14, true, false).err().unwrap();
        assert!(matches!(err, LineError::Chip { ref chip, .. } if chip == "gpiochip-absent"));
        assert!(err.to_string().contains("gpiochip-absent"));
    }
}
