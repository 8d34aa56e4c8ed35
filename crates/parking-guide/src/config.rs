//! Application configuration
//!
//! Layered with the `config` crate: serde defaults, then an optional file,
//! then `PARKING_GUIDE__*` environment variables
//! (e.g. `PARKING_GUIDE__GUIDANCE__SENSE_CONFIRM_MS=1500`).

use guidance::GuidanceConfig;
use serde::{Deserialize, Serialize};
use slot_map::RowSplit;
use std::path::Path;
use tracing::Level;

use crate::GuideError;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Control loop period (milliseconds)
    pub tick_interval_ms: u64,
    pub guidance: GuidanceConfig,
    pub registry: RegistryConfig,
    pub lines: LinesConfig,
    pub feed: FeedConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            guidance: GuidanceConfig::default(),
            registry: RegistryConfig::default(),
            lines: LinesConfig::default(),
            feed: FeedConfig::default(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

/// Slot registry calibration settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub row_split: RowSplit,
}

/// Line backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineBackend {
    /// Linux GPIO character device
    #[default]
    Gpiod,
    /// In-memory lines, presence driven by the replay feed
    Simulated,
}

/// Hardware line settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinesConfig {
    pub backend: LineBackend,
    /// Chip name or device path, e.g. `gpiochip0`
    pub chip: String,
    /// Lot-full output line offset (BCM numbering on a Raspberry Pi)
    pub lot_full_pin: u32,
    pub lot_full_active_high: bool,
    /// Presence sensor input line offset
    pub trigger_pin: u32,
    pub trigger_active_high: bool,
}

impl Default for LinesConfig {
    fn default() -> Self {
        Self {
            backend: LineBackend::Gpiod,
            chip: line_io::DEFAULT_CHIP.to_string(),
            lot_full_pin: 14,
            lot_full_active_high: true,
            trigger_pin: 15,
            trigger_active_high: true,
        }
    }
}

/// Frame feed settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// JSON-lines file of recorded detector output
    pub replay_path: Option<String>,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `trace`, `debug`, `info`, `warn` or `error`
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Metrics settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prometheus listen address, e.g. `0.0.0.0:9100`
    pub listen: Option<String>,
}

impl AppConfig {
    /// Load defaults, then `path` (if given), then the environment
    pub fn load(path: Option<&Path>) -> Result<Self, GuideError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(true));
        }
        builder = builder.add_source(
            ::config::Environment::with_prefix("PARKING_GUIDE")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the control loop cannot run with
    pub fn validate(&self) -> Result<(), GuideError> {
        let invalid = |msg: String| Err(GuideError::InvalidConfig(msg));

        if self.tick_interval_ms == 0 {
            return invalid("tick_interval_ms must be positive".to_string());
        }
        let g = &self.guidance;
        if g.history_len == 0 {
            return invalid("guidance.history_len must be positive".to_string());
        }
        if g.stability_threshold == 0 || g.stability_threshold > g.history_len {
            return invalid(format!(
                "guidance.stability_threshold {} must be in 1..={}",
                g.stability_threshold, g.history_len
            ));
        }
        if let RowSplit::FixedCount { top: 0 } = self.registry.row_split {
            return invalid("registry.row_split.top must be positive".to_string());
        }
        if self.logging.level.parse::<Level>().is_err() {
            return invalid(format!("unknown log level {:?}", self.logging.level));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.guidance.sense_confirm_ms, 2000);
        assert_eq!(config.guidance.message_hold_ms, 5000);
        assert_eq!(config.registry.row_split, RowSplit::FixedCount { top: 17 });
        assert_eq!(config.lines.lot_full_pin, 14);
        assert_eq!(config.lines.trigger_pin, 15);
    }

    #[test]
    fn test_threshold_above_history_rejected() {
        let mut config = AppConfig::default();
        config.guidance.stability_threshold = 11;
        assert!(matches!(config.validate(), Err(GuideError::InvalidConfig(_))));
    }

    #[test]
    fn test_bad_log_level_rejected() {
        let mut config = AppConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("parking-guide-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            r#"
tick_interval_ms = 50

[guidance]
stability_threshold = 4

[registry.row_split]
strategy = "vertical_gap"

[lines]
backend = "simulated"
"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.tick_interval_ms, 50);
        assert_eq!(config.guidance.stability_threshold, 4);
        assert_eq!(config.guidance.history_len, 10);
        assert_eq!(config.registry.row_split, RowSplit::VerticalGap);
        assert_eq!(config.lines.backend, LineBackend::Simulated);
        assert_eq!(config.lines.lot_full_pin, 14);
    }

    #[test]
    fn test_environment_overrides_defaults() {
        std::env::set_var("PARKING_GUIDE__GUIDANCE__SENSE_CONFIRM_MS", "1500");
        let loaded = AppConfig::load(None);
        std::env::remove_var("PARKING_GUIDE__GUIDANCE__SENSE_CONFIRM_MS");

        let config = loaded.unwrap();
        assert_eq!(config.guidance.sense_confirm_ms, 1500);
        assert_eq!(config.guidance.message_hold_ms, 5000);
        assert_eq!(config.lines.chip, "gpiochip0");
    }
}
