//! Guidance configuration

use serde::{Deserialize, Serialize};

/// Texts handed to the message sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuidanceMessages {
    /// Shown while no vehicle is being guided
    pub idle: String,
    /// Prefix followed by the slot id, e.g. "guide to B1"
    pub guide_prefix: String,
    /// Shown when no slot is free
    pub full: String,
}

impl Default for GuidanceMessages {
    fn default() -> Self {
        Self {
            idle: "waiting for vehicle...".to_string(),
            guide_prefix: "guide to ".to_string(),
            full: "lot full".to_string(),
        }
    }
}

impl GuidanceMessages {
    pub fn guide_to(&self, slot: impl std::fmt::Display) -> String {
        format!("{}{}", self.guide_prefix, slot)
    }
}

/// Guidance state machine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuidanceConfig {
    /// Presence must hold this long before guidance starts (milliseconds)
    pub sense_confirm_ms: u64,

    /// Final message stays up until this much time has passed (milliseconds)
    pub message_hold_ms: u64,

    /// Rolling candidate history length
    pub history_len: usize,

    /// Repeats of one candidate within the history needed to commit
    pub stability_threshold: usize,

    /// Consecutive ticks without free slots before guidance gives up with "full"
    pub full_fallback_ticks: u32,

    pub messages: GuidanceMessages,
}

impl Default for GuidanceConfig {
    fn default() -> Self {
        Self {
            sense_confirm_ms: 2000,
            message_hold_ms: 5000,
            history_len: ring_buffer::DEFAULT_CAPACITY,
            stability_threshold: 6,
            full_fallback_ticks: 2,
            messages: GuidanceMessages::default(),
        }
    }
}

impl GuidanceConfig {
    /// Create strict config (longer confirmation, more agreement)
    pub fn strict() -> Self {
        Self {
            sense_confirm_ms: 3000,
            stability_threshold: 8,
            ..Default::default()
        }
    }

    /// Create lenient config (quicker confirmation, less agreement)
    pub fn lenient() -> Self {
        Self {
            sense_confirm_ms: 1000,
            stability_threshold: 4,
            ..Default::default()
        }
    }
}
