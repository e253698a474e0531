//! Link settings
//!
//! Header layout, timing and the two telemetry-stats objects that carry the
//! connection handshake. Like the descriptor table these are release
//! specific.

use uavtalk_protocol::HeaderLayout;

use super::ConfigError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stats silence after which the link is considered lost (ms)
pub const DEFAULT_CONNECT_TIMEOUT_MS: u32 = 10_000;

/// Interval between our own stats frames (ms)
pub const DEFAULT_STATS_PERIOD_MS: u32 = 1_000;

/// Location of the status byte in a telemetry-stats object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StatsObject {
    /// Release-specific object ID
    pub obj_id: u32,
    /// Object data length in bytes
    pub len: u8,
    /// Offset of the connection status byte
    pub status_offset: u8,
}

impl StatsObject {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.status_offset >= self.len {
            return Err(ConfigError::StatusOutOfRange {
                obj_id: self.obj_id,
                offset: self.status_offset,
            });
        }
        Ok(())
    }
}

/// Link configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkConfig {
    /// Header layout of the flight controller release
    #[cfg_attr(feature = "serde", serde(default))]
    pub header: HeaderLayout,
    /// Receive only: never transmit anything
    #[cfg_attr(feature = "serde", serde(default))]
    pub passive: bool,
    /// Stats silence after which the link drops to disconnected (ms)
    #[cfg_attr(feature = "serde", serde(default = "default_connect_timeout"))]
    pub connect_timeout_ms: u32,
    /// Period of our own stats frames while linked (ms)
    #[cfg_attr(feature = "serde", serde(default = "default_stats_period"))]
    pub stats_period_ms: u32,
    /// Stats object sent by the flight controller
    pub flight_stats: StatsObject,
    /// Stats object we send back
    pub gcs_stats: StatsObject,
}

impl LinkConfig {
    /// Create a config with default header layout and timing
    pub fn new(flight_stats: StatsObject, gcs_stats: StatsObject) -> Self {
        Self {
            header: HeaderLayout::default(),
            passive: false,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            stats_period_ms: DEFAULT_STATS_PERIOD_MS,
            flight_stats,
            gcs_stats,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.flight_stats.validate()?;
        self.gcs_stats.validate()?;
        if self.stats_period_ms == 0 || self.connect_timeout_ms == 0 {
            return Err(ConfigError::InvalidTiming);
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
fn default_connect_timeout() -> u32 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

#[cfg(feature = "serde")]
fn default_stats_period() -> u32 {
    DEFAULT_STATS_PERIOD_MS
}
