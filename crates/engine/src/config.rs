//! Scheduler configuration.

use thiserror::Error;

use crate::types::{DEFAULT_TICKS_PER_UNIT, DEFAULT_UNIT_MS, NANOS_PER_MILLI};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("ticks per unit must be positive")]
    ZeroTicks,
    #[error("timing unit must be at least 1ms")]
    ZeroUnit,
}

/// Frame rate expressed as `ticks_per_unit` frames every `unit_ms` milliseconds.
///
/// Rates that are not a whole number of nanoseconds per frame (60 FPS is
/// 16_666_666.6ns) are paced exactly over each unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    ticks_per_unit: u32,
    unit_ms: u32,
}

impl SchedulerConfig {
    pub fn new(ticks_per_unit: u32, unit_ms: u32) -> Result<Self, ConfigError> {
        if ticks_per_unit == 0 {
            return Err(ConfigError::ZeroTicks);
        }
        if unit_ms == 0 {
            return Err(ConfigError::ZeroUnit);
        }
        Ok(Self {
            ticks_per_unit,
            unit_ms,
        })
    }

    /// `fps` frames per second.
    pub fn per_second(fps: u32) -> Result<Self, ConfigError> {
        Self::new(fps, 1000)
    }

    /// Read `VSYNC_TILES_FPS` and `VSYNC_TILES_UNIT_MS`.
    ///
    /// Missing, unparsable or zero values fall back to the defaults.
    pub fn from_env() -> Self {
        use std::env;

        let ticks_per_unit = env::var("VSYNC_TILES_FPS")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .filter(|&v: &u32| v > 0)
            .unwrap_or(DEFAULT_TICKS_PER_UNIT);

        let unit_ms = env::var("VSYNC_TILES_UNIT_MS")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .filter(|&v: &u32| v > 0)
            .unwrap_or(DEFAULT_UNIT_MS);

        Self {
            ticks_per_unit,
            unit_ms,
        }
    }

    pub fn ticks_per_unit(&self) -> u32 {
        self.ticks_per_unit
    }

    pub fn unit_ms(&self) -> u32 {
        self.unit_ms
    }

    pub fn unit_nanos(&self) -> i64 {
        self.unit_ms as i64 * NANOS_PER_MILLI
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            ticks_per_unit: DEFAULT_TICKS_PER_UNIT,
            unit_ms: DEFAULT_UNIT_MS,
        }
    }
}
