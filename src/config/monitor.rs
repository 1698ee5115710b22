//! Monitor configuration - root configuration structure.

use serde::Deserialize;

use crate::clock::ClockFreq;

/// Root configuration structure from TOML.
///
/// All fields are optional in TOML and fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Hardware clock frequency used to convert intervals to ticks.
    #[serde(rename = "clock_frequency_hz")]
    pub clock_freq: ClockFreq,

    /// Interval between sweeps for unreported trips, in milliseconds.
    pub sweep_interval_ms: u32,

    /// Largest stepper count accepted by `config_end_stop`.
    pub max_stepper_slots: u8,
}

impl MonitorConfig {
    /// Default sweep interval in milliseconds.
    pub const DEFAULT_SWEEP_INTERVAL_MS: u32 = 50;

    /// Sweep interval in clock ticks.
    ///
    /// Returns `None` if it does not fit the 32-bit clock.
    pub fn sweep_interval_ticks(&self) -> Option<u32> {
        self.clock_freq.ticks_from_ms(self.sweep_interval_ms)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            clock_freq: ClockFreq::default(),
            sweep_interval_ms: Self::DEFAULT_SWEEP_INTERVAL_MS,
            max_stepper_slots: u8::MAX,
        }
    }
}
