//! Configuration validation.

use crate::error::{ConfigError, Result};

use super::MonitorConfig;

/// Validate a monitor configuration.
///
/// Checks:
/// - Clock frequency is non-zero
/// - Sweep interval is non-zero and fits in clock ticks
/// - Stepper slot limit is non-zero
///
/// The slot limit is checked against the build's slot capacity when the
/// monitor is created.
pub fn validate_config(config: &MonitorConfig) -> Result<()> {
    if config.clock_freq.hz() == 0 {
        return Err(ConfigError::InvalidClockFrequency(config.clock_freq.hz()).into());
    }

    match config.sweep_interval_ticks() {
        Some(ticks) if ticks > 0 => {}
        _ => {
            return Err(ConfigError::InvalidSweepInterval(config.sweep_interval_ms).into());
        }
    }

    if config.max_stepper_slots == 0 {
        return Err(ConfigError::InvalidMaxStepperSlots(config.max_stepper_slots).into());
    }

    Ok(())
}
