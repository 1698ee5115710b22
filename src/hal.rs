//! Hardware collaborators.
//!
//! The monitor does not own GPIO configuration or stepper drivers. Boards
//! plug them in through these traits.

use embedded_hal::digital::InputPin;
use serde::Deserialize;

use crate::error::Result;

/// Pull resistor applied to a switch input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pull {
    /// Pull-up resistor (normally closed switch to ground).
    #[default]
    Up,
    /// No pull resistor.
    None,
    /// Pull-down resistor.
    Down,
}

impl Pull {
    /// Decode the `pull_up` command argument.
    ///
    /// `1` selects pull-up, `0` none, and `-1` pull-down. The host sends `-1`
    /// as a signed value, which arrives as `0xff` in a `%c` field or as
    /// `u32::MAX` when sign extended.
    pub fn from_arg(value: u32) -> Option<Self> {
        match value {
            0 => Some(Pull::None),
            1 => Some(Pull::Up),
            0xff | u32::MAX => Some(Pull::Down),
            _ => None,
        }
    }
}

/// Board GPIO factory for switch inputs.
pub trait PinSetup {
    /// Input pin type handed to endstops.
    type Input: InputPin;

    /// Configure `pin` as an input with the given pull resistor.
    ///
    /// # Errors
    ///
    /// Return [`ShutdownReason::InvalidInputPin`](crate::ShutdownReason::InvalidInputPin)
    /// if the pin does not exist or is already in use.
    fn setup_input(&mut self, pin: u8, pull: Pull) -> Result<Self::Input>;
}

/// Steppers known to the firmware, addressed by object id.
///
/// Endstops keep only ids, never references, so a binding can never outlive
/// the stepper it names.
pub trait StepperRegistry {
    /// Check if a stepper with this id is registered.
    fn contains(&self, oid: u8) -> bool;

    /// Stop motion on this stepper immediately.
    ///
    /// Called from timer context. Must be safe to call repeatedly and for
    /// steppers that are already stopped.
    fn stop(&self, oid: u8);
}
