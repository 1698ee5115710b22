//! Host commands and responses.
//!
//! Framing and encoding belong to the transport. This module only maps a
//! message name plus its decoded integer arguments onto typed commands, and
//! flattens responses back into arguments.

use crate::clock::Clock;
use crate::endstop::EndstopState;
use crate::error::CommandError;
use crate::hal::Pull;

/// A decoded host command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Allocate and initialize an endstop.
    ConfigEndStop {
        /// Object id for the new endstop.
        oid: u8,
        /// Board pin number of the switch.
        pin: u8,
        /// Pull resistor for the switch input.
        pull: Pull,
        /// Number of stepper slots.
        stepper_count: u8,
    },
    /// Bind a stepper to one slot of an endstop.
    SetStepper {
        /// Endstop object id.
        oid: u8,
        /// Slot index.
        pos: u8,
        /// Object id of the stepper to stop on trip.
        stepper_oid: u8,
    },
    /// Arm (or with `rest_ticks == 0`, disarm) homing.
    Home {
        /// Endstop object id.
        oid: u8,
        /// Absolute clock of the first check.
        clock: Clock,
        /// Ticks between checks.
        rest_ticks: u32,
        /// Pin level that counts as triggered.
        pin_value: bool,
    },
    /// Report endstop state immediately.
    Query {
        /// Endstop object id.
        oid: u8,
    },
}

impl Command {
    /// Format of the endstop configuration command.
    pub const CONFIG_END_STOP: &'static str =
        "config_end_stop oid=%c pin=%c pull_up=%c stepper_count=%c";
    /// Format of the stepper binding command.
    pub const END_STOP_SET_STEPPER: &'static str =
        "end_stop_set_stepper oid=%c pos=%c stepper_oid=%c";
    /// Format of the homing command.
    pub const END_STOP_HOME: &'static str =
        "end_stop_home oid=%c clock=%u rest_ticks=%u pin_value=%c";
    /// Format of the query command.
    pub const END_STOP_QUERY: &'static str = "end_stop_query oid=%c";

    /// Decode a command from its message name and integer arguments.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] for unknown names, wrong argument counts and
    /// values that do not fit a `%c` field.
    pub fn decode(name: &str, args: &[u32]) -> Result<Self, CommandError> {
        match name {
            "config_end_stop" => {
                let [oid, pin, pull_up, stepper_count] = take::<4>("config_end_stop", args)?;
                let pull = Pull::from_arg(pull_up).ok_or(CommandError::ArgumentOutOfRange {
                    name: "pull_up",
                    value: pull_up,
                })?;
                Ok(Command::ConfigEndStop {
                    oid: byte("oid", oid)?,
                    pin: byte("pin", pin)?,
                    pull,
                    stepper_count: byte("stepper_count", stepper_count)?,
                })
            }
            "end_stop_set_stepper" => {
                let [oid, pos, stepper_oid] = take::<3>("end_stop_set_stepper", args)?;
                Ok(Command::SetStepper {
                    oid: byte("oid", oid)?,
                    pos: byte("pos", pos)?,
                    stepper_oid: byte("stepper_oid", stepper_oid)?,
                })
            }
            "end_stop_home" => {
                let [oid, clock, rest_ticks, pin_value] = take::<4>("end_stop_home", args)?;
                Ok(Command::Home {
                    oid: byte("oid", oid)?,
                    clock,
                    rest_ticks,
                    pin_value: byte("pin_value", pin_value)? != 0,
                })
            }
            "end_stop_query" => {
                let [oid] = take::<1>("end_stop_query", args)?;
                Ok(Command::Query {
                    oid: byte("oid", oid)?,
                })
            }
            _ => Err(CommandError::UnknownCommand(
                heapless::String::try_from(name).unwrap_or_default(),
            )),
        }
    }

    /// Message format of this command, as declared to the host.
    pub fn format(&self) -> &'static str {
        match self {
            Command::ConfigEndStop { .. } => Self::CONFIG_END_STOP,
            Command::SetStepper { .. } => Self::END_STOP_SET_STEPPER,
            Command::Home { .. } => Self::END_STOP_HOME,
            Command::Query { .. } => Self::END_STOP_QUERY,
        }
    }

    /// Message name of this command.
    pub fn name(&self) -> &'static str {
        message_name(self.format())
    }

    /// Object id of the endstop this command addresses.
    pub fn oid(&self) -> u8 {
        match *self {
            Command::ConfigEndStop { oid, .. }
            | Command::SetStepper { oid, .. }
            | Command::Home { oid, .. }
            | Command::Query { oid } => oid,
        }
    }
}

fn take<const N: usize>(command: &'static str, args: &[u32]) -> Result<[u32; N], CommandError> {
    <[u32; N]>::try_from(args).map_err(|_| CommandError::ArgumentCount {
        command,
        expected: N,
        got: args.len(),
    })
}

fn byte(name: &'static str, value: u32) -> Result<u8, CommandError> {
    u8::try_from(value).map_err(|_| CommandError::ArgumentOutOfRange { name, value })
}

/// The leading word of a message format.
fn message_name(format: &'static str) -> &'static str {
    format.split(' ').next().unwrap_or(format)
}

/// Message sent to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    /// `end_stop_state oid=%c homing=%c pin=%c`
    EndStopState(EndstopState),
}

impl Response {
    /// Format of the state report.
    pub const END_STOP_STATE: &'static str = "end_stop_state oid=%c homing=%c pin=%c";

    /// Message name of this response.
    pub fn name(&self) -> &'static str {
        match self {
            Response::EndStopState(_) => message_name(Self::END_STOP_STATE),
        }
    }

    /// Arguments in declaration order.
    pub fn args(&self) -> [u32; 3] {
        match *self {
            Response::EndStopState(state) => [
                u32::from(state.oid),
                u32::from(state.homing),
                u32::from(state.pin),
            ],
        }
    }
}

impl From<EndstopState> for Response {
    fn from(state: EndstopState) -> Self {
        Response::EndStopState(state)
    }
}
