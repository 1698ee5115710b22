//! Endstop module for endstop-monitor.
//!
//! Provides the endstop record, its debounce state machine and the
//! interrupt-safe status bits it shares with the reporting task.

mod flags;
mod record;

pub use flags::{EndstopFlags, FlagWord};
pub use record::{Endstop, EndstopState, MAX_STEPPER_SLOTS};
