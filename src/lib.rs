//! # endstop-monitor
//!
//! Interrupt-safe homing endstop monitor for stepper motion firmware.
//!
//! An endstop is a limit switch watched while an axis homes. Once armed, a
//! timer samples the switch at a fixed poll interval; the first sample that
//! matches the expected trigger level stops every bound stepper from the timer
//! context and latches a report for the host.
//!
//! ## Features
//!
//! - **embedded-hal 1.0**: Switch inputs are `InputPin`s created through [`PinSetup`]
//! - **no_std compatible**: No allocator, fixed-capacity `heapless` storage
//! - **Interrupt safe**: Every entry point takes `&self`; shared state lives in
//!   `critical-section` cells and reports are sent with interrupts enabled
//! - **Fail safe**: Configuration mismatches latch the monitor into shutdown
//! - **Host protocol**: Typed `config_end_stop` / `end_stop_set_stepper` /
//!   `end_stop_home` / `end_stop_query` commands and `end_stop_state` reports
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use endstop_monitor::{Command, EndstopMonitor, MonitorConfig};
//!
//! let monitor: EndstopMonitor<_, _> =
//!     EndstopMonitor::new(MonitorConfig::default(), board_pins, stepper_table)?;
//!
//! monitor.handle(Command::decode("config_end_stop", &[1, 12, 1, 1])?)?;
//! monitor.handle(Command::decode("end_stop_set_stepper", &[1, 0, 5])?)?;
//! monitor.handle(Command::decode("end_stop_home", &[1, 1000, 50, 1])?)?;
//!
//! // Timer interrupt
//! monitor.dispatch_timers(now);
//!
//! // Main loop
//! monitor.run_task(now, |report| transport.send(report))?;
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables file I/O and TOML parsing
//! - `log` (default): Logs through the `log` facade
//! - `defmt`: Routes logging through defmt instead of the `log` facade

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

// Core modules
pub mod clock;
pub mod command;
pub mod config;
pub mod endstop;
pub mod error;
pub mod hal;
pub mod monitor;
pub mod registry;
pub mod sched;

#[cfg(test)]
mod testing;

// Re-exports for ergonomic API
pub use clock::{is_before, Clock, ClockFreq};
pub use command::{Command, Response};
pub use config::{validate_config, MonitorConfig};
pub use endstop::{Endstop, EndstopFlags, EndstopState, FlagWord, MAX_STEPPER_SLOTS};
pub use error::{CommandError, ConfigError, Error, Result, ShutdownReason};
pub use hal::{PinSetup, Pull, StepperRegistry};
pub use monitor::EndstopMonitor;
pub use registry::{ObjectTable, MAX_ENDSTOPS};
pub use sched::{PeriodicCheck, Scheduler, TimerAction, TimerId, TimerQueue};

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};
