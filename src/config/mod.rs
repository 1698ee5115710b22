//! Configuration module for endstop-monitor.
//!
//! Provides the build-time tuning of the monitor, loadable from TOML files
//! (with `std` feature) or constructed directly.

mod monitor;
#[cfg(feature = "std")]
mod loader;
mod validation;

pub use monitor::MonitorConfig;
pub use validation::validate_config;

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};
