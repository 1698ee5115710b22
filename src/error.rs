//! Error types for endstop-monitor.
//!
//! Separates recoverable protocol and configuration errors from the fatal
//! [`ShutdownReason`]s that latch the monitor into shutdown.

use core::fmt;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all endstop-monitor operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Malformed host command (unknown name, bad arguments)
    Command(CommandError),
    /// Fatal error; the monitor has entered shutdown
    Shutdown(ShutdownReason),
    /// Command refused because the monitor is already shut down
    AlreadyShutdown(ShutdownReason),
    /// Switch input could not be read
    PinError,
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Clock frequency must be > 0
    InvalidClockFrequency(u32),
    /// Sweep interval must be > 0 and representable in clock ticks
    InvalidSweepInterval(u32),
    /// Stepper slot limit must be non-zero and fit the slot capacity
    InvalidMaxStepperSlots(u8),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Errors decoding a host command.
///
/// These are transport level problems and do not shut the monitor down.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandError {
    /// No command with this name
    UnknownCommand(heapless::String<32>),
    /// Wrong number of arguments for the command
    ArgumentCount {
        /// Command name
        command: &'static str,
        /// Expected argument count
        expected: usize,
        /// Received argument count
        got: usize,
    },
    /// Argument does not fit its declared `%c` width
    ArgumentOutOfRange {
        /// Argument name
        name: &'static str,
        /// Received value
        value: u32,
    },
}

/// Fatal conditions that halt the monitor.
///
/// A misconfigured endstop could let an axis run into its hard stop, so none of
/// these are recoverable without a firmware reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ShutdownReason {
    /// Stepper slot index at or beyond the endstop's stepper count
    StepperPastMaximum,
    /// Stepper count above the build limit
    StepperCountTooLarge,
    /// Object id already in use or outside the object table
    CantAssignOid,
    /// Object id does not name an object of the expected type
    InvalidOidType,
    /// No room left in the timer queue
    TimerQueueFull,
    /// Switch input could not be configured
    InvalidInputPin,
}

impl ShutdownReason {
    /// Message reported to the host.
    pub const fn message(self) -> &'static str {
        match self {
            ShutdownReason::StepperPastMaximum => "Set stepper past maximum stepper count",
            ShutdownReason::StepperCountTooLarge => "Stepper count exceeds build limit",
            ShutdownReason::CantAssignOid => "Can't assign oid",
            ShutdownReason::InvalidOidType => "Invalid oid type",
            ShutdownReason::TimerQueueFull => "Timer queue full",
            ShutdownReason::InvalidInputPin => "Invalid input pin",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Command(e) => write!(f, "Command error: {}", e),
            Error::Shutdown(r) => write!(f, "Shutdown: {}", r),
            Error::AlreadyShutdown(r) => write!(f, "Already shutdown: {}", r),
            Error::PinError => write!(f, "GPIO input read failed"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::InvalidClockFrequency(v) => {
                write!(f, "Invalid clock frequency: {} Hz. Must be > 0", v)
            }
            ConfigError::InvalidSweepInterval(v) => {
                write!(f, "Invalid sweep interval: {} ms. Must be > 0 and fit in the clock", v)
            }
            ConfigError::InvalidMaxStepperSlots(v) => write!(
                f,
                "Invalid max stepper slots: {}. Must be > 0 and fit the slot capacity",
                v
            ),
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::UnknownCommand(name) => write!(f, "Unknown command '{}'", name),
            CommandError::ArgumentCount {
                command,
                expected,
                got,
            } => write!(f, "'{}' takes {} arguments, got {}", command, expected, got),
            CommandError::ArgumentOutOfRange { name, value } => {
                write!(f, "Argument '{}' out of range: {}", name, value)
            }
        }
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Error::Command(e)
    }
}

impl From<ShutdownReason> for Error {
    fn from(r: ShutdownReason) -> Self {
        Error::Shutdown(r)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for CommandError {}
