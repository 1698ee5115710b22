//! Hardware clock arithmetic.
//!
//! The firmware clock is a free running 32-bit tick counter that wraps. Times
//! are only comparable within half the counter range, so ordering always goes
//! through [`is_before`] instead of `<`.

use serde::Deserialize;

/// Absolute hardware clock value in ticks.
pub type Clock = u32;

/// Returns `true` if `a` is strictly earlier than `b`, accounting for wrap.
#[inline]
pub const fn is_before(a: Clock, b: Clock) -> bool {
    (a.wrapping_sub(b) as i32) < 0
}

/// Hardware clock frequency in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockFreq(pub u32);

impl ClockFreq {
    /// Create a new ClockFreq value.
    #[inline]
    pub const fn new(hz: u32) -> Self {
        Self(hz)
    }

    /// Get the raw value.
    #[inline]
    pub const fn hz(self) -> u32 {
        self.0
    }

    /// Convert milliseconds to ticks, `None` if the result overflows.
    pub fn ticks_from_ms(self, ms: u32) -> Option<u32> {
        let ticks = u64::from(self.0) * u64::from(ms) / 1_000;
        u32::try_from(ticks).ok()
    }
}

impl Default for ClockFreq {
    fn default() -> Self {
        Self(12_000_000)
    }
}
