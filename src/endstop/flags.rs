//! Endstop status bits shared between timer and task context.

use core::cell::Cell;
use core::fmt;
use core::ops::{BitOr, BitOrAssign};

use critical_section::Mutex;

/// Endstop status bit set.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EndstopFlags(u8);

impl EndstopFlags {
    /// Armed to trigger on a high pin level (low otherwise).
    pub const PIN_ACTIVE_HIGH: Self = Self(1 << 0);
    /// Homing is armed and the debounce timer is scheduled.
    pub const HOMING_ACTIVE: Self = Self(1 << 1);
    /// A trip occurred and has not been reported to the host.
    pub const REPORT_PENDING: Self = Self(1 << 2);

    /// No bits set.
    #[inline]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Raw bit value.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Check if no bits are set.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Check if all bits of `other` are set.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Copy with the bits of `other` cleared.
    #[inline]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Set the bits of `other`.
    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clear the bits of `other`.
    #[inline]
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for EndstopFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for EndstopFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for EndstopFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(EndstopFlags, &str); 3] = [
            (EndstopFlags::PIN_ACTIVE_HIGH, "PIN_ACTIVE_HIGH"),
            (EndstopFlags::HOMING_ACTIVE, "HOMING_ACTIVE"),
            (EndstopFlags::REPORT_PENDING, "REPORT_PENDING"),
        ];
        if self.is_empty() {
            return f.write_str("(empty)");
        }
        let mut first = true;
        for (flag, name) in NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Flag word guarded by a critical section.
///
/// The timer callback may preempt the main loop at any instruction. Every
/// access goes through `critical_section::with`, so a read-modify-write can
/// not interleave with a trip.
pub struct FlagWord(Mutex<Cell<EndstopFlags>>);

impl FlagWord {
    /// Create a cleared flag word.
    pub const fn new() -> Self {
        Self(Mutex::new(Cell::new(EndstopFlags::empty())))
    }

    /// Snapshot of all bits.
    pub fn load(&self) -> EndstopFlags {
        critical_section::with(|cs| self.0.borrow(cs).get())
    }

    /// Replace the whole word.
    pub fn store(&self, flags: EndstopFlags) {
        critical_section::with(|cs| self.0.borrow(cs).set(flags));
    }

    /// Read-modify-write under one critical section.
    pub fn update<R>(&self, f: impl FnOnce(&mut EndstopFlags) -> R) -> R {
        critical_section::with(|cs| {
            let cell = self.0.borrow(cs);
            let mut flags = cell.get();
            let ret = f(&mut flags);
            cell.set(flags);
            ret
        })
    }

    /// Clear [`EndstopFlags::REPORT_PENDING`] and return the word as it was before.
    pub fn take_report(&self) -> EndstopFlags {
        self.update(|flags| {
            let before = *flags;
            flags.remove(EndstopFlags::REPORT_PENDING);
            before
        })
    }
}

impl fmt::Debug for FlagWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FlagWord").field(&self.load()).finish()
    }
}

impl Default for FlagWord {
    fn default() -> Self {
        Self::new()
    }
}
