//! Endstop record and debounce state machine.

use core::cell::{Cell, RefCell};

use critical_section::Mutex;
use embedded_hal::digital::InputPin;
use heapless::Vec;

use crate::clock::Clock;
use crate::error::{Error, Result, ShutdownReason};
use crate::hal::StepperRegistry;
use crate::sched::{Scheduler, TimerAction};

use super::flags::{EndstopFlags, FlagWord};

/// Default stepper slot capacity per endstop.
///
/// Large enough for any `stepper_count` a `%c` argument can carry.
pub const MAX_STEPPER_SLOTS: usize = u8::MAX as usize;

/// State report sent to the host as `end_stop_state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EndstopState {
    /// Endstop object id.
    pub oid: u8,
    /// Homing is still armed.
    pub homing: bool,
    /// Pin level sampled when the report was built.
    pub pin: bool,
}

/// A homing endstop.
///
/// The record is shared by the command handlers, the timer callback and the
/// report sweep, so every method takes `&self` and each field sits in its own
/// critical-section cell:
/// - `wake_time` is written by the timer callback while armed
/// - `rest_ticks` and the stepper slots are written by command handlers only
/// - `flags` is read-modify-written from both sides through [`FlagWord`]
///
/// `M` is the stepper slot capacity.
pub struct Endstop<P, const M: usize = MAX_STEPPER_SLOTS> {
    /// Object id, doubles as the timer id.
    oid: Mutex<Cell<u8>>,

    /// Absolute clock of the next debounce check.
    wake_time: Mutex<Cell<Clock>>,

    /// Ticks between checks; zero after an explicit disarm.
    rest_ticks: Mutex<Cell<u32>>,

    /// Switch input, `None` until configured.
    pin: Mutex<RefCell<Option<P>>>,

    /// Status bits shared with the timer callback.
    flags: FlagWord,

    /// Bound stepper ids. Length is the stepper count.
    steppers: Mutex<RefCell<Vec<Option<u8>, M>>>,
}

impl<P, const M: usize> Endstop<P, M> {
    /// Create an unconfigured record with no pin and no slots.
    pub const fn vacant() -> Self {
        Self {
            oid: Mutex::new(Cell::new(0)),
            wake_time: Mutex::new(Cell::new(0)),
            rest_ticks: Mutex::new(Cell::new(0)),
            pin: Mutex::new(RefCell::new(None)),
            flags: FlagWord::new(),
            steppers: Mutex::new(RefCell::new(Vec::new())),
        }
    }
}

impl<P, const M: usize> Endstop<P, M>
where
    P: InputPin,
{
    /// Create a disarmed endstop with `stepper_count` unbound slots.
    ///
    /// # Errors
    ///
    /// Fails with [`ShutdownReason::StepperCountTooLarge`] above the slot capacity `M`.
    pub fn new(oid: u8, pin: P, stepper_count: u8) -> Result<Self> {
        let endstop = Self::vacant();
        endstop.configure(oid, pin, stepper_count)?;
        Ok(endstop)
    }

    /// (Re)initialize the record: new id and pin, unbound slots, flags clear.
    ///
    /// On error the record is left as it was.
    pub fn configure(&self, oid: u8, pin: P, stepper_count: u8) -> Result<()> {
        let mut slots = Vec::new();
        slots
            .resize(usize::from(stepper_count), None)
            .map_err(|_| ShutdownReason::StepperCountTooLarge)?;

        critical_section::with(|cs| {
            self.oid.borrow(cs).set(oid);
            self.wake_time.borrow(cs).set(0);
            self.rest_ticks.borrow(cs).set(0);
            *self.pin.borrow_ref_mut(cs) = Some(pin);
            *self.steppers.borrow_ref_mut(cs) = slots;
            self.flags.store(EndstopFlags::empty());
        });
        Ok(())
    }

    /// Get the object id.
    #[inline]
    pub fn oid(&self) -> u8 {
        critical_section::with(|cs| self.oid.borrow(cs).get())
    }

    /// Get the number of stepper slots.
    pub fn stepper_count(&self) -> u8 {
        critical_section::with(|cs| self.steppers.borrow_ref(cs).len() as u8)
    }

    /// Copy of the stepper slots in index order; `None` marks an unbound slot.
    pub fn steppers(&self) -> Vec<Option<u8>, M> {
        critical_section::with(|cs| self.steppers.borrow_ref(cs).clone())
    }

    /// Wake time of the current or last debounce check.
    pub fn wake_time(&self) -> Clock {
        critical_section::with(|cs| self.wake_time.borrow(cs).get())
    }

    /// Poll interval in ticks.
    pub fn rest_ticks(&self) -> u32 {
        critical_section::with(|cs| self.rest_ticks.borrow(cs).get())
    }

    /// Snapshot of the status bits.
    #[inline]
    pub fn flags(&self) -> EndstopFlags {
        self.flags.load()
    }

    /// Check if homing is armed.
    #[inline]
    pub fn is_homing(&self) -> bool {
        self.flags().contains(EndstopFlags::HOMING_ACTIVE)
    }

    /// Check if a trip is waiting to be reported.
    #[inline]
    pub fn report_pending(&self) -> bool {
        self.flags().contains(EndstopFlags::REPORT_PENDING)
    }

    /// Bind stepper `stepper_oid` to slot `pos`, replacing any previous binding.
    ///
    /// # Errors
    ///
    /// - [`ShutdownReason::StepperPastMaximum`] if `pos` is not below the stepper count
    /// - [`ShutdownReason::InvalidOidType`] if no such stepper is registered
    pub fn set_stepper<R>(&self, pos: u8, stepper_oid: u8, registry: &R) -> Result<()>
    where
        R: StepperRegistry + ?Sized,
    {
        if usize::from(pos) >= usize::from(self.stepper_count()) {
            return Err(ShutdownReason::StepperPastMaximum.into());
        }
        if !registry.contains(stepper_oid) {
            return Err(ShutdownReason::InvalidOidType.into());
        }
        critical_section::with(|cs| {
            if let Some(slot) = self.steppers.borrow_ref_mut(cs).get_mut(usize::from(pos)) {
                *slot = Some(stepper_oid);
            }
        });
        Ok(())
    }

    /// Arm or disarm homing.
    ///
    /// Any pending check is cancelled first. With `rest_ticks == 0` the endstop
    /// is disarmed: all flags are cleared, including an unreported trip, and
    /// nothing is scheduled. Otherwise the first check fires at `clock` and
    /// trips on `pin_value`.
    pub fn home<S>(
        &self,
        sched: &mut S,
        clock: Clock,
        rest_ticks: u32,
        pin_value: bool,
    ) -> Result<()>
    where
        S: Scheduler + ?Sized,
    {
        let oid = self.oid();
        sched.del_timer(oid);
        critical_section::with(|cs| self.rest_ticks.borrow(cs).set(rest_ticks));
        if rest_ticks == 0 {
            self.flags.store(EndstopFlags::empty());
            debug!("endstop {}: disarmed", oid);
            return Ok(());
        }

        let mut flags = EndstopFlags::HOMING_ACTIVE;
        if pin_value {
            flags |= EndstopFlags::PIN_ACTIVE_HIGH;
        }
        critical_section::with(|cs| {
            self.wake_time.borrow(cs).set(clock);
            self.flags.store(flags);
        });
        sched.add_timer(oid, clock)?;
        debug!(
            "endstop {}: homing from clock {} every {} ticks, trigger {}",
            oid,
            clock,
            rest_ticks,
            pin_value
        );
        Ok(())
    }

    /// Debounce check, run by the scheduler at [`wake_time`](Self::wake_time).
    ///
    /// Reads the pin once. On a mismatch the next check is placed one rest
    /// interval after the previous target, not after the current time. On a
    /// match the steppers are stopped and the timer finishes.
    pub fn on_timer<R>(&self, registry: &R) -> TimerAction
    where
        R: StepperRegistry + ?Sized,
    {
        let active_high = self.flags.load().contains(EndstopFlags::PIN_ACTIVE_HIGH);
        match self.sample() {
            Some(level) if level != active_high => {
                let next = critical_section::with(|cs| {
                    let wake_time = self.wake_time.borrow(cs);
                    let next = wake_time
                        .get()
                        .wrapping_add(self.rest_ticks.borrow(cs).get());
                    wake_time.set(next);
                    next
                });
                trace!("endstop {}: no match, next check {}", self.oid(), next);
                TimerAction::Reschedule(next)
            }
            Some(_) => {
                self.stop_steppers(registry);
                info!("endstop {}: triggered at clock {}", self.oid(), self.wake_time());
                TimerAction::Done
            }
            None => {
                // An unreadable switch can not confirm the axis is clear.
                self.stop_steppers(registry);
                error!("endstop {}: input read failed, motion halted", self.oid());
                TimerAction::Done
            }
        }
    }

    /// Latch the trip and stop every bound stepper, highest slot first.
    fn stop_steppers<R>(&self, registry: &R)
    where
        R: StepperRegistry + ?Sized,
    {
        critical_section::with(|cs| {
            self.flags.store(EndstopFlags::REPORT_PENDING);
            for stepper in self.steppers.borrow_ref(cs).iter().rev().flatten() {
                registry.stop(*stepper);
            }
        });
    }

    /// Cancel homing and stop all bound steppers without latching a report.
    ///
    /// Used when the firmware shuts down.
    pub fn halt<S, R>(&self, sched: &mut S, registry: &R)
    where
        S: Scheduler + ?Sized,
        R: StepperRegistry + ?Sized,
    {
        sched.del_timer(self.oid());
        critical_section::with(|cs| {
            self.flags
                .update(|flags| flags.remove(EndstopFlags::HOMING_ACTIVE));
            for stepper in self.steppers.borrow_ref(cs).iter().rev().flatten() {
                registry.stop(*stepper);
            }
        });
    }

    /// Build a state report and clear the pending flag.
    ///
    /// Interrupts are masked only while the flags are swapped and while the
    /// pin is sampled, never while the caller sends the report. The pin may
    /// differ from the level that caused the trip.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PinError`] if the pin can not be read. A pending trip
    /// stays pending in that case.
    pub fn report(&self) -> Result<EndstopState> {
        let flags = self.flags.take_report();
        let Some(pin) = self.sample() else {
            if flags.contains(EndstopFlags::REPORT_PENDING) {
                self.flags
                    .update(|f| f.insert(EndstopFlags::REPORT_PENDING));
            }
            return Err(Error::PinError);
        };

        Ok(EndstopState {
            oid: self.oid(),
            homing: flags.contains(EndstopFlags::HOMING_ACTIVE),
            pin,
        })
    }

    /// Current pin level, `None` if unconfigured or unreadable.
    fn sample(&self) -> Option<bool> {
        critical_section::with(|cs| {
            self.pin
                .borrow_ref_mut(cs)
                .as_mut()
                .and_then(|pin| pin.is_high().ok())
        })
    }
}
