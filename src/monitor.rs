//! Monitor facade tying endstops to the host, the timer and the steppers.
//!
//! `EndstopMonitor` owns the object table and the timer queue and exposes the
//! three entry points a firmware main needs:
//! - [`handle`](EndstopMonitor::handle) for host commands
//! - [`dispatch_timers`](EndstopMonitor::dispatch_timers) from the timer interrupt
//! - [`run_task`](EndstopMonitor::run_task) from the main loop
//!
//! All three take `&self`, so one monitor can sit in a `static` and be
//! reached from both contexts. State is split per field into
//! `critical_section::Mutex` cells and interrupts are only masked for the
//! short spans that touch them.

use core::cell::{Cell, RefCell};

use critical_section::Mutex;

use crate::clock::Clock;
use crate::command::{Command, Response};
use crate::config::{validate_config, MonitorConfig};
use crate::endstop::{Endstop, MAX_STEPPER_SLOTS};
use crate::error::{ConfigError, Error, Result, ShutdownReason};
use crate::hal::{PinSetup, StepperRegistry};
use crate::registry::{ObjectTable, MAX_ENDSTOPS};
use crate::sched::{PeriodicCheck, Scheduler, TimerAction, TimerQueue};

/// Endstop monitor for one firmware image.
///
/// Generic over:
/// - `G`: Board GPIO factory (must implement [`PinSetup`])
/// - `S`: Stepper table (must implement [`StepperRegistry`])
/// - `N`: Endstop capacity, also the timer queue size
/// - `M`: Stepper slot capacity per endstop
///
/// The first fatal error latches the monitor into shutdown: every bound
/// stepper is stopped, all endstop timers are cancelled and further commands
/// are refused until the firmware is reset.
pub struct EndstopMonitor<G, S, const N: usize = MAX_ENDSTOPS, const M: usize = MAX_STEPPER_SLOTS>
where
    G: PinSetup,
    S: StepperRegistry,
{
    /// Build-time tuning.
    config: MonitorConfig,

    /// GPIO factory for new endstops.
    pins: Mutex<RefCell<G>>,

    /// Steppers that endstops may bind and stop.
    steppers: S,

    /// Pending debounce checks, keyed by endstop oid.
    timers: Mutex<RefCell<TimerQueue<N>>>,

    /// Configured endstops.
    endstops: ObjectTable<G::Input, N, M>,

    /// Rate limit for the report sweep.
    sweep: Mutex<RefCell<PeriodicCheck>>,

    /// Latched shutdown reason.
    shutdown: Mutex<Cell<Option<ShutdownReason>>>,
}

impl<G, S, const N: usize, const M: usize> EndstopMonitor<G, S, N, M>
where
    G: PinSetup,
    S: StepperRegistry,
{
    /// Create a monitor with no endstops configured.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` fails validation or allows
    /// more stepper slots than `M`.
    pub fn new(config: MonitorConfig, pins: G, steppers: S) -> Result<Self> {
        validate_config(&config)?;
        if usize::from(config.max_stepper_slots) > M {
            return Err(ConfigError::InvalidMaxStepperSlots(config.max_stepper_slots).into());
        }
        let sweep_ticks = config
            .sweep_interval_ticks()
            .ok_or(ConfigError::InvalidSweepInterval(config.sweep_interval_ms))?;

        Ok(Self {
            config,
            pins: Mutex::new(RefCell::new(pins)),
            steppers,
            timers: Mutex::new(RefCell::new(TimerQueue::new())),
            endstops: ObjectTable::new(),
            sweep: Mutex::new(RefCell::new(PeriodicCheck::new(sweep_ticks))),
            shutdown: Mutex::new(Cell::new(None)),
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Get the stepper table.
    pub fn steppers(&self) -> &S {
        &self.steppers
    }

    /// Snapshot of the timer queue.
    pub fn timers(&self) -> TimerQueue<N> {
        critical_section::with(|cs| self.timers.borrow_ref(cs).clone())
    }

    /// Get the endstop table.
    pub fn endstops(&self) -> &ObjectTable<G::Input, N, M> {
        &self.endstops
    }

    /// Look up an endstop by object id.
    pub fn endstop(&self, oid: u8) -> Option<&Endstop<G::Input, M>> {
        self.endstops.get(oid)
    }

    /// Latched shutdown reason, if the monitor is shut down.
    pub fn shutdown_reason(&self) -> Option<ShutdownReason> {
        critical_section::with(|cs| self.shutdown.borrow(cs).get())
    }

    /// Check if the monitor is shut down.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown_reason().is_some()
    }

    /// Execute a host command.
    ///
    /// Returns the response to send back, if the command produces one.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyShutdown`] once the monitor is shut down
    /// - [`Error::Shutdown`] if this command caused the shutdown
    /// - [`Error::PinError`] if a query can not read its pin
    pub fn handle(&self, command: Command) -> Result<Option<Response>> {
        if let Some(reason) = self.shutdown_reason() {
            return Err(Error::AlreadyShutdown(reason));
        }

        trace!("{} oid={}", command.name(), command.oid());
        let result = self.execute(command);
        if let Err(Error::Shutdown(reason)) = result {
            self.enter_shutdown(reason);
        }
        result
    }

    fn execute(&self, command: Command) -> Result<Option<Response>> {
        match command {
            Command::ConfigEndStop {
                oid,
                pin,
                pull,
                stepper_count,
            } => {
                if stepper_count > self.config.max_stepper_slots {
                    return Err(ShutdownReason::StepperCountTooLarge.into());
                }
                if self.endstops.contains(oid) {
                    return Err(ShutdownReason::CantAssignOid.into());
                }
                let input =
                    critical_section::with(|cs| self.pins.borrow_ref_mut(cs).setup_input(pin, pull))?;
                self.endstops.alloc(oid, input, stepper_count)?;
                debug!(
                    "endstop {}: configured on pin {} with {} stepper slots",
                    oid,
                    pin,
                    stepper_count
                );
                Ok(None)
            }
            Command::SetStepper {
                oid,
                pos,
                stepper_oid,
            } => {
                self.endstops
                    .lookup(oid)?
                    .set_stepper(pos, stepper_oid, &self.steppers)?;
                Ok(None)
            }
            Command::Home {
                oid,
                clock,
                rest_ticks,
                pin_value,
            } => {
                let endstop = self.endstops.lookup(oid)?;
                // Re-arming must not interleave with a check of the same endstop.
                critical_section::with(|cs| {
                    let mut timers = self.timers.borrow_ref_mut(cs);
                    endstop.home(&mut *timers, clock, rest_ticks, pin_value)
                })?;
                Ok(None)
            }
            Command::Query { oid } => {
                let state = self.endstops.lookup(oid)?.report()?;
                Ok(Some(state.into()))
            }
        }
    }

    /// Run every endstop check due at `now`.
    ///
    /// Call from the timer interrupt. Each check runs to completion inside a
    /// critical section and the returned [`TimerAction`] decides whether it
    /// is queued again.
    pub fn dispatch_timers(&self, now: Clock) {
        loop {
            let fired = critical_section::with(|cs| {
                let mut timers = self.timers.borrow_ref_mut(cs);
                let (oid, _) = timers.pop_due(now)?;
                let Some(endstop) = self.endstops.get(oid) else {
                    return Some(Ok(()));
                };
                match endstop.on_timer(&self.steppers) {
                    TimerAction::Done => Some(Ok(())),
                    // The entry was popped above, so there is always room.
                    TimerAction::Reschedule(waketime) => Some(timers.add_timer(oid, waketime)),
                }
            });
            match fired {
                None => return,
                Some(Err(Error::Shutdown(reason))) => {
                    self.enter_shutdown(reason);
                    return;
                }
                Some(_) => {}
            }
        }
    }

    /// Periodic housekeeping; call from the main loop.
    ///
    /// At most once per sweep interval, reports every endstop with an
    /// unreported trip through `emit`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PinError`] if a report can not read its pin. The
    /// affected trip stays pending for the next sweep.
    pub fn run_task<F>(&self, now: Clock, emit: F) -> Result<()>
    where
        F: FnMut(Response),
    {
        let due = critical_section::with(|cs| self.sweep.borrow_ref_mut(cs).poll(now));
        if !due {
            return Ok(());
        }
        self.sweep_reports(emit)
    }

    /// Report every endstop with an unreported trip, ignoring the sweep interval.
    ///
    /// `emit` runs with interrupts enabled; timer checks may fire while it
    /// sends.
    ///
    /// # Errors
    ///
    /// See [`run_task`](Self::run_task).
    pub fn sweep_reports<F>(&self, mut emit: F) -> Result<()>
    where
        F: FnMut(Response),
    {
        let mut result = Ok(());
        for endstop in self.endstops.iter() {
            if !endstop.report_pending() {
                continue;
            }
            match endstop.report() {
                Ok(state) => {
                    let response = Response::from(state);
                    trace!("{} oid={}", response.name(), state.oid);
                    emit(response);
                }
                Err(e) => {
                    warn!("endstop {}: report deferred, pin unreadable", endstop.oid());
                    result = Err(e);
                }
            }
        }
        result
    }

    /// Latch shutdown: cancel all checks and stop every bound stepper.
    fn enter_shutdown(&self, reason: ShutdownReason) {
        let first = critical_section::with(|cs| {
            let shutdown = self.shutdown.borrow(cs);
            if shutdown.get().is_some() {
                return false;
            }
            shutdown.set(Some(reason));
            true
        });
        if !first {
            return;
        }

        error!("shutdown: {}", reason.message());
        critical_section::with(|cs| {
            let mut timers = self.timers.borrow_ref_mut(cs);
            for endstop in self.endstops.iter() {
                endstop.halt(&mut *timers, &self.steppers);
            }
        });
    }
}
