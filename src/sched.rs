//! Timer scheduling.
//!
//! Timer callbacks never re-queue themselves. They return a [`TimerAction`]
//! and the scheduler decides what happens next, so a timer can never overlap
//! with another firing of itself.

use heapless::Vec;

use crate::clock::{is_before, Clock};
use crate::error::{Result, ShutdownReason};

/// Identifies a timer. Endstop timers use the endstop's object id.
pub type TimerId = u8;

/// Outcome of a timer callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerAction {
    /// Deregister the timer until something schedules it again.
    Done,
    /// Fire again at the given absolute clock.
    Reschedule(Clock),
}

/// Timer subsystem seen from an endstop.
pub trait Scheduler {
    /// Queue `id` to fire at `waketime`.
    ///
    /// A timer that is already queued is moved to the new time.
    ///
    /// # Errors
    ///
    /// Fails with [`ShutdownReason::TimerQueueFull`] if there is no room.
    fn add_timer(&mut self, id: TimerId, waketime: Clock) -> Result<()>;

    /// Remove `id` from the queue. Removing an unqueued timer is a no-op.
    fn del_timer(&mut self, id: TimerId);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    id: TimerId,
    waketime: Clock,
}

/// Fixed-capacity timer queue ordered by wake time.
///
/// Entries stay sorted with wrap-aware comparison; timers with equal wake
/// times fire in the order they were added.
#[derive(Debug, Clone, Default)]
pub struct TimerQueue<const N: usize> {
    entries: Vec<Entry, N>,
}

impl<const N: usize> TimerQueue<N> {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Pop the earliest timer if its wake time is at or before `now`.
    pub fn pop_due(&mut self, now: Clock) -> Option<(TimerId, Clock)> {
        let first = self.entries.first()?;
        if is_before(now, first.waketime) {
            return None;
        }
        let entry = self.entries.remove(0);
        Some((entry.id, entry.waketime))
    }

    /// Wake time of the earliest queued timer.
    pub fn next_waketime(&self) -> Option<Clock> {
        self.entries.first().map(|e| e.waketime)
    }

    /// Wake time of `id`, if queued.
    pub fn waketime(&self, id: TimerId) -> Option<Clock> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.waketime)
    }

    /// Check if `id` is queued.
    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Number of queued timers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no timer is queued.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<const N: usize> Scheduler for TimerQueue<N> {
    fn add_timer(&mut self, id: TimerId, waketime: Clock) -> Result<()> {
        self.del_timer(id);
        let pos = self
            .entries
            .iter()
            .position(|e| is_before(waketime, e.waketime))
            .unwrap_or(self.entries.len());
        self.entries
            .insert(pos, Entry { id, waketime })
            .map_err(|_| ShutdownReason::TimerQueueFull)?;
        Ok(())
    }

    fn del_timer(&mut self, id: TimerId) {
        self.entries.retain(|e| e.id != id);
    }
}

/// Rate limiter for housekeeping tasks.
///
/// [`poll`](Self::poll) returns `true` at most once per interval.
#[derive(Debug, Clone, Copy)]
pub struct PeriodicCheck {
    interval: u32,
    next: Option<Clock>,
}

impl PeriodicCheck {
    /// Create a check that fires every `interval` ticks, starting with the first poll.
    pub const fn new(interval: u32) -> Self {
        Self {
            interval,
            next: None,
        }
    }

    /// Interval in ticks.
    #[inline]
    pub fn interval(&self) -> u32 {
        self.interval
    }

    /// Returns `true` if the interval has elapsed and arms the next period.
    pub fn poll(&mut self, now: Clock) -> bool {
        if let Some(next) = self.next {
            if is_before(now, next) {
                return false;
            }
        }
        self.next = Some(now.wrapping_add(self.interval));
        true
    }
}
