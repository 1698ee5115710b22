//! Object table for configured endstops.

use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal::digital::InputPin;
use heapless::FnvIndexMap;

use crate::endstop::{Endstop, MAX_STEPPER_SLOTS};
use crate::error::{Result, ShutdownReason};

/// Maximum number of endstops in the table (power of two).
pub const MAX_ENDSTOPS: usize = 16;

/// Endstops indexed by object id.
///
/// All `N` records are reserved up front and handed out in allocation order,
/// so a `&Endstop` stays valid while later endstops are configured. Records
/// live until firmware reset; there is no removal.
pub struct ObjectTable<P, const N: usize = MAX_ENDSTOPS, const M: usize = MAX_STEPPER_SLOTS> {
    /// Object id to slot position.
    index: Mutex<RefCell<FnvIndexMap<u8, usize, N>>>,

    /// Reserved records; the first `index.len()` are configured.
    slots: [Endstop<P, M>; N],
}

impl<P: InputPin, const N: usize, const M: usize> Default for ObjectTable<P, N, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: InputPin, const N: usize, const M: usize> ObjectTable<P, N, M> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            index: Mutex::new(RefCell::new(FnvIndexMap::new())),
            slots: core::array::from_fn(|_| Endstop::vacant()),
        }
    }

    /// Configure the next free record as endstop `oid`.
    ///
    /// # Errors
    ///
    /// - [`ShutdownReason::CantAssignOid`] if the id is taken or the table is full
    /// - [`ShutdownReason::StepperCountTooLarge`] if `stepper_count` exceeds `M`
    pub fn alloc(&self, oid: u8, pin: P, stepper_count: u8) -> Result<&Endstop<P, M>> {
        let slot = critical_section::with(|cs| {
            let index = self.index.borrow_ref(cs);
            if index.contains_key(&oid) {
                return Err(ShutdownReason::CantAssignOid);
            }
            Ok(index.len())
        })?;
        let endstop = self.slots.get(slot).ok_or(ShutdownReason::CantAssignOid)?;
        endstop.configure(oid, pin, stepper_count)?;

        critical_section::with(|cs| {
            self.index
                .borrow_ref_mut(cs)
                .insert(oid, slot)
                .map_err(|_| ShutdownReason::CantAssignOid)
        })?;
        Ok(endstop)
    }

    /// Look up an endstop by object id.
    pub fn get(&self, oid: u8) -> Option<&Endstop<P, M>> {
        let slot = critical_section::with(|cs| self.index.borrow_ref(cs).get(&oid).copied())?;
        self.slots.get(slot)
    }

    /// Look up an endstop that a command addresses.
    ///
    /// # Errors
    ///
    /// Fails with [`ShutdownReason::InvalidOidType`] if no endstop has this id.
    pub fn lookup(&self, oid: u8) -> Result<&Endstop<P, M>> {
        self.get(oid)
            .ok_or_else(|| ShutdownReason::InvalidOidType.into())
    }

    /// Check if an endstop with this id exists.
    pub fn contains(&self, oid: u8) -> bool {
        critical_section::with(|cs| self.index.borrow_ref(cs).contains_key(&oid))
    }

    /// Get the number of configured endstops.
    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.index.borrow_ref(cs).len())
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over endstops in configuration order.
    ///
    /// Endstops configured after the call are not visited.
    pub fn iter(&self) -> impl Iterator<Item = &Endstop<P, M>> {
        self.slots.iter().take(self.len())
    }
}
