//! Test doubles shared by unit tests.

use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::digital::{ErrorType, InputPin};

use crate::error::{Result, ShutdownReason};
use crate::hal::{PinSetup, Pull, StepperRegistry};

/// Switch input whose level the test drives through a shared cell.
#[derive(Clone, Default)]
pub struct TestPin(pub Rc<Cell<bool>>);

impl TestPin {
    pub fn set(&self, high: bool) {
        self.0.set(high);
    }
}

impl ErrorType for TestPin {
    type Error = Infallible;
}

impl InputPin for TestPin {
    fn is_high(&mut self) -> core::result::Result<bool, Infallible> {
        Ok(self.0.get())
    }

    fn is_low(&mut self) -> core::result::Result<bool, Infallible> {
        Ok(!self.0.get())
    }
}

/// Board with pins 0..16, all sharing per-pin level cells.
#[derive(Default)]
pub struct TestBoard {
    pub pins: [TestPin; 16],
    pub setups: Vec<(u8, Pull)>,
}

impl PinSetup for TestBoard {
    type Input = TestPin;

    fn setup_input(&mut self, pin: u8, pull: Pull) -> Result<TestPin> {
        let input = self
            .pins
            .get(usize::from(pin))
            .cloned()
            .ok_or(ShutdownReason::InvalidInputPin)?;
        self.setups.push((pin, pull));
        Ok(input)
    }
}

/// Stepper table that records every stop request.
#[derive(Default)]
pub struct TestSteppers {
    pub known: Vec<u8>,
    pub stopped: RefCell<Vec<u8>>,
}

impl TestSteppers {
    pub fn with(known: &[u8]) -> Self {
        Self {
            known: known.to_vec(),
            ..Default::default()
        }
    }

    pub fn stopped(&self) -> Vec<u8> {
        self.stopped.borrow().clone()
    }
}

impl StepperRegistry for TestSteppers {
    fn contains(&self, oid: u8) -> bool {
        self.known.contains(&oid)
    }

    fn stop(&self, oid: u8) {
        self.stopped.borrow_mut().push(oid);
    }
}
