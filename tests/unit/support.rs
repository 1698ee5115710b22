//! Test doubles for boards and steppers.

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorKind, ErrorType, InputPin};
use endstop_monitor::{
    EndstopMonitor, MonitorConfig, PinSetup, Pull, Result, ShutdownReason, StepperRegistry,
};

/// Switch input driven by the test.
#[derive(Clone, Default)]
pub struct SimPin {
    level: Rc<Cell<bool>>,
    reads: Rc<Cell<u32>>,
}

impl SimPin {
    pub fn set(&self, high: bool) {
        self.level.set(high);
    }

    pub fn reads(&self) -> u32 {
        self.reads.get()
    }
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> core::result::Result<bool, Infallible> {
        self.reads.set(self.reads.get() + 1);
        Ok(self.level.get())
    }

    fn is_low(&mut self) -> core::result::Result<bool, Infallible> {
        self.is_high().map(|high| !high)
    }
}

/// Board with 16 simulated pins.
#[derive(Default)]
pub struct SimBoard {
    pub pins: [SimPin; 16],
}

impl PinSetup for SimBoard {
    type Input = SimPin;

    fn setup_input(&mut self, pin: u8, _pull: Pull) -> Result<SimPin> {
        self.pins
            .get(usize::from(pin))
            .cloned()
            .ok_or_else(|| ShutdownReason::InvalidInputPin.into())
    }
}

/// Input whose reads can be made to fail.
#[derive(Clone, Default)]
pub struct FlakyPin {
    pub broken: Rc<Cell<bool>>,
    pub level: Rc<Cell<bool>>,
}

impl ErrorType for FlakyPin {
    type Error = ErrorKind;
}

impl InputPin for FlakyPin {
    fn is_high(&mut self) -> core::result::Result<bool, ErrorKind> {
        if self.broken.get() {
            Err(ErrorKind::Other)
        } else {
            Ok(self.level.get())
        }
    }

    fn is_low(&mut self) -> core::result::Result<bool, ErrorKind> {
        self.is_high().map(|high| !high)
    }
}

/// Board that hands out one shared flaky pin for every request.
#[derive(Default)]
pub struct FlakyBoard {
    pub pin: FlakyPin,
}

impl PinSetup for FlakyBoard {
    type Input = FlakyPin;

    fn setup_input(&mut self, _pin: u8, _pull: Pull) -> Result<FlakyPin> {
        Ok(self.pin.clone())
    }
}

/// Stepper table that records stop requests.
#[derive(Default)]
pub struct SimSteppers {
    known: Vec<u8>,
    stopped: RefCell<Vec<u8>>,
}

impl SimSteppers {
    pub fn with(known: &[u8]) -> Self {
        Self {
            known: known.to_vec(),
            stopped: RefCell::default(),
        }
    }

    pub fn stopped(&self) -> Vec<u8> {
        let mut stopped = self.stopped.borrow().clone();
        stopped.sort_unstable();
        stopped
    }
}

impl StepperRegistry for SimSteppers {
    fn contains(&self, oid: u8) -> bool {
        self.known.contains(&oid)
    }

    fn stop(&self, oid: u8) {
        self.stopped.borrow_mut().push(oid);
    }
}

pub type SimMonitor = EndstopMonitor<SimBoard, SimSteppers, 8>;

/// Monitor with default configuration over a simulated board.
///
/// Returns handles to the board pins so tests can drive switch levels.
pub fn sim_monitor(known_steppers: &[u8]) -> (SimMonitor, [SimPin; 16]) {
    let board = SimBoard::default();
    let pins = board.pins.clone();
    let monitor = EndstopMonitor::new(
        MonitorConfig::default(),
        board,
        SimSteppers::with(known_steppers),
    )
    .expect("default config is valid");
    (monitor, pins)
}
