//! Unit tests for stepper slot binding and the stop sequence.

use endstop_monitor::{
    Command, ConfigError, EndstopMonitor, Error, MonitorConfig, Pull, ShutdownReason,
};
use proptest::prelude::*;

use super::support::{sim_monitor, SimBoard, SimSteppers};

fn config(oid: u8, pin: u8, stepper_count: u8) -> Command {
    Command::ConfigEndStop {
        oid,
        pin,
        pull: Pull::Up,
        stepper_count,
    }
}

fn bind(oid: u8, pos: u8, stepper_oid: u8) -> Command {
    Command::SetStepper {
        oid,
        pos,
        stepper_oid,
    }
}

fn home(oid: u8, clock: u32, rest_ticks: u32, pin_value: bool) -> Command {
    Command::Home {
        oid,
        clock,
        rest_ticks,
        pin_value,
    }
}

fn every_stepper() -> Vec<u8> {
    (0..=u8::MAX).collect()
}

proptest! {
    /// Every slot below the capacity binds independently.
    #[test]
    fn bind_within_capacity_succeeds(capacity in any::<u8>()) {
        let (m, _pins) = sim_monitor(&every_stepper());
        m.handle(config(0, 0, capacity)).unwrap();

        for pos in 0..capacity {
            prop_assert!(m.handle(bind(0, pos, capacity - pos)).is_ok());
        }

        let endstop = m.endstop(0).unwrap();
        prop_assert_eq!(endstop.stepper_count(), capacity);
        for (pos, slot) in endstop.steppers().iter().enumerate() {
            prop_assert_eq!(*slot, Some(capacity - pos as u8));
        }
    }

    /// Any slot at or beyond the capacity shuts the monitor down.
    #[test]
    fn bind_past_capacity_is_fatal(capacity in any::<u8>(), excess in any::<u8>()) {
        let (m, _pins) = sim_monitor(&[7]);
        m.handle(config(0, 0, capacity)).unwrap();

        let result = m.handle(bind(0, capacity.saturating_add(excess), 7));
        prop_assert_eq!(result, Err(Error::Shutdown(ShutdownReason::StepperPastMaximum)));
        prop_assert!(m.is_shutdown());
        prop_assert!(m.endstop(0).unwrap().steppers().iter().all(Option::is_none));
    }
}

#[test]
fn test_capacity_beyond_sixteen_slots() {
    let (m, pins) = sim_monitor(&[40, 41]);
    m.handle(config(0, 1, 17)).unwrap();
    m.handle(config(1, 2, u8::MAX)).unwrap();
    m.handle(bind(0, 16, 40)).unwrap();
    m.handle(bind(1, 254, 41)).unwrap();
    assert!(!m.is_shutdown());

    m.handle(home(1, 0, 10, true)).unwrap();
    pins[2].set(true);
    m.dispatch_timers(0);
    assert_eq!(m.steppers().stopped(), [41]);
}

#[test]
fn test_build_slot_capacity_bounds_config() {
    let small = MonitorConfig {
        max_stepper_slots: 4,
        ..Default::default()
    };
    let m: EndstopMonitor<SimBoard, SimSteppers, 4, 4> =
        EndstopMonitor::new(small, SimBoard::default(), SimSteppers::default()).unwrap();
    m.handle(config(0, 0, 4)).unwrap();
    assert_eq!(
        m.handle(config(1, 1, 5)),
        Err(Error::Shutdown(ShutdownReason::StepperCountTooLarge))
    );

    let oversized: Result<EndstopMonitor<SimBoard, SimSteppers, 4, 4>, Error> =
        EndstopMonitor::new(
            MonitorConfig::default(),
            SimBoard::default(),
            SimSteppers::default(),
        );
    assert_eq!(
        oversized.err(),
        Some(Error::Config(ConfigError::InvalidMaxStepperSlots(u8::MAX)))
    );
}

#[test]
fn test_unbound_slot_is_not_an_error() {
    let (m, pins) = sim_monitor(&[]);
    m.handle(config(1, 2, 3)).unwrap();
    m.handle(home(1, 0, 10, true)).unwrap();
    pins[2].set(true);

    m.dispatch_timers(0);

    assert!(!m.is_shutdown());
    assert!(m.steppers().stopped().is_empty());
    assert!(m.endstop(1).unwrap().report_pending());
}

#[test]
fn test_stop_sequence_skips_unbound_slots() {
    let (m, pins) = sim_monitor(&[10, 12]);
    m.handle(config(1, 0, 4)).unwrap();
    m.handle(bind(1, 0, 10)).unwrap();
    m.handle(bind(1, 2, 12)).unwrap();
    m.handle(home(1, 500, 25, true)).unwrap();

    pins[0].set(true);
    m.dispatch_timers(500);

    assert_eq!(m.steppers().stopped(), [10, 12]);
}

#[test]
fn test_rebinding_overwrites_slot() {
    let (m, pins) = sim_monitor(&[3, 4]);
    m.handle(config(0, 0, 1)).unwrap();
    m.handle(bind(0, 0, 3)).unwrap();
    m.handle(bind(0, 0, 4)).unwrap();
    m.handle(home(0, 0, 10, false)).unwrap();

    pins[0].set(false);
    m.dispatch_timers(0);

    assert_eq!(m.steppers().stopped(), [4]);
}

#[test]
fn test_bind_unknown_stepper_is_fatal() {
    let (m, _pins) = sim_monitor(&[1]);
    m.handle(config(0, 0, 2)).unwrap();

    assert_eq!(
        m.handle(bind(0, 1, 9)),
        Err(Error::Shutdown(ShutdownReason::InvalidOidType))
    );
}

#[test]
fn test_zero_capacity_endstop_rejects_every_slot() {
    let (m, _pins) = sim_monitor(&[1]);
    m.handle(config(0, 0, 0)).unwrap();

    assert_eq!(
        m.handle(bind(0, 0, 1)),
        Err(Error::Shutdown(ShutdownReason::StepperPastMaximum))
    );
}
