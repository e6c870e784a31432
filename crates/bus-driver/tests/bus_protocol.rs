//! Bus handshake coverage against the sponge reference circuit.

use bus_driver::{
    BusOutcome, BusTransaction, BusTransactor, CircuitModel, ClockPhase, ClockedModel,
    DriverConfig, DriverError, ResetSequencer, Session, ShotCircuit, Signal, SpongeBusCircuit,
    DATA_ADDR, RATE_ADDR, SIGNAL_COUNT, STATUS_ADDR,
};
use proptest::prelude::*;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

/// Never raises `bus_ready`; remembers every line it was driven with.
#[derive(Default)]
struct Deaf {
    values: [u64; SIGNAL_COUNT],
}

impl CircuitModel for Deaf {
    fn set(&mut self, signal: Signal, value: u64) {
        self.values[signal.index()] = value;
    }

    fn eval(&mut self) {}

    fn get(&self, signal: Signal) -> u64 {
        if signal == Signal::BusReady {
            0
        } else {
            self.values[signal.index()]
        }
    }
}

fn sponge_session(config: DriverConfig) -> Session<fn() -> SpongeBusCircuit> {
    Session::open(SpongeBusCircuit::new as fn() -> SpongeBusCircuit, config)
        .expect("valid config")
}

fn read_value(session: &mut Session<fn() -> SpongeBusCircuit>, address: u32) -> u32 {
    session
        .bus_read(address)
        .and_then(BusTransaction::value)
        .expect("sponge always acknowledges")
}

proptest! {
    #[test]
    fn written_registers_read_back(
        address in any::<u32>().prop_filter("status and data are not plain storage", |a| {
            *a != STATUS_ADDR && *a != DATA_ADDR
        }),
        data in any::<u32>(),
    ) {
        let mut session = sponge_session(DriverConfig::default());
        let write = session.bus_write(address, data).expect("ready session");
        prop_assert_eq!(write.outcome, BusOutcome::Acked);
        prop_assert_eq!(read_value(&mut session, address), data);
    }

    #[test]
    fn later_writes_overwrite_earlier_ones(first in any::<u32>(), second in any::<u32>()) {
        let mut session = sponge_session(DriverConfig::default());
        session.bus_write(RATE_ADDR, first).expect("ready session");
        session.bus_write(RATE_ADDR, second).expect("ready session");
        prop_assert_eq!(read_value(&mut session, RATE_ADDR), second);
    }
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(5)]
fn reads_with_latency_cover_the_data_register_delay(#[case] latency: u16) {
    let config = DriverConfig {
        read_latency_cycles: latency,
        ..DriverConfig::default()
    };
    let mut session = sponge_session(config);
    session.bus_write(RATE_ADDR, 0x5555_AAAA).expect("ready session");
    assert_eq!(read_value(&mut session, RATE_ADDR), 0x5555_AAAA);
}

#[test]
fn zero_latency_read_returns_previous_reply() {
    let config = DriverConfig {
        read_latency_cycles: 0,
        ..DriverConfig::default()
    };
    let mut session = sponge_session(config);
    session.bus_write(RATE_ADDR, 21).expect("ready session");
    session.bus_write(0x40, 7).expect("ready session");

    assert_eq!(read_value(&mut session, RATE_ADDR), 0);
    assert_eq!(read_value(&mut session, 0x40), 21);
}

#[test]
fn read_costs_one_poll_one_latency_and_one_settle_cycle() {
    let mut session = sponge_session(DriverConfig::default());
    let start = session.time();
    let read = session.bus_read(RATE_ADDR).expect("ready session");
    assert_eq!(read.cycles, 1);
    assert_eq!(session.time() - start, 6);
}

#[rstest]
#[case(1)]
#[case(7)]
#[case(100)]
fn timeout_polls_exactly_the_budget_and_releases_the_bus(#[case] budget: u16) {
    let config = DriverConfig {
        bus_timeout_cycles: budget,
        ..DriverConfig::default()
    };
    let mut session = Session::open(Deaf::default, config).expect("valid config");
    let start = session.time();

    let write = session.bus_write(0x10, 3).expect("ready session");

    assert_eq!(write.outcome, BusOutcome::TimedOut);
    assert_eq!(write.cycles, budget);
    assert_eq!(session.time() - start, 2 * u64::from(budget) + 2);
    let model = session.model().expect("live instance");
    assert_eq!(model.get(Signal::BusEnable), 0);
    assert_eq!(model.get(Signal::BusWrite), 0);
    assert_eq!(
        write.acked(),
        Err(DriverError::Timeout {
            address: Some(0x10),
            cycles: u32::from(budget)
        })
    );
}

#[test]
fn timed_out_read_clears_the_request_lines() {
    let mut session = Session::open(Deaf::default, DriverConfig::default()).expect("valid config");
    let read = session.bus_read(STATUS_ADDR).expect("ready session");
    assert!(!read.is_acked());
    assert_eq!(read.data, 0);
    let model = session.model().expect("live instance");
    assert_eq!(model.get(Signal::BusEnable), 0);
    assert_eq!(model.get(Signal::BusWrite), 0);
}

#[test]
fn timeout_does_not_poison_the_session() {
    let mut session = Session::open(ShotCircuit::default, DriverConfig::default())
        .expect("valid config");
    let first = session.bus_write(RATE_ADDR, 1).expect("ready session");
    let second = session.bus_write(RATE_ADDR, 1).expect("ready session");
    assert!(!first.is_acked());
    assert!(!second.is_acked());
    assert!(session.is_ready());
}

#[test]
fn transactor_rejects_high_phase_without_driving_lines() {
    let mut clocked = ClockedModel::new(SpongeBusCircuit::new());
    ResetSequencer::default().run(&mut clocked);
    clocked.advance_half_cycle();
    assert_eq!(clocked.phase(), ClockPhase::High);

    let result = BusTransactor::default().read(&mut clocked, RATE_ADDR);

    assert_eq!(result, Err(DriverError::ProtocolViolation));
    assert!(clocked.model().accesses().is_empty());
}

#[test]
fn repeated_reset_on_one_instance_clears_written_registers() {
    let mut clocked = ClockedModel::new(SpongeBusCircuit::new());
    let reset = ResetSequencer::default();
    let bus = BusTransactor::default();

    reset.run(&mut clocked);
    bus.write(&mut clocked, RATE_ADDR, 9).expect("low phase");
    bus.write(&mut clocked, 0x80, 9).expect("low phase");
    reset.run(&mut clocked);

    assert_eq!(clocked.read_output(Signal::BusReady), 0);
    assert_eq!(clocked.read_output(Signal::BusRdata), 0);
    for address in [RATE_ADDR, 0x80] {
        let read = bus.read(&mut clocked, address).expect("low phase");
        assert_eq!(read.value(), Ok(0));
    }
}
