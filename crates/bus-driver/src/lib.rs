//! Clocked bus transaction driver for cycle-accurate circuit models.

/// Named port list shared by every circuit model.
pub mod signal;
pub use signal::{Direction, Signal, SIGNAL_COUNT};

/// Circuit model and factory traits implemented by simulated hardware.
pub mod circuit;
pub use circuit::{CircuitFactory, CircuitModel};

/// Per-half-cycle trace sinks, in memory and VCD.
pub mod trace;
pub use trace::{MemoryTrace, SignalValues, TraceSample, TraceSink, VcdWriter};

/// Driver error taxonomy.
pub mod error;
pub use error::{ConfigIssue, DriverError};

/// Driver timing configuration and defaults.
pub mod config;
pub use config::{
    DriverConfig, DEFAULT_BUS_TIMEOUT_CYCLES, DEFAULT_READ_LATENCY_CYCLES,
    DEFAULT_RESET_HALF_CYCLES, DEFAULT_SHOT_TIMEOUT_CYCLES,
};

/// Sponge register map and status decoding.
pub mod regmap;
pub use regmap::{
    StatusFlags, CONTROL_ABSORB_LAST, CONTROL_ADDR, CONTROL_CLEAR, DATA_ADDR, DEFAULT_RATE,
    RATE_ADDR, STATUS_ADDR,
};

/// Half-cycle clock stepping over one owned circuit instance.
pub mod clock;
pub use clock::{ClockPhase, ClockedModel};

/// Active-low reset pulse sequencing.
pub mod reset;
pub use reset::ResetSequencer;

/// Registered-ready bus handshake.
pub mod bus;
pub use bus::{BusDirection, BusOutcome, BusTransaction, BusTransactor};

/// Sponge absorption, squeeze and status sequences.
pub mod absorb;
pub use absorb::{absorb_plan, AbsorbReport, AbsorbWrite, AbsorptionProtocol};

/// Stateless start/done invocation.
pub mod single_shot;
pub use single_shot::{invoke_single_shot, ShotReport, SingleShotInvoker};

/// Session lifecycle with exclusive instance ownership.
pub mod session;
pub use session::{ResetState, Session};

/// Behavioural reference circuits for tests and demos.
pub mod circuits;
pub use circuits::{ShotCircuit, SpongeBusCircuit};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
