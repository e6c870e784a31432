//! Stateless start/done invocation against a fresh circuit instance.

use tracing::{debug, warn};

use crate::{
    CircuitFactory, CircuitModel, ClockedModel, DriverConfig, DriverError, ResetSequencer, Signal,
};

/// Result of a completed single-shot invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ShotReport {
    /// `data_out` captured when `done` was observed.
    pub result: u32,
    /// Polling cycles until `done`.
    pub cycles: u32,
    /// Simulated half-cycles spent by the whole invocation.
    pub time: u64,
}

/// Runs one value through a fresh circuit instance.
///
/// The instance lives only for the duration of [`SingleShotInvoker::invoke`]
/// and is finished and dropped on every exit path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SingleShotInvoker {
    reset: ResetSequencer,
    budget_cycles: u32,
}

impl SingleShotInvoker {
    /// Creates an invoker with an explicit reset sequencer and `done` budget.
    #[must_use]
    pub const fn new(reset: ResetSequencer, budget_cycles: u32) -> Self {
        Self {
            reset,
            budget_cycles,
        }
    }

    /// Creates an invoker from the configured timing.
    #[must_use]
    pub const fn from_config(config: &DriverConfig) -> Self {
        Self::new(
            ResetSequencer::from_config(config),
            config.shot_timeout_cycles,
        )
    }

    /// Instantiates a circuit, applies `value` with a start pulse, and waits
    /// for `done`.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Timeout`] with `address: None` when `done` is not
    /// observed within budget.
    pub fn invoke<F: CircuitFactory>(
        &self,
        factory: &mut F,
        value: u32,
    ) -> Result<ShotReport, DriverError> {
        let mut clocked = ClockedModel::new(factory.instantiate());
        self.drive(&mut clocked, value)
    }

    fn drive<M: CircuitModel>(
        &self,
        clocked: &mut ClockedModel<M>,
        value: u32,
    ) -> Result<ShotReport, DriverError> {
        self.reset
            .run_with(clocked, &[(Signal::DataIn, u64::from(value))]);

        clocked.set_input(Signal::Start, 1);
        clocked.full_cycle();
        clocked.set_input(Signal::Start, 0);
        clocked.full_cycle();

        for cycles in 1..=self.budget_cycles {
            clocked.advance_half_cycle();
            let done = clocked.is_asserted(Signal::Done);
            clocked.advance_half_cycle();
            if done {
                let result = clocked.read_word(Signal::DataOut);
                debug!(value, result, cycles, "single-shot completed");
                return Ok(ShotReport {
                    result,
                    cycles,
                    time: clocked.time(),
                });
            }
        }

        warn!(value, cycles = self.budget_cycles, "single-shot timed out");
        Err(DriverError::Timeout {
            address: None,
            cycles: self.budget_cycles,
        })
    }
}

impl Default for SingleShotInvoker {
    fn default() -> Self {
        Self::from_config(&DriverConfig::default())
    }
}

/// Validates `config` and runs one single-shot invocation.
///
/// # Errors
///
/// Returns [`DriverError::InvalidConfig`] for a rejected configuration, or
/// [`DriverError::Timeout`] when `done` never rises.
pub fn invoke_single_shot<F: CircuitFactory>(
    factory: &mut F,
    value: u32,
    config: &DriverConfig,
) -> Result<ShotReport, DriverError> {
    config.validate()?;
    SingleShotInvoker::from_config(config).invoke(factory, value)
}

#[cfg(test)]
mod tests {
    use super::SingleShotInvoker;
    use crate::{CircuitModel, DriverError, ResetSequencer, Signal, SIGNAL_COUNT};

    /// Echoes `data_in + 1` once `start` has been seen on a rising edge.
    #[derive(Default)]
    struct Incrementer {
        values: [u64; SIGNAL_COUNT],
        prev_clk: u64,
    }

    impl CircuitModel for Incrementer {
        fn set(&mut self, signal: Signal, value: u64) {
            self.values[signal.index()] = value;
        }

        fn eval(&mut self) {
            let clk = self.values[Signal::Clk.index()];
            let rising = clk == 1 && self.prev_clk == 0;
            self.prev_clk = clk;
            if self.values[Signal::RstN.index()] == 0 {
                self.values[Signal::Done.index()] = 0;
                return;
            }
            if rising && self.values[Signal::Start.index()] == 1 {
                self.values[Signal::Done.index()] = 1;
                self.values[Signal::DataOut.index()] =
                    (self.values[Signal::DataIn.index()] + 1) & 0xFFFF_FFFF;
            }
        }

        fn get(&self, signal: Signal) -> u64 {
            self.values[signal.index()]
        }
    }

    #[test]
    fn done_seen_on_first_poll_returns_result() {
        let mut factory = Incrementer::default;
        let report = SingleShotInvoker::default()
            .invoke(&mut factory, 41)
            .expect("done rises during start pulse");
        assert_eq!(report.result, 42);
        assert_eq!(report.cycles, 1);
        // 10 reset half-cycles, two pulse cycles, one poll cycle
        assert_eq!(report.time, 10 + 4 + 2);
    }

    #[test]
    fn missing_start_edge_times_out() {
        struct Silent;
        impl CircuitModel for Silent {
            fn set(&mut self, _signal: Signal, _value: u64) {}
            fn eval(&mut self) {}
            fn get(&self, _signal: Signal) -> u64 {
                0
            }
        }

        let mut factory = || Silent;
        let err = SingleShotInvoker::new(ResetSequencer::default(), 25)
            .invoke(&mut factory, 7)
            .expect_err("done never rises");
        assert_eq!(
            err,
            DriverError::Timeout {
                address: None,
                cycles: 25
            }
        );
    }
}
