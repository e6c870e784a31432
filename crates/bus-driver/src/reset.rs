//! Power-on reset sequencing shared by sessions and single-shot invocations.

use tracing::trace;

use crate::{CircuitModel, ClockedModel, DriverConfig, Signal};

/// Drives the fixed power-on reset pulse.
///
/// The sequence is: assert `rst_n = 0`, clear every control input, settle;
/// toggle the clock `half_cycles` times with reset held; release reset and
/// settle once more. It never waits on the circuit, so it needs no timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResetSequencer {
    half_cycles: u16,
}

impl ResetSequencer {
    /// Creates a sequencer toggling `half_cycles` half-cycles.
    ///
    /// An odd count would leave the clock high; [`DriverConfig::validate`]
    /// rejects such configurations before they reach a sequencer.
    #[must_use]
    pub const fn new(half_cycles: u16) -> Self {
        Self { half_cycles }
    }

    /// Creates a sequencer from the configured pulse length.
    #[must_use]
    pub const fn from_config(config: &DriverConfig) -> Self {
        Self::new(config.reset_half_cycles)
    }

    /// Half-cycles toggled while reset is held.
    #[must_use]
    pub const fn half_cycles(&self) -> u16 {
        self.half_cycles
    }

    /// Runs the full reset sequence.
    pub fn run<M: CircuitModel>(&self, clocked: &mut ClockedModel<M>) {
        self.run_with(clocked, &[]);
    }

    /// Runs the reset sequence, applying `preset` inputs while reset is held.
    ///
    /// Presets are applied after the control inputs are cleared and before the
    /// first settle, so the circuit sees them for the whole pulse.
    pub fn run_with<M: CircuitModel>(
        &self,
        clocked: &mut ClockedModel<M>,
        preset: &[(Signal, u64)],
    ) {
        clocked.set_input(Signal::RstN, 0);
        for signal in Signal::CONTROL_INPUTS {
            clocked.set_input(signal, 0);
        }
        clocked.park_clock();
        for &(signal, value) in preset {
            clocked.set_input(signal, value);
        }
        clocked.settle();

        for _ in 0..self.half_cycles {
            clocked.advance_half_cycle();
        }

        clocked.set_input(Signal::RstN, 1);
        clocked.settle();
        trace!(
            half_cycles = self.half_cycles,
            time = clocked.time(),
            "reset released"
        );
    }
}

impl Default for ResetSequencer {
    fn default() -> Self {
        Self::from_config(&DriverConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::ResetSequencer;
    use crate::{CircuitModel, ClockPhase, ClockedModel, Signal, SIGNAL_COUNT};

    /// Records `rst_n` at every evaluation.
    #[derive(Default)]
    struct ResetProbe {
        values: [u64; SIGNAL_COUNT],
        rst_history: Vec<u64>,
    }

    impl CircuitModel for ResetProbe {
        fn set(&mut self, signal: Signal, value: u64) {
            self.values[signal.index()] = value;
        }

        fn eval(&mut self) {
            self.rst_history.push(self.values[Signal::RstN.index()]);
        }

        fn get(&self, signal: Signal) -> u64 {
            self.values[signal.index()]
        }
    }

    #[test]
    fn reset_holds_for_pulse_then_releases() {
        let mut clocked = ClockedModel::new(ResetProbe::default());
        ResetSequencer::default().run(&mut clocked);

        let history = &clocked.model().rst_history;
        // settle + 10 half-cycles with reset held, then the release settle.
        assert_eq!(history.len(), 12);
        assert!(history[..11].iter().all(|level| *level == 0));
        assert_eq!(history[11], 1);
        assert_eq!(clocked.time(), 10);
        assert_eq!(clocked.phase(), ClockPhase::Low);
    }

    #[test]
    fn reset_clears_control_inputs_and_applies_presets() {
        let mut clocked = ClockedModel::new(ResetProbe::default());
        clocked.set_input(Signal::BusEnable, 1);
        clocked.set_input(Signal::BusAddr, 0x14);
        clocked.set_input(Signal::Start, 1);

        ResetSequencer::new(4).run_with(&mut clocked, &[(Signal::DataIn, 0xDEAD_BEEF)]);

        assert_eq!(clocked.read_output(Signal::BusEnable), 0);
        assert_eq!(clocked.read_output(Signal::BusAddr), 0);
        assert_eq!(clocked.read_output(Signal::Start), 0);
        assert_eq!(clocked.read_output(Signal::DataIn), 0xDEAD_BEEF);
        assert_eq!(clocked.read_output(Signal::RstN), 1);
        assert_eq!(clocked.time(), 4);
    }

    #[test]
    fn reset_parks_clock_even_when_called_mid_cycle() {
        let mut clocked = ClockedModel::new(ResetProbe::default());
        clocked.advance_half_cycle();
        assert_eq!(clocked.phase(), ClockPhase::High);

        ResetSequencer::new(2).run(&mut clocked);
        assert_eq!(clocked.phase(), ClockPhase::Low);
        assert_eq!(clocked.read_output(Signal::Clk), 0);
        assert_eq!(clocked.time(), 3);
    }
}
