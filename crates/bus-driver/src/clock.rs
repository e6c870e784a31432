//! Clocked wrapper around one circuit instance.
//!
//! [`ClockedModel::advance_half_cycle`] is the only place simulated time
//! advances. Every higher-level sequence is built from it, so edge timing is
//! decided in exactly one spot.

use crate::{CircuitModel, Signal, SignalValues, TraceSink, SIGNAL_COUNT};

/// Logic level of the clock line after the most recent half-cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ClockPhase {
    /// Clock is low; the next half-cycle is a rising edge.
    #[default]
    Low,
    /// Clock is high; the next half-cycle is a falling edge.
    High,
}

impl ClockPhase {
    /// Returns the opposite phase.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Low => Self::High,
            Self::High => Self::Low,
        }
    }

    /// Returns the `clk` line value for this phase.
    #[must_use]
    pub const fn level(self) -> u64 {
        match self {
            Self::Low => 0,
            Self::High => 1,
        }
    }
}

/// One owned circuit instance plus its simulated-time counter.
///
/// Dropping a `ClockedModel` calls [`CircuitModel::finish`] and closes any
/// attached trace sink, so teardown happens on every exit path.
pub struct ClockedModel<M: CircuitModel> {
    model: M,
    time: u64,
    phase: ClockPhase,
    trace: Option<Box<dyn TraceSink>>,
}

impl<M: CircuitModel> ClockedModel<M> {
    /// Wraps a freshly instantiated circuit at time zero.
    pub fn new(model: M) -> Self {
        Self::resume(model, 0, None)
    }

    /// Wraps a circuit whose time counter continues from `time`.
    ///
    /// Sessions use this when re-initialising so trace timestamps stay
    /// monotonic across instances.
    pub fn resume(model: M, time: u64, trace: Option<Box<dyn TraceSink>>) -> Self {
        Self {
            model,
            time,
            phase: ClockPhase::Low,
            trace,
        }
    }

    /// Attaches a trace sink, replacing and closing any previous one.
    pub fn attach_trace(&mut self, sink: Box<dyn TraceSink>) {
        if let Some(mut previous) = self.trace.replace(sink) {
            previous.close();
        }
    }

    /// Detaches the trace sink without closing it.
    pub fn take_trace(&mut self) -> Option<Box<dyn TraceSink>> {
        self.trace.take()
    }

    /// Drives an input line. Takes effect at the next evaluation.
    pub fn set_input(&mut self, signal: Signal, value: u64) {
        debug_assert!(signal.is_input(), "{signal} is not a circuit input");
        self.model.set(signal, value & signal.mask());
    }

    /// Re-evaluates combinational logic without touching the clock or time.
    pub fn settle(&mut self) {
        self.model.eval();
    }

    /// Drives the clock low without an evaluation or a time step.
    ///
    /// Used while reset is asserted, when the next evaluation is a settle.
    pub fn park_clock(&mut self) {
        self.phase = ClockPhase::Low;
        self.model.set(Signal::Clk, ClockPhase::Low.level());
    }

    /// Flips the clock, evaluates, and advances simulated time by one.
    ///
    /// Returns the phase the clock is now in.
    pub fn advance_half_cycle(&mut self) -> ClockPhase {
        self.phase = self.phase.toggled();
        self.model.set(Signal::Clk, self.phase.level());
        self.model.eval();
        self.time += 1;
        self.record();
        self.phase
    }

    /// Advances two half-cycles.
    pub fn full_cycle(&mut self) {
        self.advance_half_cycle();
        self.advance_half_cycle();
    }

    /// Advances `cycles` full clock cycles.
    pub fn step_cycles(&mut self, cycles: u32) {
        for _ in 0..cycles {
            self.full_cycle();
        }
    }

    /// Returns the most recently evaluated value of a line.
    #[must_use]
    pub fn read_output(&self, signal: Signal) -> u64 {
        self.model.get(signal) & signal.mask()
    }

    /// Returns a 32-bit line value.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn read_word(&self, signal: Signal) -> u32 {
        (self.read_output(signal) & u64::from(u32::MAX)) as u32
    }

    /// Returns `true` when a line reads non-zero.
    #[must_use]
    pub fn is_asserted(&self, signal: Signal) -> bool {
        self.read_output(signal) != 0
    }

    /// Simulated time in half-cycles.
    #[must_use]
    pub const fn time(&self) -> u64 {
        self.time
    }

    /// Current clock phase.
    #[must_use]
    pub const fn phase(&self) -> ClockPhase {
        self.phase
    }

    /// Shared access to the wrapped circuit.
    #[must_use]
    pub const fn model(&self) -> &M {
        &self.model
    }

    /// Captures every line value in [`Signal::index`] order.
    #[must_use]
    pub fn sample_all(&self) -> SignalValues {
        let mut values = [0; SIGNAL_COUNT];
        for signal in Signal::ALL {
            values[signal.index()] = self.read_output(signal);
        }
        values
    }

    fn record(&mut self) {
        if self.trace.is_none() {
            return;
        }
        let values = self.sample_all();
        if let Some(sink) = self.trace.as_mut() {
            sink.on_sample(self.time, &values);
        }
    }
}

impl<M: CircuitModel> Drop for ClockedModel<M> {
    fn drop(&mut self) {
        self.model.finish();
        if let Some(mut sink) = self.trace.take() {
            sink.close();
        }
    }
}
