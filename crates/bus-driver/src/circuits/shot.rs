//! Start/done core with a fixed computation latency.

use crate::{CircuitModel, Signal};

/// Default rising edges between the start edge and `done`.
pub const DEFAULT_SHOT_LATENCY: u32 = 4;

/// Single-shot core: latches `data_in` on a rising edge with `start` high,
/// then raises `done` with `data_out = transform(data_in)` after a fixed
/// number of further rising edges.
///
/// `done` stays high until the next reset.
#[derive(Debug, Clone, Copy)]
#[allow(clippy::struct_excessive_bools)]
pub struct ShotCircuit {
    clk: bool,
    prev_clk: bool,
    rst_n: bool,
    start: bool,
    data_in: u32,
    done: bool,
    data_out: u32,
    latched: u32,
    remaining: Option<u32>,
    latency: Option<u32>,
    transform: fn(u32) -> u32,
}

impl Default for ShotCircuit {
    fn default() -> Self {
        Self::new(Some(DEFAULT_SHOT_LATENCY))
    }
}

impl ShotCircuit {
    /// Creates a core that finishes `latency` rising edges after the start
    /// edge, or never when `latency` is `None`.
    #[must_use]
    pub const fn new(latency: Option<u32>) -> Self {
        Self {
            clk: false,
            prev_clk: false,
            rst_n: false,
            start: false,
            data_in: 0,
            done: false,
            data_out: 0,
            latched: 0,
            remaining: None,
            latency,
            transform: u32::reverse_bits,
        }
    }

    /// Replaces the computed function.
    #[must_use]
    pub const fn with_transform(mut self, transform: fn(u32) -> u32) -> Self {
        self.transform = transform;
        self
    }

    /// Polling cycles a single-shot invoker needs to observe `done`, given
    /// the two start-pulse cycles that precede polling.
    #[must_use]
    pub const fn expected_poll_cycles(latency: u32) -> u32 {
        if latency > 2 {
            latency - 1
        } else {
            1
        }
    }

    fn rising_edge(&mut self) {
        match self.remaining {
            Some(0) | None => {}
            Some(left) => {
                let left = left - 1;
                self.remaining = Some(left);
                if left == 0 {
                    self.complete();
                }
            }
        }

        if self.start && self.remaining.is_none() && !self.done {
            self.latched = self.data_in;
            match self.latency {
                Some(0) => {
                    self.remaining = Some(0);
                    self.complete();
                }
                Some(latency) => self.remaining = Some(latency),
                None => self.remaining = Some(u32::MAX),
            }
        }
    }

    fn complete(&mut self) {
        if self.latency.is_some() {
            self.done = true;
            self.data_out = (self.transform)(self.latched);
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn word(value: u64) -> u32 {
    value as u32
}

impl CircuitModel for ShotCircuit {
    fn set(&mut self, signal: Signal, value: u64) {
        match signal {
            Signal::Clk => self.clk = value != 0,
            Signal::RstN => self.rst_n = value != 0,
            Signal::Start => self.start = value != 0,
            Signal::DataIn => self.data_in = word(value),
            _ => {}
        }
    }

    fn eval(&mut self) {
        let rising = self.clk && !self.prev_clk;
        self.prev_clk = self.clk;
        if !self.rst_n {
            self.done = false;
            self.data_out = 0;
            self.latched = 0;
            self.remaining = None;
            return;
        }
        if rising {
            self.rising_edge();
        }
    }

    fn get(&self, signal: Signal) -> u64 {
        match signal {
            Signal::Clk => u64::from(self.clk),
            Signal::RstN => u64::from(self.rst_n),
            Signal::Start => u64::from(self.start),
            Signal::DataIn => u64::from(self.data_in),
            Signal::Done => u64::from(self.done),
            Signal::DataOut => u64::from(self.data_out),
            _ => 0,
        }
    }
}
