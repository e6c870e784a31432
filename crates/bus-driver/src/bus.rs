//! Single-word bus transactions with a registered-ready handshake.
//!
//! Timing contract, per transaction:
//!
//! 1. The request lines are driven while the clock is low.
//! 2. Each polling iteration is one full cycle. `bus_ready` is registered, so
//!    it is sampled after the rising-edge evaluation, never before.
//! 3. Reads wait `read_latency_cycles` further full cycles after `bus_ready`,
//!    each containing a rising edge, before sampling `bus_rdata`. The request
//!    is held for the first of those edges only; a registered-ready circuit
//!    would read an enable still high on the next edge as a new request.
//! 4. The request lines are cleared and one settle cycle follows, on success
//!    and on timeout alike.

use tracing::{debug, warn};

use crate::{CircuitModel, ClockPhase, ClockedModel, DriverConfig, DriverError, Signal};

/// Direction of a bus transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum BusDirection {
    /// Host reads a register.
    Read,
    /// Host writes a register.
    Write,
}

/// How a bus transaction ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum BusOutcome {
    /// `bus_ready` was observed within budget.
    Acked,
    /// The budget ran out before `bus_ready` was observed.
    TimedOut,
}

/// Result of one bus transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct BusTransaction {
    /// Read or write.
    pub direction: BusDirection,
    /// Register address.
    pub address: u32,
    /// Written word, or the word read back. Zero for timed-out reads.
    pub data: u32,
    /// Handshake outcome.
    pub outcome: BusOutcome,
    /// Polling cycles consumed, excluding read latency and the settle cycle.
    pub cycles: u16,
}

impl BusTransaction {
    /// Returns `true` when the circuit acknowledged the request.
    #[must_use]
    pub const fn is_acked(&self) -> bool {
        matches!(self.outcome, BusOutcome::Acked)
    }

    /// Converts a timed-out transaction into [`DriverError::Timeout`].
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Timeout`] when the outcome is
    /// [`BusOutcome::TimedOut`].
    pub const fn acked(self) -> Result<Self, DriverError> {
        match self.outcome {
            BusOutcome::Acked => Ok(self),
            BusOutcome::TimedOut => Err(DriverError::Timeout {
                address: Some(self.address),
                cycles: self.cycles as u32,
            }),
        }
    }

    /// Returns the transferred word of an acknowledged transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Timeout`] when the transaction timed out.
    pub const fn value(self) -> Result<u32, DriverError> {
        match self.acked() {
            Ok(transaction) => Ok(transaction.data),
            Err(err) => Err(err),
        }
    }
}

/// Issues bus transactions against a [`ClockedModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BusTransactor {
    budget_cycles: u16,
    read_latency_cycles: u16,
}

impl BusTransactor {
    /// Creates a transactor with an explicit budget and read latency.
    #[must_use]
    pub const fn new(budget_cycles: u16, read_latency_cycles: u16) -> Self {
        Self {
            budget_cycles,
            read_latency_cycles,
        }
    }

    /// Creates a transactor from the configured timing.
    #[must_use]
    pub const fn from_config(config: &DriverConfig) -> Self {
        Self::new(config.bus_timeout_cycles, config.read_latency_cycles)
    }

    /// Polling budget in full cycles.
    #[must_use]
    pub const fn budget_cycles(&self) -> u16 {
        self.budget_cycles
    }

    /// Extra full cycles between `bus_ready` and the `bus_rdata` sample.
    #[must_use]
    pub const fn read_latency_cycles(&self) -> u16 {
        self.read_latency_cycles
    }

    /// Writes `data` to `address`.
    ///
    /// A timeout is reported through [`BusTransaction::outcome`].
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::ProtocolViolation`] when the clock is not low.
    pub fn write<M: CircuitModel>(
        &self,
        clocked: &mut ClockedModel<M>,
        address: u32,
        data: u32,
    ) -> Result<BusTransaction, DriverError> {
        self.transact(clocked, BusDirection::Write, address, data)
    }

    /// Reads the word at `address`.
    ///
    /// A timeout is reported through [`BusTransaction::outcome`].
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::ProtocolViolation`] when the clock is not low.
    pub fn read<M: CircuitModel>(
        &self,
        clocked: &mut ClockedModel<M>,
        address: u32,
    ) -> Result<BusTransaction, DriverError> {
        self.transact(clocked, BusDirection::Read, address, 0)
    }

    fn transact<M: CircuitModel>(
        &self,
        clocked: &mut ClockedModel<M>,
        direction: BusDirection,
        address: u32,
        data: u32,
    ) -> Result<BusTransaction, DriverError> {
        if clocked.phase() != ClockPhase::Low {
            return Err(DriverError::ProtocolViolation);
        }

        let is_write = direction == BusDirection::Write;
        clocked.set_input(Signal::BusEnable, 1);
        clocked.set_input(Signal::BusWrite, u64::from(is_write));
        clocked.set_input(Signal::BusAddr, u64::from(address));
        if is_write {
            clocked.set_input(Signal::BusWdata, u64::from(data));
        }

        let mut acked = false;
        let mut word = if is_write { data } else { 0 };
        let mut cycles = 0;
        while cycles < self.budget_cycles {
            cycles += 1;
            clocked.advance_half_cycle();
            if clocked.is_asserted(Signal::BusReady) {
                acked = true;
                if !is_write {
                    word = self.sample_read_data(clocked);
                }
            }
            clocked.advance_half_cycle();
            if acked {
                break;
            }
        }

        release_request(clocked);
        clocked.full_cycle();

        let transaction = BusTransaction {
            direction,
            address,
            data: word,
            outcome: if acked {
                BusOutcome::Acked
            } else {
                BusOutcome::TimedOut
            },
            cycles,
        };
        if acked {
            debug!(?direction, address, data = word, cycles, "bus transaction acked");
        } else {
            warn!(?direction, address, cycles, "bus transaction timed out");
        }
        Ok(transaction)
    }

    /// Called in the high phase right after `bus_ready` was seen. Returns in
    /// the high phase so the caller's falling edge completes the iteration.
    fn sample_read_data<M: CircuitModel>(&self, clocked: &mut ClockedModel<M>) -> u32 {
        for cycle in 0..self.read_latency_cycles {
            if cycle == 1 {
                release_request(clocked);
            }
            clocked.advance_half_cycle();
            clocked.advance_half_cycle();
        }
        clocked.read_word(Signal::BusRdata)
    }
}

fn release_request<M: CircuitModel>(clocked: &mut ClockedModel<M>) {
    clocked.set_input(Signal::BusEnable, 0);
    clocked.set_input(Signal::BusWrite, 0);
}

impl Default for BusTransactor {
    fn default() -> Self {
        Self::from_config(&DriverConfig::default())
    }
}
