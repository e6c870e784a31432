//! Sponge absorption, squeeze and status sequences built on bus transactions.

use tracing::debug;

use crate::{
    BusTransaction, BusTransactor, CircuitModel, ClockedModel, DriverConfig, DriverError,
    StatusFlags, CONTROL_ABSORB_LAST, CONTROL_ADDR, CONTROL_CLEAR, DATA_ADDR, RATE_ADDR,
    STATUS_ADDR,
};

/// One planned bus write of an absorption request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AbsorbWrite {
    /// Target register.
    pub address: u32,
    /// Value written.
    pub data: u32,
}

/// Transactions issued by a completed absorption, in issue order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AbsorbReport {
    /// Every acknowledged write.
    pub transactions: Vec<BusTransaction>,
}

impl AbsorbReport {
    /// Number of bus transactions issued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Returns `true` when no transaction was issued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Total polling cycles across all transactions.
    #[must_use]
    pub fn polled_cycles(&self) -> u32 {
        self.transactions
            .iter()
            .map(|transaction| u32::from(transaction.cycles))
            .sum()
    }
}

/// Builds the exact write sequence for absorbing `words`.
///
/// The sequence is: rate, then a control write and a data write per word with
/// absorb-last set only for the final word, then a control clear.
#[must_use]
pub fn absorb_plan(rate: u32, words: &[u32]) -> Vec<AbsorbWrite> {
    let mut plan = Vec::with_capacity(2 + 2 * words.len());
    plan.push(AbsorbWrite {
        address: RATE_ADDR,
        data: rate,
    });
    for (index, &word) in words.iter().enumerate() {
        let control = if index + 1 == words.len() {
            CONTROL_ABSORB_LAST
        } else {
            CONTROL_CLEAR
        };
        plan.push(AbsorbWrite {
            address: CONTROL_ADDR,
            data: control,
        });
        plan.push(AbsorbWrite {
            address: DATA_ADDR,
            data: word,
        });
    }
    plan.push(AbsorbWrite {
        address: CONTROL_ADDR,
        data: CONTROL_CLEAR,
    });
    plan
}

/// Session-level sponge sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AbsorptionProtocol {
    rate: u32,
}

impl AbsorptionProtocol {
    /// Creates a protocol writing `rate` before every absorption.
    #[must_use]
    pub const fn new(rate: u32) -> Self {
        Self { rate }
    }

    /// Creates a protocol from the configured rate.
    #[must_use]
    pub const fn from_config(config: &DriverConfig) -> Self {
        Self::new(config.absorb_rate)
    }

    /// Streams `words` into the sponge.
    ///
    /// All-or-nothing: the first timeout aborts the remaining writes. Recovery
    /// requires a fresh reset.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Timeout`] naming the register that timed out, or
    /// [`DriverError::ProtocolViolation`] from the transactor.
    pub fn absorb<M: CircuitModel>(
        &self,
        bus: &BusTransactor,
        clocked: &mut ClockedModel<M>,
        words: &[u32],
    ) -> Result<AbsorbReport, DriverError> {
        let mut report = AbsorbReport::default();
        for step in absorb_plan(self.rate, words) {
            let transaction = bus.write(clocked, step.address, step.data)?.acked()?;
            report.transactions.push(transaction);
        }
        debug!(
            words = words.len(),
            transactions = report.len(),
            "absorption complete"
        );
        Ok(report)
    }

    /// Reads `count` squeeze words, stepping `gap_cycles` full cycles after
    /// each read so the sponge can advance.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Timeout`] on the first read that times out.
    pub fn squeeze<M: CircuitModel>(
        &self,
        bus: &BusTransactor,
        clocked: &mut ClockedModel<M>,
        count: usize,
        gap_cycles: u32,
    ) -> Result<Vec<u32>, DriverError> {
        let mut words = Vec::with_capacity(count);
        for _ in 0..count {
            words.push(bus.read(clocked, DATA_ADDR)?.value()?);
            clocked.step_cycles(gap_cycles);
        }
        Ok(words)
    }

    /// Reads and decodes the status register.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Timeout`] when the read times out.
    pub fn status<M: CircuitModel>(
        &self,
        bus: &BusTransactor,
        clocked: &mut ClockedModel<M>,
    ) -> Result<StatusFlags, DriverError> {
        let bits = bus.read(clocked, STATUS_ADDR)?.value()?;
        Ok(StatusFlags::from_bits(bits))
    }
}

impl Default for AbsorptionProtocol {
    fn default() -> Self {
        Self::from_config(&DriverConfig::default())
    }
}
