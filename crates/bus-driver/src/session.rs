//! Exclusively owned simulation session.
//!
//! A [`Session`] owns at most one live circuit instance. Every transaction
//! takes `&mut self`, so two transactions can never overlap on one instance.
//! Dropping the session tears the instance down.

use tracing::{debug, info};

use crate::{
    AbsorbReport, AbsorptionProtocol, BusTransaction, BusTransactor, CircuitFactory, ClockedModel,
    DriverConfig, DriverError, ResetSequencer, StatusFlags, TraceSink,
};

/// Reset lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ResetState {
    /// No instance has been reset yet.
    #[default]
    NotReset,
    /// Reset pulse in progress.
    ResetAsserted,
    /// Reset released; transactions are allowed.
    Ready,
    /// Torn down; every operation fails until the next `init`.
    Closed,
}

/// One simulation session over instances produced by a [`CircuitFactory`].
pub struct Session<F: CircuitFactory> {
    factory: F,
    config: DriverConfig,
    clocked: Option<ClockedModel<F::Model>>,
    state: ResetState,
    parked_trace: Option<Box<dyn TraceSink>>,
    time: u64,
    reset: ResetSequencer,
    bus: BusTransactor,
    protocol: AbsorptionProtocol,
}

impl<F: CircuitFactory> Session<F> {
    /// Creates an uninitialised session.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidConfig`] when `config` fails validation.
    pub fn new(factory: F, config: DriverConfig) -> Result<Self, DriverError> {
        config.validate()?;
        Ok(Self {
            factory,
            reset: ResetSequencer::from_config(&config),
            bus: BusTransactor::from_config(&config),
            protocol: AbsorptionProtocol::from_config(&config),
            config,
            clocked: None,
            state: ResetState::NotReset,
            parked_trace: None,
            time: 0,
        })
    }

    /// Creates a session and runs [`Session::init`].
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidConfig`] when `config` fails validation.
    pub fn open(factory: F, config: DriverConfig) -> Result<Self, DriverError> {
        let mut session = Self::new(factory, config)?;
        session.init();
        Ok(session)
    }

    /// Attaches a trace sink for the rest of the session.
    ///
    /// The sink sees every half-cycle from now on, survives re-initialisation,
    /// and is closed when the session is closed or dropped.
    #[must_use]
    pub fn with_trace(mut self, sink: impl TraceSink + 'static) -> Self {
        self.attach_trace(Box::new(sink));
        self
    }

    /// Attaches a trace sink, closing any previously attached one.
    pub fn attach_trace(&mut self, sink: Box<dyn TraceSink>) {
        if let Some(clocked) = self.clocked.as_mut() {
            clocked.attach_trace(sink);
        } else if let Some(mut previous) = self.parked_trace.replace(sink) {
            previous.close();
        }
    }

    /// Instantiates a fresh circuit and runs the reset sequence.
    ///
    /// Calling `init` again discards the current instance, so no register or
    /// output state survives. Simulated time keeps counting across instances.
    pub fn init(&mut self) {
        let trace = self.retire_instance();
        self.state = ResetState::ResetAsserted;
        let mut clocked = ClockedModel::resume(self.factory.instantiate(), self.time, trace);
        self.reset.run(&mut clocked);
        self.time = clocked.time();
        self.clocked = Some(clocked);
        self.state = ResetState::Ready;
        info!(time = self.time, "session initialised");
    }

    /// Advances `cycles` full clock cycles.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidSession`] unless the session is ready.
    pub fn step_cycles(&mut self, cycles: u32) -> Result<(), DriverError> {
        let clocked = self.live()?;
        clocked.step_cycles(cycles);
        self.sync_time();
        Ok(())
    }

    /// Writes `data` to `address`. A timeout is reported in the returned
    /// transaction's outcome.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidSession`] unless the session is ready.
    pub fn bus_write(&mut self, address: u32, data: u32) -> Result<BusTransaction, DriverError> {
        let bus = self.bus;
        let transaction = bus.write(self.live()?, address, data);
        self.sync_time();
        transaction
    }

    /// Reads the word at `address`. A timeout is reported in the returned
    /// transaction's outcome.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidSession`] unless the session is ready.
    pub fn bus_read(&mut self, address: u32) -> Result<BusTransaction, DriverError> {
        let bus = self.bus;
        let transaction = bus.read(self.live()?, address);
        self.sync_time();
        transaction
    }

    /// Absorbs `words` with the configured rate.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidSession`] unless the session is ready, or
    /// [`DriverError::Timeout`] if any underlying write times out. A failed
    /// absorption leaves the sponge in an unknown state; re-run
    /// [`Session::init`] before retrying.
    pub fn absorb(&mut self, words: &[u32]) -> Result<AbsorbReport, DriverError> {
        let (bus, protocol) = (self.bus, self.protocol);
        let report = protocol.absorb(&bus, self.live()?, words);
        self.sync_time();
        report
    }

    /// Reads `count` squeeze words, stepping `gap_cycles` after each.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidSession`] unless the session is ready, or
    /// [`DriverError::Timeout`] on the first timed-out read.
    pub fn squeeze(&mut self, count: usize, gap_cycles: u32) -> Result<Vec<u32>, DriverError> {
        let (bus, protocol) = (self.bus, self.protocol);
        let words = protocol.squeeze(&bus, self.live()?, count, gap_cycles);
        self.sync_time();
        words
    }

    /// Reads and decodes the status register.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::InvalidSession`] unless the session is ready, or
    /// [`DriverError::Timeout`] when the read times out.
    pub fn status(&mut self) -> Result<StatusFlags, DriverError> {
        let (bus, protocol) = (self.bus, self.protocol);
        let status = protocol.status(&bus, self.live()?);
        self.sync_time();
        status
    }

    /// Tears down the live instance and closes the trace. Idempotent.
    pub fn close(&mut self) {
        if let Some(mut sink) = self.retire_instance() {
            sink.close();
        }
        if self.state != ResetState::Closed {
            self.state = ResetState::Closed;
            info!(time = self.time, "session closed");
        }
    }

    /// Current reset state.
    #[must_use]
    pub const fn state(&self) -> ResetState {
        self.state
    }

    /// Returns `true` when transactions are allowed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state == ResetState::Ready
    }

    /// Simulated time in half-cycles since the session was created.
    #[must_use]
    pub const fn time(&self) -> u64 {
        self.time
    }

    /// Configuration the session was created with.
    #[must_use]
    pub const fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Shared access to the live circuit, for inspection by hosts and tests.
    #[must_use]
    pub fn model(&self) -> Option<&F::Model> {
        self.clocked.as_ref().map(ClockedModel::model)
    }

    fn live(&mut self) -> Result<&mut ClockedModel<F::Model>, DriverError> {
        match (self.state, self.clocked.as_mut()) {
            (ResetState::Ready, Some(clocked)) => Ok(clocked),
            _ => Err(DriverError::InvalidSession),
        }
    }

    fn sync_time(&mut self) {
        if let Some(clocked) = self.clocked.as_ref() {
            self.time = clocked.time();
        }
    }

    /// Drops the live instance, finishing it, and hands back its trace sink.
    fn retire_instance(&mut self) -> Option<Box<dyn TraceSink>> {
        let Some(mut clocked) = self.clocked.take() else {
            return self.parked_trace.take();
        };
        self.time = clocked.time();
        let trace = clocked.take_trace();
        drop(clocked);
        debug!(time = self.time, "circuit instance retired");
        trace
    }
}

impl<F: CircuitFactory> Drop for Session<F> {
    fn drop(&mut self) {
        self.close();
    }
}
