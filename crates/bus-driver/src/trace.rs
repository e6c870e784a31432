//! Optional per-half-cycle state capture.
//!
//! A [`TraceSink`] receives one sample after every half-cycle evaluation.
//! Sinks are write-only from the driver's point of view and cannot affect
//! protocol behaviour. Two sinks ship with the crate: [`MemoryTrace`] buffers
//! samples for inspection, and [`VcdWriter`] streams a Value Change Dump.

use std::cell::{Cell, RefCell};
use std::fmt::Write as _;
use std::io::{self, Write};
use std::rc::Rc;

use crate::{Signal, SIGNAL_COUNT};

/// Signal values captured at one simulated time step, indexed by
/// [`Signal::index`].
pub type SignalValues = [u64; SIGNAL_COUNT];

/// Sink for time-indexed circuit state.
pub trait TraceSink {
    /// Records the circuit state observed at `time`.
    fn on_sample(&mut self, time: u64, values: &SignalValues);

    /// Ends the trace session. Called once at session teardown.
    fn close(&mut self) {}
}

/// One captured time step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceSample {
    /// Simulated time in half-cycles.
    pub time: u64,
    /// Values of every signal after evaluation.
    pub values: SignalValues,
}

impl TraceSample {
    /// Returns the captured value of `signal`.
    #[must_use]
    pub const fn value(&self, signal: Signal) -> u64 {
        self.values[signal.index()]
    }
}

/// In-memory trace buffer.
///
/// Clones share the same buffer, so a host can keep one handle while the
/// session owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryTrace {
    samples: Rc<RefCell<Vec<TraceSample>>>,
    closed: Rc<Cell<bool>>,
}

impl MemoryTrace {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all samples recorded so far.
    #[must_use]
    pub fn samples(&self) -> Vec<TraceSample> {
        self.samples.borrow().clone()
    }

    /// Returns the number of recorded samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.borrow().len()
    }

    /// Returns `true` when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.borrow().is_empty()
    }

    /// Returns the value of `signal` at `time`, if that step was captured.
    #[must_use]
    pub fn value_at(&self, time: u64, signal: Signal) -> Option<u64> {
        self.samples
            .borrow()
            .iter()
            .find(|sample| sample.time == time)
            .map(|sample| sample.value(signal))
    }

    /// Returns `true` once the owning session has closed the trace.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }
}

impl TraceSink for MemoryTrace {
    fn on_sample(&mut self, time: u64, values: &SignalValues) {
        self.samples.borrow_mut().push(TraceSample {
            time,
            values: *values,
        });
    }

    fn close(&mut self) {
        self.closed.set(true);
    }
}

/// Streams samples as a Value Change Dump.
///
/// The header and the initial `$dumpvars` block are written with the first
/// sample; later samples emit only the lines that changed. I/O failures are
/// latched and reported by [`VcdWriter::into_inner`]; they never interrupt the
/// simulation.
#[derive(Debug)]
pub struct VcdWriter<W: Write> {
    writer: W,
    timescale: String,
    module_name: String,
    previous: Option<SignalValues>,
    error: Option<io::Error>,
}

impl<W: Write> VcdWriter<W> {
    /// Creates a writer with a `1ns` timescale and a `top` scope.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            timescale: "1ns".to_string(),
            module_name: "top".to_string(),
            previous: None,
            error: None,
        }
    }

    /// Sets the timescale string, e.g. `"10ns"`.
    #[must_use]
    pub fn with_timescale(mut self, timescale: &str) -> Self {
        self.timescale = timescale.to_string();
        self
    }

    /// Sets the scope name used for every variable.
    #[must_use]
    pub fn with_module_name(mut self, name: &str) -> Self {
        self.module_name = name.to_string();
        self
    }

    /// Flushes and returns the inner writer.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error hit while writing, or a flush error.
    pub fn into_inner(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn identifier(signal: Signal) -> char {
        // Printable VCD identifiers start at '!'; SIGNAL_COUNT stays far below 94.
        char::from(b'!' + signal as u8)
    }

    fn format_value(out: &mut String, signal: Signal, value: u64) {
        let id = Self::identifier(signal);
        if signal.width() == 1 {
            let _ = writeln!(out, "{}{id}", value & 1);
        } else {
            let width = usize::from(signal.width());
            let _ = writeln!(out, "b{value:0width$b} {id}");
        }
    }

    fn header(&self, time: u64, initial: &SignalValues) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "$timescale {} $end", self.timescale);
        let _ = writeln!(out, "$scope module {} $end", self.module_name);
        for signal in Signal::ALL {
            let _ = writeln!(
                out,
                "$var wire {} {} {} $end",
                signal.width(),
                Self::identifier(signal),
                signal.name()
            );
        }
        out.push_str("$upscope $end\n$enddefinitions $end\n");
        let _ = writeln!(out, "#{time}");
        out.push_str("$dumpvars\n");
        for signal in Signal::ALL {
            Self::format_value(&mut out, signal, initial[signal.index()]);
        }
        out.push_str("$end\n");
        out
    }

    fn emit(&mut self, text: &str) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.writer.write_all(text.as_bytes()) {
            tracing::warn!(%err, "vcd trace write failed; further output dropped");
            self.error = Some(err);
        }
    }
}

impl<W: Write> TraceSink for VcdWriter<W> {
    fn on_sample(&mut self, time: u64, values: &SignalValues) {
        let out = match self.previous {
            None => self.header(time, values),
            Some(previous) => {
                let mut changes = String::new();
                for signal in Signal::ALL {
                    let value = values[signal.index()];
                    if previous[signal.index()] != value {
                        Self::format_value(&mut changes, signal, value);
                    }
                }
                if changes.is_empty() {
                    changes
                } else {
                    format!("#{time}\n{changes}")
                }
            }
        };
        self.previous = Some(*values);
        if !out.is_empty() {
            self.emit(&out);
        }
    }

    fn close(&mut self) {
        if self.error.is_none() {
            if let Err(err) = self.writer.flush() {
                tracing::warn!(%err, "vcd trace flush failed on close");
                self.error = Some(err);
            }
        }
    }
}
