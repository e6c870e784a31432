//! Contract for the externally supplied cycle-accurate circuit model.

use crate::Signal;

/// Cycle-accurate circuit evaluated one logic update at a time.
///
/// The driver sets inputs, calls [`CircuitModel::eval`], and samples outputs.
/// Implementations own every signal value; the driver keeps nothing beyond the
/// value it just sampled.
pub trait CircuitModel {
    /// Drives an input line. Outputs must not change until the next `eval`.
    fn set(&mut self, signal: Signal, value: u64);

    /// Re-evaluates the circuit logic against the current inputs.
    fn eval(&mut self);

    /// Returns the current value of any line, input or output.
    fn get(&self, signal: Signal) -> u64;

    /// Final hook before the instance is dropped.
    fn finish(&mut self) {}
}

/// Source of fresh circuit instances.
///
/// Sessions and single-shot invocations call [`CircuitFactory::instantiate`]
/// whenever they need a power-on instance. Any `FnMut() -> M` closure is a
/// factory.
pub trait CircuitFactory {
    /// Circuit type produced by this factory.
    type Model: CircuitModel;

    /// Creates a new, not yet reset, circuit instance.
    fn instantiate(&mut self) -> Self::Model;
}

impl<F, M> CircuitFactory for F
where
    F: FnMut() -> M,
    M: CircuitModel,
{
    type Model = M;

    fn instantiate(&mut self) -> M {
        self()
    }
}

impl<M: CircuitModel + ?Sized> CircuitModel for Box<M> {
    fn set(&mut self, signal: Signal, value: u64) {
        (**self).set(signal, value);
    }

    fn eval(&mut self) {
        (**self).eval();
    }

    fn get(&self, signal: Signal) -> u64 {
        (**self).get(signal)
    }

    fn finish(&mut self) {
        (**self).finish();
    }
}
