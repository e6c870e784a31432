//! Behavioural reference circuits.
//!
//! These stand in for generated RTL models in tests and demos. They follow
//! the same port list and clocking rules as the hardware, but compute in
//! plain Rust.

mod shot;
mod sponge;

pub use shot::{ShotCircuit, DEFAULT_SHOT_LATENCY};
pub use sponge::{AbsorbedWord, BusAccess, SpongeBusCircuit, DEFAULT_PERMUTE_CYCLES};
