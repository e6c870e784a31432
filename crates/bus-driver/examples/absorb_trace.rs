//! Absorbs a few words into the reference sponge and dumps the VCD trace.
//!
//! ## Usage
//!
//! ```sh
//! cargo run -p bus-driver --example absorb_trace -- 0xdeadbeef 0x1234 > absorb.vcd
//! ```
//!
//! Words are parsed as hexadecimal (with or without `0x`). The trace goes to
//! stdout; a transaction summary goes to stderr.

use std::env;
use std::io;

use bus_driver::{DriverConfig, Session, SpongeBusCircuit, VcdWriter};
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

fn parse_word(arg: &str) -> u32 {
    let digits = arg.trim_start_matches("0x").trim_start_matches("0X");
    u32::from_str_radix(digits, 16).unwrap_or_else(|err| panic!("bad word {arg:?}: {err}"))
}

fn main() {
    let mut words: Vec<u32> = env::args().skip(1).map(|arg| parse_word(&arg)).collect();
    if words.is_empty() {
        words = vec![0x0123_4567, 0x89AB_CDEF, 0xDEAD_BEEF];
    }

    let factory = || {
        SpongeBusCircuit::new()
            .with_permute_cycles(8)
            .with_squeeze_output(vec![0xCAFE_F00D, 0x0BAD_C0DE])
    };
    let mut session = Session::new(factory, DriverConfig::default())
        .expect("default config is valid")
        .with_trace(VcdWriter::new(io::stdout()).with_module_name("sponge"));
    session.init();

    let report = session.absorb(&words).expect("reference sponge acknowledges");
    eprintln!(
        "absorbed {} words in {} writes ({} polling cycles)",
        words.len(),
        report.len(),
        report.polled_cycles()
    );

    session.step_cycles(8).expect("session is ready");
    let status = session.status().expect("reference sponge acknowledges");
    eprintln!("status after permutation: {status:?}");

    if status.squeeze_valid {
        let squeezed = session.squeeze(2, 1).expect("reference sponge acknowledges");
        eprintln!("squeezed: {squeezed:08x?}");
    }

    eprintln!("simulated {} half-cycles", session.time());
}
