//! Behavioural model of the sponge bus front-end.
//!
//! Implements the register map in [`crate::regmap`] with the same handshake
//! timing as the RTL: `bus_ready` is registered one rising edge after the
//! request, and `bus_rdata` lands one rising edge after `bus_ready`. The
//! permutation itself is not modelled; squeeze output comes from a host
//! supplied word source.

use std::collections::{BTreeMap, VecDeque};

use crate::{
    BusDirection, CircuitModel, Signal, StatusFlags, CONTROL_ABSORB_LAST, CONTROL_ADDR,
    DATA_ADDR, RATE_ADDR, STATUS_ADDR,
};

/// Default busy window after the final absorption word, in cycles.
pub const DEFAULT_PERMUTE_CYCLES: u32 = 24;

/// Word accepted through the data register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AbsorbedWord {
    /// Absorbed payload.
    pub word: u32,
    /// Absorb-last bit at the time of the write.
    pub last: bool,
}

/// Bus access observed by the model, in acknowledgement order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BusAccess {
    /// Read or write.
    pub direction: BusDirection,
    /// Register address.
    pub address: u32,
    /// Written word, or the word latched for the read reply.
    pub data: u32,
}

/// Sponge front-end with registered handshake and one-cycle read latency.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct SpongeBusCircuit {
    // inputs
    clk: bool,
    rst_n: bool,
    bus_enable: bool,
    bus_write: bool,
    bus_addr: u32,
    bus_wdata: u32,
    // registered state
    prev_clk: bool,
    bus_ready: bool,
    bus_rdata: u32,
    read_latch: Option<u32>,
    rate: u32,
    control: u32,
    scratch: BTreeMap<u32, u32>,
    busy_cycles: u32,
    squeeze_armed: bool,
    squeeze_queue: VecDeque<u32>,
    // configuration
    permute_cycles: u32,
    squeeze_source: Vec<u32>,
    // observation
    absorbed: Vec<AbsorbedWord>,
    accesses: Vec<BusAccess>,
    finished: bool,
}

impl Default for SpongeBusCircuit {
    fn default() -> Self {
        Self::new()
    }
}

impl SpongeBusCircuit {
    /// Creates a model in power-on state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            clk: false,
            rst_n: false,
            bus_enable: false,
            bus_write: false,
            bus_addr: 0,
            bus_wdata: 0,
            prev_clk: false,
            bus_ready: false,
            bus_rdata: 0,
            read_latch: None,
            rate: 0,
            control: 0,
            scratch: BTreeMap::new(),
            busy_cycles: 0,
            squeeze_armed: false,
            squeeze_queue: VecDeque::new(),
            permute_cycles: DEFAULT_PERMUTE_CYCLES,
            squeeze_source: Vec::new(),
            absorbed: Vec::new(),
            accesses: Vec::new(),
            finished: false,
        }
    }

    /// Sets how many cycles the sponge stays busy after the final word.
    #[must_use]
    pub const fn with_permute_cycles(mut self, cycles: u32) -> Self {
        self.permute_cycles = cycles;
        self
    }

    /// Sets the words returned by successive squeeze reads after each reset.
    #[must_use]
    pub fn with_squeeze_output(mut self, words: Vec<u32>) -> Self {
        self.squeeze_queue = words.iter().copied().collect();
        self.squeeze_source = words;
        self
    }

    /// Words absorbed since the last reset.
    #[must_use]
    pub fn absorbed(&self) -> &[AbsorbedWord] {
        &self.absorbed
    }

    /// Acknowledged bus accesses since the last reset.
    #[must_use]
    pub fn accesses(&self) -> &[BusAccess] {
        &self.accesses
    }

    /// Acknowledged writes since the last reset, as `(address, data)`.
    #[must_use]
    pub fn writes(&self) -> Vec<(u32, u32)> {
        self.accesses
            .iter()
            .filter(|access| access.direction == BusDirection::Write)
            .map(|access| (access.address, access.data))
            .collect()
    }

    /// Current rate register.
    #[must_use]
    pub const fn rate(&self) -> u32 {
        self.rate
    }

    /// Returns `true` once [`CircuitModel::finish`] has been called.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Current status register contents.
    #[must_use]
    pub fn status(&self) -> StatusFlags {
        let busy = self.busy_cycles > 0;
        StatusFlags {
            sponge_busy: busy,
            core_busy: false,
            absorb_ready: !busy,
            squeeze_valid: self.squeeze_armed && !busy && !self.squeeze_queue.is_empty(),
        }
    }

    fn reset_state(&mut self) {
        self.bus_ready = false;
        self.bus_rdata = 0;
        self.read_latch = None;
        self.rate = 0;
        self.control = 0;
        self.scratch.clear();
        self.busy_cycles = 0;
        self.squeeze_armed = false;
        self.squeeze_queue = self.squeeze_source.iter().copied().collect();
        self.absorbed.clear();
        self.accesses.clear();
    }

    fn read_register(&mut self, address: u32) -> u32 {
        match address {
            STATUS_ADDR => self.status().bits(),
            CONTROL_ADDR => self.control,
            RATE_ADDR => self.rate,
            DATA_ADDR => {
                if self.status().squeeze_valid {
                    self.squeeze_queue.pop_front().unwrap_or(0)
                } else {
                    0
                }
            }
            _ => self.scratch.get(&address).copied().unwrap_or(0),
        }
    }

    fn write_register(&mut self, address: u32, data: u32) {
        match address {
            STATUS_ADDR => {}
            CONTROL_ADDR => self.control = data,
            RATE_ADDR => self.rate = data,
            DATA_ADDR => {
                let last = self.control & CONTROL_ABSORB_LAST != 0;
                self.absorbed.push(AbsorbedWord { word: data, last });
                if last {
                    self.busy_cycles = self.permute_cycles;
                    self.squeeze_armed = true;
                }
            }
            _ => {
                self.scratch.insert(address, data);
            }
        }
    }

    fn rising_edge(&mut self) {
        if let Some(data) = self.read_latch.take() {
            self.bus_rdata = data;
        }
        self.busy_cycles = self.busy_cycles.saturating_sub(1);

        if self.bus_enable && !self.bus_ready {
            self.bus_ready = true;
            let (direction, data) = if self.bus_write {
                self.write_register(self.bus_addr, self.bus_wdata);
                (BusDirection::Write, self.bus_wdata)
            } else {
                let data = self.read_register(self.bus_addr);
                self.read_latch = Some(data);
                (BusDirection::Read, data)
            };
            self.accesses.push(BusAccess {
                direction,
                address: self.bus_addr,
                data,
            });
        } else {
            self.bus_ready = false;
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn word(value: u64) -> u32 {
    value as u32
}

impl CircuitModel for SpongeBusCircuit {
    fn set(&mut self, signal: Signal, value: u64) {
        match signal {
            Signal::Clk => self.clk = value != 0,
            Signal::RstN => self.rst_n = value != 0,
            Signal::BusEnable => self.bus_enable = value != 0,
            Signal::BusWrite => self.bus_write = value != 0,
            Signal::BusAddr => self.bus_addr = word(value),
            Signal::BusWdata => self.bus_wdata = word(value),
            Signal::BusReady
            | Signal::BusRdata
            | Signal::Start
            | Signal::DataIn
            | Signal::Done
            | Signal::DataOut => {}
        }
    }

    fn eval(&mut self) {
        let rising = self.clk && !self.prev_clk;
        self.prev_clk = self.clk;
        if !self.rst_n {
            self.reset_state();
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
            Signal::BusEnable => u64::from(self.bus_enable),
            Signal::BusWrite => u64::from(self.bus_write),
            Signal::BusAddr => u64::from(self.bus_addr),
            Signal::BusWdata => u64::from(self.bus_wdata),
            Signal::BusReady => u64::from(self.bus_ready),
            Signal::BusRdata => u64::from(self.bus_rdata),
            Signal::Start | Signal::DataIn | Signal::Done | Signal::DataOut => 0,
        }
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}
