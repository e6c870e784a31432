//! Named boundary lines of the driven circuit.

use std::fmt;

/// Number of boundary signals known to the driver.
pub const SIGNAL_COUNT: usize = 12;

/// Direction of a boundary signal as seen from the circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Direction {
    /// Driven by the host, sampled by the circuit.
    Input,
    /// Driven by the circuit, sampled by the host.
    Output,
}

/// Boundary signal of the circuit model.
///
/// Values travel as `u64` and are masked to [`Signal::width`] bits on every
/// set and every sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum Signal {
    /// Clock line.
    Clk = 0,
    /// Active-low reset.
    RstN = 1,
    /// Bus request strobe.
    BusEnable = 2,
    /// Bus direction, `1` for writes.
    BusWrite = 3,
    /// Bus register address.
    BusAddr = 4,
    /// Bus write payload.
    BusWdata = 5,
    /// Registered bus acknowledgement.
    BusReady = 6,
    /// Bus read payload, valid one cycle after acknowledgement.
    BusRdata = 7,
    /// Single-shot start strobe.
    Start = 8,
    /// Single-shot input value.
    DataIn = 9,
    /// Single-shot completion flag.
    Done = 10,
    /// Single-shot result value.
    DataOut = 11,
}

impl Signal {
    /// Every signal in declaration order. Index `i` holds the signal whose
    /// [`Signal::index`] is `i`.
    pub const ALL: [Self; SIGNAL_COUNT] = [
        Self::Clk,
        Self::RstN,
        Self::BusEnable,
        Self::BusWrite,
        Self::BusAddr,
        Self::BusWdata,
        Self::BusReady,
        Self::BusRdata,
        Self::Start,
        Self::DataIn,
        Self::Done,
        Self::DataOut,
    ];

    /// Inputs cleared while reset is asserted. `RstN` itself is excluded.
    pub const CONTROL_INPUTS: [Self; 7] = [
        Self::Clk,
        Self::BusEnable,
        Self::BusWrite,
        Self::BusAddr,
        Self::BusWdata,
        Self::Start,
        Self::DataIn,
    ];

    /// Returns the array index for this signal (`0..SIGNAL_COUNT`).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the HDL port name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Clk => "clk",
            Self::RstN => "rst_n",
            Self::BusEnable => "bus_enable",
            Self::BusWrite => "bus_write",
            Self::BusAddr => "bus_addr",
            Self::BusWdata => "bus_wdata",
            Self::BusReady => "bus_ready",
            Self::BusRdata => "bus_rdata",
            Self::Start => "start",
            Self::DataIn => "data_in",
            Self::Done => "done",
            Self::DataOut => "data_out",
        }
    }

    /// Returns the bit width of the line.
    #[must_use]
    pub const fn width(self) -> u8 {
        match self {
            Self::Clk
            | Self::RstN
            | Self::BusEnable
            | Self::BusWrite
            | Self::BusReady
            | Self::Start
            | Self::Done => 1,
            Self::BusAddr | Self::BusWdata | Self::BusRdata | Self::DataIn | Self::DataOut => 32,
        }
    }

    /// Returns the value mask implied by [`Signal::width`].
    #[must_use]
    pub const fn mask(self) -> u64 {
        let width = self.width();
        if width >= 64 {
            u64::MAX
        } else {
            (1_u64 << width) - 1
        }
    }

    /// Returns whether the host or the circuit drives this line.
    #[must_use]
    pub const fn direction(self) -> Direction {
        match self {
            Self::BusReady | Self::BusRdata | Self::Done | Self::DataOut => Direction::Output,
            Self::Clk
            | Self::RstN
            | Self::BusEnable
            | Self::BusWrite
            | Self::BusAddr
            | Self::BusWdata
            | Self::Start
            | Self::DataIn => Direction::Input,
        }
    }

    /// Returns `true` for host-driven lines.
    #[must_use]
    pub const fn is_input(self) -> bool {
        matches!(self.direction(), Direction::Input)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const _: () = assert_signal_table();

const fn assert_signal_table() {
    let mut index = 0;
    while index < SIGNAL_COUNT {
        assert!(
            Signal::ALL[index].index() == index,
            "signal table must be ordered by index"
        );
        index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::{Direction, Signal, SIGNAL_COUNT};

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = Signal::ALL.iter().map(|signal| signal.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), SIGNAL_COUNT);
    }

    #[test]
    fn handshake_outputs_are_circuit_driven() {
        assert_eq!(Signal::BusReady.direction(), Direction::Output);
        assert_eq!(Signal::BusRdata.direction(), Direction::Output);
        assert_eq!(Signal::Done.direction(), Direction::Output);
        assert_eq!(Signal::DataOut.direction(), Direction::Output);
        assert!(Signal::BusEnable.is_input());
        assert!(Signal::RstN.is_input());
    }

    #[test]
    fn masks_follow_widths() {
        assert_eq!(Signal::Clk.mask(), 1);
        assert_eq!(Signal::BusAddr.mask(), 0xFFFF_FFFF);
        assert_eq!(Signal::DataOut.mask(), 0xFFFF_FFFF);
    }

    #[test]
    fn control_inputs_exclude_reset_and_outputs() {
        assert!(!Signal::CONTROL_INPUTS.contains(&Signal::RstN));
        assert!(Signal::CONTROL_INPUTS.iter().all(|signal| signal.is_input()));
    }

    #[test]
    fn display_uses_port_name() {
        assert_eq!(Signal::BusRdata.to_string(), "bus_rdata");
    }
}
