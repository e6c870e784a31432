//! Immutable driver configuration.

use crate::{ConfigIssue, DEFAULT_RATE};

/// Default reset pulse length in half-cycles.
pub const DEFAULT_RESET_HALF_CYCLES: u16 = 10;

/// Default bus handshake budget in full clock cycles.
pub const DEFAULT_BUS_TIMEOUT_CYCLES: u16 = 100;

/// Default extra full cycles between `bus_ready` and valid `bus_rdata`.
pub const DEFAULT_READ_LATENCY_CYCLES: u16 = 1;

/// Default single-shot `done` polling budget in full clock cycles.
pub const DEFAULT_SHOT_TIMEOUT_CYCLES: u32 = 1000;

/// Top-level configuration shared by sessions and single-shot invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DriverConfig {
    /// Half-cycles toggled while reset is held. Must be even.
    pub reset_half_cycles: u16,
    /// Full cycles a bus transaction may poll for `bus_ready`.
    pub bus_timeout_cycles: u16,
    /// Extra full cycles waited after `bus_ready` before sampling `bus_rdata`.
    pub read_latency_cycles: u16,
    /// Value written to the rate register at the start of every absorption.
    pub absorb_rate: u32,
    /// Full cycles a single-shot invocation may poll for `done`.
    pub shot_timeout_cycles: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            reset_half_cycles: DEFAULT_RESET_HALF_CYCLES,
            bus_timeout_cycles: DEFAULT_BUS_TIMEOUT_CYCLES,
            read_latency_cycles: DEFAULT_READ_LATENCY_CYCLES,
            absorb_rate: DEFAULT_RATE,
            shot_timeout_cycles: DEFAULT_SHOT_TIMEOUT_CYCLES,
        }
    }
}

impl DriverConfig {
    /// Checks the invariants the sequencers rely on.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigIssue`] found.
    pub const fn validate(&self) -> Result<(), ConfigIssue> {
        if self.reset_half_cycles % 2 != 0 {
            return Err(ConfigIssue::OddResetPulse);
        }
        if self.bus_timeout_cycles == 0 {
            return Err(ConfigIssue::ZeroBusBudget);
        }
        if self.shot_timeout_cycles == 0 {
            return Err(ConfigIssue::ZeroShotBudget);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DriverConfig, DEFAULT_BUS_TIMEOUT_CYCLES, DEFAULT_READ_LATENCY_CYCLES,
        DEFAULT_RESET_HALF_CYCLES, DEFAULT_SHOT_TIMEOUT_CYCLES,
    };
    use crate::ConfigIssue;

    #[test]
    fn default_config_matches_reference_timing() {
        let config = DriverConfig::default();
        assert_eq!(config.reset_half_cycles, DEFAULT_RESET_HALF_CYCLES);
        assert_eq!(config.reset_half_cycles, 10);
        assert_eq!(config.bus_timeout_cycles, DEFAULT_BUS_TIMEOUT_CYCLES);
        assert_eq!(config.bus_timeout_cycles, 100);
        assert_eq!(config.read_latency_cycles, DEFAULT_READ_LATENCY_CYCLES);
        assert_eq!(config.absorb_rate, 21);
        assert_eq!(config.shot_timeout_cycles, DEFAULT_SHOT_TIMEOUT_CYCLES);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn odd_reset_pulse_is_rejected() {
        let config = DriverConfig {
            reset_half_cycles: 9,
            ..DriverConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigIssue::OddResetPulse));
    }

    #[test]
    fn zero_budgets_are_rejected() {
        let bus = DriverConfig {
            bus_timeout_cycles: 0,
            ..DriverConfig::default()
        };
        assert_eq!(bus.validate(), Err(ConfigIssue::ZeroBusBudget));

        let shot = DriverConfig {
            shot_timeout_cycles: 0,
            ..DriverConfig::default()
        };
        assert_eq!(shot.validate(), Err(ConfigIssue::ZeroShotBudget));
    }

    #[test]
    fn zero_read_latency_is_allowed() {
        let config = DriverConfig {
            read_latency_cycles: 0,
            ..DriverConfig::default()
        };
        assert_eq!(config.validate(), Ok(()));
    }
}
