use thiserror::Error;

/// Reason a [`crate::DriverConfig`] was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ConfigIssue {
    /// Reset pulse must toggle an even number of half-cycles so the clock
    /// ends low.
    #[error("reset pulse must span an even number of half-cycles")]
    OddResetPulse,
    /// Bus polling needs at least one cycle.
    #[error("bus timeout budget must be non-zero")]
    ZeroBusBudget,
    /// Single-shot polling needs at least one cycle.
    #[error("single-shot timeout budget must be non-zero")]
    ZeroShotBudget,
}

/// Failure taxonomy for every driver operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum DriverError {
    /// Operation attempted on an uninitialised or torn-down session.
    #[error("session is not initialised or has been closed")]
    InvalidSession,
    /// A bus or single-shot transaction exceeded its cycle budget.
    #[error("transaction timed out after {cycles} cycles")]
    Timeout {
        /// Bus address of the timed-out transaction; `None` for single-shot.
        address: Option<u32>,
        /// Full clock cycles spent polling before giving up.
        cycles: u32,
    },
    /// A transaction was started while the clock was not in its low phase.
    #[error("transaction issued outside the low clock phase")]
    ProtocolViolation,
    /// Configuration failed validation.
    #[error("invalid driver configuration: {0}")]
    InvalidConfig(ConfigIssue),
}

impl DriverError {
    /// Returns `true` for transient conditions a caller may re-issue from a
    /// clean signal state.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` for programming-contract violations that must abort the
    /// calling sequence.
    #[must_use]
    pub const fn is_contract_violation(self) -> bool {
        matches!(
            self,
            Self::InvalidSession | Self::ProtocolViolation | Self::InvalidConfig(_)
        )
    }
}

impl From<ConfigIssue> for DriverError {
    fn from(issue: ConfigIssue) -> Self {
        Self::InvalidConfig(issue)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigIssue, DriverError};

    #[test]
    fn only_timeouts_are_retryable() {
        let timeout = DriverError::Timeout {
            address: Some(0x14),
            cycles: 100,
        };
        assert!(timeout.is_retryable());
        assert!(!timeout.is_contract_violation());
        assert!(!DriverError::InvalidSession.is_retryable());
        assert!(DriverError::InvalidSession.is_contract_violation());
        assert!(DriverError::ProtocolViolation.is_contract_violation());
    }

    #[test]
    fn messages_are_stable() {
        assert_eq!(
            DriverError::Timeout {
                address: None,
                cycles: 1000
            }
            .to_string(),
            "transaction timed out after 1000 cycles"
        );
        assert_eq!(
            DriverError::from(ConfigIssue::OddResetPulse).to_string(),
            "invalid driver configuration: reset pulse must span an even number of half-cycles"
        );
    }
}
