use thiserror::Error;

use crate::application::ApplicationStatus;
use crate::commitment::SCALAR_BITS;

/// Errors raised when a value cannot be represented as a ledger scalar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScalarWidthError {
    #[error("value occupies {bits} bits but the ledger scalar holds at most {max} bits", max = SCALAR_BITS)]
    Overflow { bits: u32 },

    #[error("invalid hex encoding: {0}")]
    InvalidHex(String),

    #[error("expected at most {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Errors from validating loan terms.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TermsError {
    #[error("loan offer must have at least one slot")]
    ZeroSlots,

    #[error("loan amount per unit must be positive")]
    ZeroAmount,

    #[error("repayment period must be positive")]
    ZeroRepaymentPeriod,

    #[error("interest rate {0} bps exceeds 10000 bps")]
    InterestRateOutOfRange(u32),
}

/// A lifecycle step that is not the immediate successor of the current status.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid lifecycle transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: ApplicationStatus,
    pub to: ApplicationStatus,
}
