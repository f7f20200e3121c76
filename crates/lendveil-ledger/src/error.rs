use lendveil_types::{ApplicationKey, ApplicationStatus, LoanId, TermsError, TransitionError};
use thiserror::Error;

/// Rejections reported by the ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("loan not found: {0}")]
    LoanNotFound(LoanId),

    #[error("duplicate loan id: {0}")]
    DuplicateLoan(LoanId),

    #[error("application not found: {0}")]
    ApplicationNotFound(ApplicationKey),

    #[error("application already exists: {0}")]
    DuplicateApplication(ApplicationKey),

    #[error("caller not permitted to {action}")]
    Unauthorized { action: &'static str },

    #[error("loan {loan_id} has no remaining slots ({total_slots} total)")]
    CapacityExceeded { loan_id: LoanId, total_slots: u32 },

    #[error("invalid lifecycle transition for {key}: {from} -> {to}")]
    InvalidTransition {
        key: ApplicationKey,
        from: ApplicationStatus,
        to: ApplicationStatus,
    },

    #[error("application {key} is {status}; its proof can no longer change")]
    ApplicationLocked {
        key: ApplicationKey,
        status: ApplicationStatus,
    },

    #[error("invalid loan terms: {0}")]
    InvalidTerms(#[from] TermsError),

    #[error("repayment deadline overflows for loan {0}")]
    DeadlineOverflow(LoanId),

    #[error("event inconsistent with ledger state: {0}")]
    InconsistentEvent(String),

    #[error("replay failed at sequence {sequence}: {reason}")]
    Replay { sequence: u64, reason: String },

    #[error("ledger lock poisoned")]
    Lock,
}

impl LedgerError {
    pub(crate) fn transition(key: ApplicationKey, err: TransitionError) -> Self {
        LedgerError::InvalidTransition {
            key,
            from: err.from,
            to: err.to,
        }
    }
}
