use lendveil_ledger::LedgerError;
use lendveil_types::{
    ApplicationKey, ApplicationStatus, LoanId, ScalarWidthError, TermsError, TransitionError,
};
use thiserror::Error;

/// Lifecycle errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LendingError {
    #[error("loan not found: {0}")]
    LoanNotFound(LoanId),

    #[error("duplicate loan id: {0}")]
    DuplicateLoan(LoanId),

    #[error("application not found: {0}")]
    NotFound(ApplicationKey),

    #[error("application already exists: {0}")]
    DuplicateApplication(ApplicationKey),

    #[error("caller not permitted to {action}")]
    Unauthorized { action: &'static str },

    #[error("loan {loan_id} has no remaining slots ({total_slots} total)")]
    CapacityExceeded { loan_id: LoanId, total_slots: u32 },

    #[error("invalid lifecycle transition: {from} -> {to}")]
    InvalidTransition {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },

    #[error("proof rejected for {0}")]
    ProofRejected(ApplicationKey),

    #[error("invalid loan terms: {0}")]
    InvalidTerms(#[from] TermsError),

    #[error("commitment width overflow: {0}")]
    CommitmentWidthOverflow(#[from] ScalarWidthError),

    #[error("arithmetic overflow computing {0}")]
    Arithmetic(&'static str),

    #[error("lock poisoned")]
    Lock,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("ledger error: {0}")]
    Ledger(LedgerError),
}

impl From<TransitionError> for LendingError {
    fn from(err: TransitionError) -> Self {
        LendingError::InvalidTransition {
            from: err.from,
            to: err.to,
        }
    }
}

impl From<LedgerError> for LendingError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::LoanNotFound(id) => LendingError::LoanNotFound(id),
            LedgerError::DuplicateLoan(id) => LendingError::DuplicateLoan(id),
            LedgerError::ApplicationNotFound(key) => LendingError::NotFound(key),
            LedgerError::DuplicateApplication(key) => LendingError::DuplicateApplication(key),
            // A proof can only be replaced while Pending.
            LedgerError::ApplicationLocked { status, .. } => LendingError::InvalidTransition {
                from: status,
                to: ApplicationStatus::Pending,
            },
            LedgerError::Unauthorized { action } => LendingError::Unauthorized { action },
            LedgerError::CapacityExceeded {
                loan_id,
                total_slots,
            } => LendingError::CapacityExceeded {
                loan_id,
                total_slots,
            },
            LedgerError::InvalidTransition { from, to, .. } => {
                LendingError::InvalidTransition { from, to }
            }
            LedgerError::InvalidTerms(err) => LendingError::InvalidTerms(err),
            LedgerError::DeadlineOverflow(_) => LendingError::Arithmetic("repayment deadline"),
            LedgerError::Lock => LendingError::Lock,
            other @ (LedgerError::InconsistentEvent(_) | LedgerError::Replay { .. }) => {
                LendingError::Ledger(other)
            }
        }
    }
}
