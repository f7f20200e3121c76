//! Identity reveal gate.
//!
//! A lender may learn who owns an application only after approving it and
//! only once its repayment deadline has passed without repayment. The gate
//! reads the ledger, never writes it, and records every successful reveal.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use lendveil_ledger::{LedgerError, LedgerQuery};
use lendveil_types::{
    time::serde_secs, AccountId, ApplicationKey, ApplicationStatus, Commitment, LoanId, Timestamp,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// Why a reveal was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RevealError {
    #[error("no application {0}")]
    NotFound(ApplicationKey),

    #[error("caller is not the lender of loan {0}")]
    Unauthorized(LoanId),

    #[error("application is {status}; only approved applications can be revealed")]
    NotApproved { status: ApplicationStatus },

    #[error("repayment deadline not passed; {}s remaining", .remaining.as_secs())]
    NotYetOverdue { remaining: Duration },

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("reveal audit log lock poisoned")]
    Lock,
}

/// Audit entry for one successful reveal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealRecord {
    pub reveal_id: Uuid,
    pub loan_id: LoanId,
    pub commitment: Commitment,
    pub revealed_by: AccountId,
    pub revealed_at: Timestamp,
    #[serde(with = "serde_secs")]
    pub overdue_duration: Duration,
}

/// Time-gated disclosure of application owners.
#[derive(Debug, Default)]
pub struct RevealGate {
    audit: RwLock<Vec<RevealRecord>>,
}

impl RevealGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Disclose the owner of `(loan_id, commitment)` to `caller` at `now`.
    ///
    /// Checks run in a fixed order: the loan is resolved and the caller
    /// checked against its lender before the application is looked up, so a
    /// non-lender gets `Unauthorized` whether or not the application exists.
    pub fn reveal<L>(
        &self,
        ledger: &L,
        now: Timestamp,
        loan_id: LoanId,
        commitment: &Commitment,
        caller: &AccountId,
    ) -> Result<AccountId, RevealError>
    where
        L: LedgerQuery + ?Sized,
    {
        let key = ApplicationKey {
            loan_id,
            commitment: *commitment,
        };

        let offer = ledger.loan(loan_id)?.ok_or(RevealError::NotFound(key))?;
        if !offer.is_lender(caller) {
            return Err(RevealError::Unauthorized(loan_id));
        }

        let app = ledger
            .get_application(loan_id, commitment)?
            .ok_or(RevealError::NotFound(key))?;
        if app.status != ApplicationStatus::Approved {
            return Err(RevealError::NotApproved { status: app.status });
        }

        let deadline = app
            .repayment_deadline
            .ok_or(RevealError::NotApproved { status: app.status })?;
        if now <= deadline {
            return Err(RevealError::NotYetOverdue {
                remaining: deadline.saturating_duration_since(now),
            });
        }

        let record = RevealRecord {
            reveal_id: Uuid::new_v4(),
            loan_id,
            commitment: *commitment,
            revealed_by: caller.clone(),
            revealed_at: now,
            overdue_duration: now.saturating_duration_since(deadline),
        };
        info!(
            reveal_id = %record.reveal_id,
            loan_id = %loan_id,
            commitment = %commitment.short(),
            overdue_secs = record.overdue_duration.as_secs(),
            "Owner identity revealed to lender"
        );
        self.write()?.push(record);

        Ok(app.owner_ref)
    }

    /// Every recorded reveal, oldest first.
    pub fn audit_log(&self) -> Result<Vec<RevealRecord>, RevealError> {
        Ok(self.read()?.clone())
    }

    pub fn reveals_for_loan(&self, loan_id: LoanId) -> Result<Vec<RevealRecord>, RevealError> {
        Ok(self
            .read()?
            .iter()
            .filter(|r| r.loan_id == loan_id)
            .cloned()
            .collect())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<RevealRecord>>, RevealError> {
        self.audit.read().map_err(|_| RevealError::Lock)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<RevealRecord>>, RevealError> {
        self.audit.write().map_err(|_| RevealError::Lock)
    }
}
