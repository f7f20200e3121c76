use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::commitment::Commitment;
use crate::error::TransitionError;
use crate::ids::{AccountId, LoanId, ProofReference};
use crate::time::Timestamp;

/// Lifecycle status of an application. Moves forward only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Repaid,
}

impl ApplicationStatus {
    fn rank(self) -> u8 {
        match self {
            ApplicationStatus::Pending => 0,
            ApplicationStatus::Approved => 1,
            ApplicationStatus::Repaid => 2,
        }
    }

    /// Whether `next` is the immediate successor of this status.
    pub fn can_advance_to(self, next: ApplicationStatus) -> bool {
        next.rank() == self.rank() + 1
    }

    pub fn is_terminal(self) -> bool {
        self == ApplicationStatus::Repaid
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Repaid => "repaid",
        };
        f.write_str(s)
    }
}

/// Ledger key of an application: one per `(loan_id, commitment)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationKey {
    pub loan_id: LoanId,
    pub commitment: Commitment,
}

impl fmt::Display for ApplicationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.loan_id, self.commitment.short())
    }
}

/// One owner's request against one loan offer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub loan_id: LoanId,
    pub commitment: Commitment,
    /// Underlying ledger identity; only disclosed through the reveal gate.
    pub owner_ref: AccountId,
    pub proof_reference: ProofReference,
    pub status: ApplicationStatus,
    pub applied_at: Timestamp,
    pub approved_at: Option<Timestamp>,
    pub repayment_deadline: Option<Timestamp>,
    pub repaid_at: Option<Timestamp>,
}

impl Application {
    pub fn pending(
        loan_id: LoanId,
        commitment: Commitment,
        owner_ref: AccountId,
        proof_reference: ProofReference,
        applied_at: Timestamp,
    ) -> Self {
        Self {
            loan_id,
            commitment,
            owner_ref,
            proof_reference,
            status: ApplicationStatus::Pending,
            applied_at,
            approved_at: None,
            repayment_deadline: None,
            repaid_at: None,
        }
    }

    pub fn key(&self) -> ApplicationKey {
        ApplicationKey {
            loan_id: self.loan_id,
            commitment: self.commitment,
        }
    }

    /// Pending → Approved. Writes `approved_at` and the deadline exactly once.
    pub fn approve(&mut self, at: Timestamp, deadline: Timestamp) -> Result<(), TransitionError> {
        self.check_advance(ApplicationStatus::Approved)?;
        self.status = ApplicationStatus::Approved;
        self.approved_at = Some(at);
        self.repayment_deadline = Some(deadline);
        Ok(())
    }

    /// Approved → Repaid. Returns `false` when the application was already repaid.
    pub fn mark_repaid(&mut self, at: Timestamp) -> Result<bool, TransitionError> {
        if self.status == ApplicationStatus::Repaid {
            return Ok(false);
        }
        self.check_advance(ApplicationStatus::Repaid)?;
        self.status = ApplicationStatus::Repaid;
        self.repaid_at = Some(at);
        Ok(true)
    }

    fn check_advance(&self, to: ApplicationStatus) -> Result<(), TransitionError> {
        if self.status.can_advance_to(to) {
            Ok(())
        } else {
            Err(TransitionError {
                from: self.status,
                to,
            })
        }
    }

    /// Approved and strictly past the repayment deadline.
    pub fn is_overdue(&self, now: Timestamp) -> bool {
        match (self.status, self.repayment_deadline) {
            (ApplicationStatus::Approved, Some(deadline)) => now > deadline,
            _ => false,
        }
    }

    /// How long the application has been overdue, if it is.
    pub fn overdue_by(&self, now: Timestamp) -> Option<Duration> {
        if !self.is_overdue(now) {
            return None;
        }
        self.repayment_deadline
            .map(|deadline| now.saturating_duration_since(deadline))
    }

    /// Time left until the deadline; zero once it has been reached.
    pub fn time_until_deadline(&self, now: Timestamp) -> Option<Duration> {
        self.repayment_deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }
}
