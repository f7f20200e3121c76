use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::TermsError;
use crate::ids::{AccountId, LoanId};
use crate::time::{serde_secs, Timestamp};

/// Denominator for interest rates expressed in basis points.
pub const BASIS_POINTS_DENOMINATOR: u32 = 10_000;

/// Terms a lender publishes when creating an offer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Principal disbursed per approved slot, in minor units.
    pub amount_per_unit: u128,
    pub total_slots: u32,
    pub interest_rate_bps: u32,
    #[serde(with = "serde_secs")]
    pub repayment_period: Duration,
    pub min_score_threshold: u32,
}

impl LoanTerms {
    pub fn validate(&self) -> Result<(), TermsError> {
        if self.total_slots == 0 {
            return Err(TermsError::ZeroSlots);
        }
        if self.amount_per_unit == 0 {
            return Err(TermsError::ZeroAmount);
        }
        if self.repayment_period.as_secs() == 0 {
            return Err(TermsError::ZeroRepaymentPeriod);
        }
        if self.interest_rate_bps > BASIS_POINTS_DENOMINATOR {
            return Err(TermsError::InterestRateOutOfRange(self.interest_rate_bps));
        }
        Ok(())
    }
}

/// A lender's standing offer.
///
/// `filled_slots` only grows, and only on approval; `filled_slots <= total_slots`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanOffer {
    pub loan_id: LoanId,
    pub lender: AccountId,
    pub amount_per_unit: u128,
    pub total_slots: u32,
    pub filled_slots: u32,
    pub interest_rate_bps: u32,
    #[serde(with = "serde_secs")]
    pub repayment_period: Duration,
    pub min_score_threshold: u32,
    pub created_at: Timestamp,
}

impl LoanOffer {
    pub fn from_terms(
        loan_id: LoanId,
        lender: AccountId,
        terms: LoanTerms,
        created_at: Timestamp,
    ) -> Self {
        Self {
            loan_id,
            lender,
            amount_per_unit: terms.amount_per_unit,
            total_slots: terms.total_slots,
            filled_slots: 0,
            interest_rate_bps: terms.interest_rate_bps,
            repayment_period: terms.repayment_period,
            min_score_threshold: terms.min_score_threshold,
            created_at,
        }
    }

    pub fn is_lender(&self, account: &AccountId) -> bool {
        self.lender == *account
    }

    pub fn has_capacity(&self) -> bool {
        self.filled_slots < self.total_slots
    }

    pub fn remaining_slots(&self) -> u32 {
        self.total_slots.saturating_sub(self.filled_slots)
    }

    /// Deadline for an application approved at `approved_at`.
    pub fn deadline_from(&self, approved_at: Timestamp) -> Option<Timestamp> {
        approved_at.checked_add(self.repayment_period)
    }

    /// Principal plus interest owed per slot, `None` on overflow.
    pub fn repayment_due_per_unit(&self) -> Option<u128> {
        let interest = self
            .amount_per_unit
            .checked_mul(u128::from(self.interest_rate_bps))?
            / u128::from(BASIS_POINTS_DENOMINATOR);
        self.amount_per_unit.checked_add(interest)
    }
}
