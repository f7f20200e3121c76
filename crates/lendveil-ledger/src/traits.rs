use lendveil_types::{
    AccountId, Application, Commitment, LoanId, LoanOffer, LoanTerms, ProofReference, Timestamp,
};

use crate::error::LedgerError;
use crate::event::LedgerEvent;

/// Read-only lookups against the authoritative ledger.
///
/// There is no way to list the applications of a loan; callers
/// must already know the commitment they are asking about.
pub trait LedgerQuery: Send + Sync {
    fn loan(&self, loan_id: LoanId) -> Result<Option<LoanOffer>, LedgerError>;

    /// Every loan id the ledger knows, ascending.
    fn loan_ids(&self) -> Result<Vec<LoanId>, LedgerError>;

    fn get_application(
        &self,
        loan_id: LoanId,
        commitment: &Commitment,
    ) -> Result<Option<Application>, LedgerError>;
}

/// Ledger-level transactions.
///
/// Implementations enforce the same guards as the engine: duplicate keys,
/// lender/owner authorization, slot capacity and forward-only transitions.
pub trait LedgerMutation: Send + Sync {
    /// Publish a new offer; `requested_id` pins the loan id, otherwise the ledger assigns one.
    fn create_offer(
        &self,
        lender: &AccountId,
        terms: LoanTerms,
        requested_id: Option<LoanId>,
        at: Timestamp,
    ) -> Result<LoanOffer, LedgerError>;

    fn submit_application(
        &self,
        loan_id: LoanId,
        commitment: &Commitment,
        owner: &AccountId,
        proof_reference: ProofReference,
        at: Timestamp,
    ) -> Result<Application, LedgerError>;

    /// Replace the proof of a Pending application, leaving status and timestamps alone.
    fn update_proof(
        &self,
        loan_id: LoanId,
        commitment: &Commitment,
        owner: &AccountId,
        proof_reference: ProofReference,
        at: Timestamp,
    ) -> Result<Application, LedgerError>;

    fn approve(
        &self,
        caller: &AccountId,
        loan_id: LoanId,
        commitment: &Commitment,
        at: Timestamp,
    ) -> Result<Application, LedgerError>;

    /// Repaying an already-repaid application succeeds without changing it.
    fn repay(
        &self,
        caller: &AccountId,
        loan_id: LoanId,
        commitment: &Commitment,
        at: Timestamp,
    ) -> Result<Application, LedgerError>;
}

/// Access to the ledger's append-only event history.
pub trait LedgerHistory: Send + Sync {
    fn events(&self) -> Result<Vec<LedgerEvent>, LedgerError> {
        self.events_since(0)
    }

    /// Events with `sequence >= from`.
    fn events_since(&self, from: u64) -> Result<Vec<LedgerEvent>, LedgerError>;
}

/// A full ledger: queries, transactions and history.
pub trait Ledger: LedgerQuery + LedgerMutation + LedgerHistory {}

impl<T: LedgerQuery + LedgerMutation + LedgerHistory> Ledger for T {}
