//! Loan lifecycle engine.
//!
//! Every operation checks its guards against the ledger's current state
//! before issuing the ledger transaction, which checks them again. The
//! engine adds what the ledger cannot do: commitment ownership checks,
//! proof verification, and discovery of applications by loan or by owner.

use std::sync::Arc;

use lendveil_identity::{CommitmentDeriver, IdentityRegistry};
use lendveil_ledger::Ledger;
use lendveil_types::{
    AccountId, Application, ApplicationKey, ApplicationStatus, Commitment, LoanId, LoanOffer,
    LoanTerms, ProofReference,
};
use tracing::{debug, info};

use crate::cache::{DiscoveryCache, RebuildReport};
use crate::config::EngineConfig;
use crate::error::LendingError;
use crate::reveal::{RevealError, RevealGate};
use crate::traits::{Clock, ProofVerifier};

/// Outcome of [`LoanLifecycle::submit_application`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// A new Pending application was recorded.
    Created(Application),
    /// An existing Pending application received a new proof.
    ProofUpdated(Application),
}

impl Submission {
    pub fn application(&self) -> &Application {
        match self {
            Submission::Created(app) | Submission::ProofUpdated(app) => app,
        }
    }

    pub fn into_application(self) -> Application {
        match self {
            Submission::Created(app) | Submission::ProofUpdated(app) => app,
        }
    }
}

/// The lifecycle engine.
pub struct LoanLifecycle {
    config: EngineConfig,
    deriver: CommitmentDeriver,
    ledger: Arc<dyn Ledger>,
    clock: Arc<dyn Clock>,
    verifier: Arc<dyn ProofVerifier>,
    cache: Arc<DiscoveryCache>,
    registry: IdentityRegistry,
    reveal: RevealGate,
}

impl LoanLifecycle {
    pub fn new(
        config: EngineConfig,
        ledger: Arc<dyn Ledger>,
        clock: Arc<dyn Clock>,
        verifier: Arc<dyn ProofVerifier>,
    ) -> Self {
        Self {
            deriver: config.deriver(),
            config,
            ledger,
            clock,
            verifier,
            cache: Arc::new(DiscoveryCache::new()),
            registry: IdentityRegistry::new(),
            reveal: RevealGate::new(),
        }
    }

    /// Share an existing discovery cache instead of starting empty.
    pub fn with_cache(mut self, cache: Arc<DiscoveryCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Seed the owner-identity registry, e.g. before [`Self::rebuild_discovery`].
    pub fn with_registry(mut self, registry: IdentityRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn deriver(&self) -> &CommitmentDeriver {
        &self.deriver
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    pub fn cache(&self) -> &Arc<DiscoveryCache> {
        &self.cache
    }

    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    pub fn reveal_gate(&self) -> &RevealGate {
        &self.reveal
    }

    // ── Offers ─────────────────────────────────────────

    /// Publish an offer under a ledger-assigned loan id.
    pub fn create_offer(
        &self,
        lender: &AccountId,
        terms: LoanTerms,
    ) -> Result<LoanOffer, LendingError> {
        self.publish(lender, terms, None)
    }

    /// Publish an offer under a specific loan id.
    pub fn create_offer_with_id(
        &self,
        lender: &AccountId,
        loan_id: LoanId,
        terms: LoanTerms,
    ) -> Result<LoanOffer, LendingError> {
        self.publish(lender, terms, Some(loan_id))
    }

    fn publish(
        &self,
        lender: &AccountId,
        terms: LoanTerms,
        loan_id: Option<LoanId>,
    ) -> Result<LoanOffer, LendingError> {
        terms.validate()?;
        let offer = self
            .ledger
            .create_offer(lender, terms, loan_id, self.clock.now())?;
        info!(
            loan_id = %offer.loan_id,
            total_slots = offer.total_slots,
            interest_rate_bps = offer.interest_rate_bps,
            "Loan offer created"
        );
        Ok(offer)
    }

    pub fn loan(&self, loan_id: LoanId) -> Result<LoanOffer, LendingError> {
        self.ledger
            .loan(loan_id)?
            .ok_or(LendingError::LoanNotFound(loan_id))
    }

    // ── Owner side ─────────────────────────────────────

    /// Proof-generation hook: derive `owner`'s commitment and remember it.
    pub fn register_owner(&self, owner: &AccountId) -> Commitment {
        self.registry.register(&self.deriver, owner)
    }

    /// Submit (or re-submit) an application.
    ///
    /// A first submission creates a Pending application. Re-submitting with a
    /// different proof while still Pending replaces only the proof, and the same
    /// proof again is a `DuplicateApplication`. Once approved or repaid the
    /// application cannot return to Pending: `InvalidTransition`.
    pub fn submit_application(
        &self,
        owner: &AccountId,
        loan_id: LoanId,
        commitment: &Commitment,
        proof_reference: ProofReference,
    ) -> Result<Submission, LendingError> {
        if !self.deriver.controls(owner, commitment) {
            return Err(LendingError::Unauthorized {
                action: "apply with a commitment it does not control",
            });
        }
        let offer = self.loan(loan_id)?;
        let key = ApplicationKey {
            loan_id,
            commitment: *commitment,
        };
        self.registry.insert(*commitment);

        let existing = self.ledger.get_application(loan_id, commitment)?;
        if let Some(app) = &existing {
            if app.status != ApplicationStatus::Pending {
                return Err(LendingError::InvalidTransition {
                    from: app.status,
                    to: ApplicationStatus::Pending,
                });
            }
            if app.proof_reference == proof_reference {
                return Err(LendingError::DuplicateApplication(key));
            }
        }

        if !self.verifier.verify(&proof_reference, offer.min_score_threshold) {
            return Err(LendingError::ProofRejected(key));
        }

        let now = self.clock.now();
        let submission = match existing {
            Some(_) => {
                let app = self
                    .ledger
                    .update_proof(loan_id, commitment, owner, proof_reference, now)?;
                info!(loan_id = %loan_id, commitment = %commitment.short(), "Application proof updated");
                Submission::ProofUpdated(app)
            }
            None => {
                let app = self.ledger.submit_application(
                    loan_id,
                    commitment,
                    owner,
                    proof_reference,
                    now,
                )?;
                info!(loan_id = %loan_id, commitment = %commitment.short(), "Application submitted");
                Submission::Created(app)
            }
        };

        self.cache.record_observation(*commitment, loan_id);
        Ok(submission)
    }

    /// Approved → Repaid. Repaying twice is a no-op success.
    pub fn repay(
        &self,
        caller: &AccountId,
        loan_id: LoanId,
        commitment: &Commitment,
    ) -> Result<Application, LendingError> {
        let app = self.application(loan_id, commitment)?;
        if app.owner_ref != *caller {
            return Err(LendingError::Unauthorized {
                action: "repay this application",
            });
        }
        match app.status {
            ApplicationStatus::Repaid => {
                debug!(loan_id = %loan_id, commitment = %commitment.short(), "Application already repaid");
                return Ok(app);
            }
            ApplicationStatus::Pending => {
                return Err(LendingError::InvalidTransition {
                    from: ApplicationStatus::Pending,
                    to: ApplicationStatus::Repaid,
                });
            }
            ApplicationStatus::Approved => {}
        }

        let now = self.clock.now();
        let app = self.ledger.repay(caller, loan_id, commitment, now)?;
        info!(
            loan_id = %loan_id,
            commitment = %commitment.short(),
            late = app.repayment_deadline.is_some_and(|d| now > d),
            "Application repaid"
        );
        Ok(app)
    }

    /// All applications `owner` has made, ordered by loan id.
    ///
    /// Only loans the discovery cache associates with the owner's commitment
    /// are found.
    pub fn applications_for_owner(
        &self,
        owner: &AccountId,
    ) -> Result<Vec<Application>, LendingError> {
        let commitment = self.register_owner(owner);
        let mut found = Vec::new();
        for loan_id in self.cache.loans_for_commitment(&commitment) {
            if let Some(app) = self.ledger.get_application(loan_id, &commitment)? {
                found.push(app);
            }
        }
        debug!(commitment = %commitment.short(), found = found.len(), "Owner applications resolved");
        Ok(found)
    }

    // ── Lender side ────────────────────────────────────

    /// Pending → Approved. Computes and fixes the repayment deadline.
    pub fn approve(
        &self,
        caller: &AccountId,
        loan_id: LoanId,
        commitment: &Commitment,
    ) -> Result<Application, LendingError> {
        let offer = self.loan(loan_id)?;
        if !offer.is_lender(caller) {
            return Err(LendingError::Unauthorized {
                action: "approve applications for this loan",
            });
        }
        let app = self.application(loan_id, commitment)?;
        if app.status != ApplicationStatus::Pending {
            return Err(LendingError::InvalidTransition {
                from: app.status,
                to: ApplicationStatus::Approved,
            });
        }
        if !offer.has_capacity() {
            return Err(LendingError::CapacityExceeded {
                loan_id,
                total_slots: offer.total_slots,
            });
        }

        let app = self
            .ledger
            .approve(caller, loan_id, commitment, self.clock.now())?;
        self.cache.record_observation(*commitment, loan_id);
        info!(
            loan_id = %loan_id,
            commitment = %commitment.short(),
            deadline = ?app.repayment_deadline,
            filled_slots = offer.filled_slots + 1,
            total_slots = offer.total_slots,
            "Application approved"
        );
        Ok(app)
    }

    /// Every known application to `loan_id`, by `applied_at` then commitment.
    ///
    /// Commitments come from the discovery cache and are re-read from the
    /// ledger; any the ledger does not know are skipped.
    pub fn applications_for_loan(&self, loan_id: LoanId) -> Result<Vec<Application>, LendingError> {
        self.loan(loan_id)?;
        let mut found = Vec::new();
        for commitment in self.cache.applications_for_loan(loan_id) {
            if let Some(app) = self.ledger.get_application(loan_id, &commitment)? {
                found.push(app);
            }
        }
        found.sort_by(|a, b| {
            a.applied_at
                .cmp(&b.applied_at)
                .then_with(|| a.commitment.cmp(&b.commitment))
        });
        debug!(loan_id = %loan_id, found = found.len(), "Loan applications resolved");
        Ok(found)
    }

    /// Applications to `loan_id` that are Approved and past their deadline.
    pub fn overdue_applications(&self, loan_id: LoanId) -> Result<Vec<Application>, LendingError> {
        let now = self.clock.now();
        Ok(self
            .applications_for_loan(loan_id)?
            .into_iter()
            .filter(|app| app.is_overdue(now))
            .collect())
    }

    /// Disclose the owner of an overdue application to the loan's lender.
    pub fn reveal_identity(
        &self,
        caller: &AccountId,
        loan_id: LoanId,
        commitment: &Commitment,
    ) -> Result<AccountId, RevealError> {
        self.reveal
            .reveal(&*self.ledger, self.clock.now(), loan_id, commitment, caller)
    }

    // ── Queries ────────────────────────────────────────

    pub fn application(
        &self,
        loan_id: LoanId,
        commitment: &Commitment,
    ) -> Result<Application, LendingError> {
        self.ledger
            .get_application(loan_id, commitment)?
            .ok_or(LendingError::NotFound(ApplicationKey {
                loan_id,
                commitment: *commitment,
            }))
    }

    /// Approved and strictly past the repayment deadline, as of now.
    pub fn is_overdue(&self, loan_id: LoanId, commitment: &Commitment) -> Result<bool, LendingError> {
        Ok(self
            .application(loan_id, commitment)?
            .is_overdue(self.clock.now()))
    }

    /// Rebuild the discovery cache by probing the ledger with every
    /// commitment in the owner-identity registry.
    pub fn rebuild_discovery(&self) -> Result<RebuildReport, LendingError> {
        let report = self
            .cache
            .rebuild_from_ledger(&*self.ledger, self.registry.known_commitments())?;
        info!(
            restored = report.entries_restored,
            loans = report.loans_scanned,
            commitments = report.commitments_scanned,
            "Discovery cache rebuilt"
        );
        Ok(report)
    }
}
