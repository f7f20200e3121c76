//! In-memory reference ledger.
//!
//! State is a projection of the event log: every mutation is validated and
//! applied as a [`LedgerEventKind`], and [`InMemoryLedger::replay`] runs the
//! exact same code path over a recorded history.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use lendveil_types::{
    AccountId, Application, ApplicationKey, ApplicationStatus, Commitment, LoanId, LoanOffer,
    LoanTerms, ProofReference, Timestamp,
};
use tracing::debug;

use crate::error::LedgerError;
use crate::event::{LedgerEvent, LedgerEventKind};
use crate::traits::{LedgerHistory, LedgerMutation, LedgerQuery};

/// Thread-safe in-memory ledger. Append-only: nothing is ever deleted.
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

#[derive(Default)]
struct LedgerState {
    loans: BTreeMap<LoanId, LoanOffer>,
    applications: HashMap<ApplicationKey, Application>,
    events: Vec<LedgerEvent>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
        }
    }

    /// Rebuild a ledger from its event history.
    ///
    /// Sequences must start at 0 and be dense; every event is re-validated.
    pub fn replay(events: impl IntoIterator<Item = LedgerEvent>) -> Result<Self, LedgerError> {
        let mut state = LedgerState::default();

        for (expected, event) in events.into_iter().enumerate() {
            let expected = expected as u64;
            if event.sequence != expected {
                return Err(LedgerError::Replay {
                    sequence: event.sequence,
                    reason: format!("expected sequence {expected}"),
                });
            }
            state
                .apply(&event.kind, event.at)
                .map_err(|err| LedgerError::Replay {
                    sequence: event.sequence,
                    reason: err.to_string(),
                })?;
            state.events.push(event);
        }

        debug!(events = state.events.len(), loans = state.loans.len(), "Ledger replayed");
        Ok(Self {
            state: RwLock::new(state),
        })
    }

    /// Total number of applications across all loans.
    pub fn application_count(&self) -> Result<usize, LedgerError> {
        Ok(self.read()?.applications.len())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, LedgerState>, LedgerError> {
        self.state.read().map_err(|_| LedgerError::Lock)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, LedgerState>, LedgerError> {
        self.state.write().map_err(|_| LedgerError::Lock)
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerState {
    fn next_loan_id(&self) -> LoanId {
        self.loans
            .keys()
            .next_back()
            .map(|id| LoanId(id.0.saturating_add(1)))
            .unwrap_or(LoanId(1))
    }

    fn application(&self, key: &ApplicationKey) -> Result<Application, LedgerError> {
        self.applications
            .get(key)
            .cloned()
            .ok_or(LedgerError::ApplicationNotFound(*key))
    }

    /// Validate, apply and append one event.
    fn commit(&mut self, at: Timestamp, kind: LedgerEventKind) -> Result<(), LedgerError> {
        self.apply(&kind, at)?;
        let sequence = self.events.len() as u64;
        debug!(
            sequence,
            event = kind.event_type(),
            loan_id = %kind.loan_id(),
            "Ledger event committed"
        );
        self.events.push(LedgerEvent { sequence, at, kind });
        Ok(())
    }

    fn apply(&mut self, kind: &LedgerEventKind, at: Timestamp) -> Result<(), LedgerError> {
        match kind {
            LedgerEventKind::OfferCreated { offer } => {
                if self.loans.contains_key(&offer.loan_id) {
                    return Err(LedgerError::DuplicateLoan(offer.loan_id));
                }
                if offer.filled_slots != 0 {
                    return Err(LedgerError::InconsistentEvent(format!(
                        "offer {} created with {} filled slots",
                        offer.loan_id, offer.filled_slots
                    )));
                }
                terms_of(offer).validate()?;
                self.loans.insert(offer.loan_id, offer.clone());
            }

            LedgerEventKind::ApplicationSubmitted {
                loan_id,
                commitment,
                owner_ref,
                proof_reference,
            } => {
                if !self.loans.contains_key(loan_id) {
                    return Err(LedgerError::LoanNotFound(*loan_id));
                }
                let key = ApplicationKey {
                    loan_id: *loan_id,
                    commitment: *commitment,
                };
                if self.applications.contains_key(&key) {
                    return Err(LedgerError::DuplicateApplication(key));
                }
                self.applications.insert(
                    key,
                    Application::pending(
                        *loan_id,
                        *commitment,
                        owner_ref.clone(),
                        proof_reference.clone(),
                        at,
                    ),
                );
            }

            LedgerEventKind::ProofUpdated {
                loan_id,
                commitment,
                updated_by,
                proof_reference,
            } => {
                let key = ApplicationKey {
                    loan_id: *loan_id,
                    commitment: *commitment,
                };
                let app = self
                    .applications
                    .get_mut(&key)
                    .ok_or(LedgerError::ApplicationNotFound(key))?;
                if app.owner_ref != *updated_by {
                    return Err(LedgerError::Unauthorized {
                        action: "update the proof of this application",
                    });
                }
                if app.status != ApplicationStatus::Pending {
                    return Err(LedgerError::ApplicationLocked {
                        key,
                        status: app.status,
                    });
                }
                app.proof_reference = proof_reference.clone();
            }

            LedgerEventKind::ApplicationApproved {
                loan_id,
                commitment,
                approved_by,
                repayment_deadline,
            } => {
                let offer = self
                    .loans
                    .get_mut(loan_id)
                    .ok_or(LedgerError::LoanNotFound(*loan_id))?;
                if !offer.is_lender(approved_by) {
                    return Err(LedgerError::Unauthorized {
                        action: "approve applications for this loan",
                    });
                }

                let key = ApplicationKey {
                    loan_id: *loan_id,
                    commitment: *commitment,
                };
                let app = self
                    .applications
                    .get_mut(&key)
                    .ok_or(LedgerError::ApplicationNotFound(key))?;
                if app.status != ApplicationStatus::Pending {
                    return Err(LedgerError::InvalidTransition {
                        key,
                        from: app.status,
                        to: ApplicationStatus::Approved,
                    });
                }
                if !offer.has_capacity() {
                    return Err(LedgerError::CapacityExceeded {
                        loan_id: *loan_id,
                        total_slots: offer.total_slots,
                    });
                }

                let deadline = offer
                    .deadline_from(at)
                    .ok_or(LedgerError::DeadlineOverflow(*loan_id))?;
                if deadline != *repayment_deadline {
                    return Err(LedgerError::InconsistentEvent(format!(
                        "approval of {key} records deadline {} but terms give {}",
                        repayment_deadline.as_secs(),
                        deadline.as_secs()
                    )));
                }

                app.approve(at, deadline)
                    .map_err(|err| LedgerError::transition(key, err))?;
                offer.filled_slots += 1;
            }

            LedgerEventKind::ApplicationRepaid {
                loan_id,
                commitment,
                repaid_by,
            } => {
                let key = ApplicationKey {
                    loan_id: *loan_id,
                    commitment: *commitment,
                };
                let app = self
                    .applications
                    .get_mut(&key)
                    .ok_or(LedgerError::ApplicationNotFound(key))?;
                if app.owner_ref != *repaid_by {
                    return Err(LedgerError::Unauthorized {
                        action: "repay this application",
                    });
                }
                let changed = app
                    .mark_repaid(at)
                    .map_err(|err| LedgerError::transition(key, err))?;
                if !changed {
                    return Err(LedgerError::InconsistentEvent(format!(
                        "repayment of {key} recorded twice"
                    )));
                }
            }
        }
        Ok(())
    }
}

fn terms_of(offer: &LoanOffer) -> LoanTerms {
    LoanTerms {
        amount_per_unit: offer.amount_per_unit,
        total_slots: offer.total_slots,
        interest_rate_bps: offer.interest_rate_bps,
        repayment_period: offer.repayment_period,
        min_score_threshold: offer.min_score_threshold,
    }
}

impl LedgerQuery for InMemoryLedger {
    fn loan(&self, loan_id: LoanId) -> Result<Option<LoanOffer>, LedgerError> {
        Ok(self.read()?.loans.get(&loan_id).cloned())
    }

    fn loan_ids(&self) -> Result<Vec<LoanId>, LedgerError> {
        Ok(self.read()?.loans.keys().copied().collect())
    }

    fn get_application(
        &self,
        loan_id: LoanId,
        commitment: &Commitment,
    ) -> Result<Option<Application>, LedgerError> {
        let key = ApplicationKey {
            loan_id,
            commitment: *commitment,
        };
        Ok(self.read()?.applications.get(&key).cloned())
    }
}

impl LedgerMutation for InMemoryLedger {
    fn create_offer(
        &self,
        lender: &AccountId,
        terms: LoanTerms,
        requested_id: Option<LoanId>,
        at: Timestamp,
    ) -> Result<LoanOffer, LedgerError> {
        terms.validate()?;
        let mut state = self.write()?;
        let loan_id = requested_id.unwrap_or_else(|| state.next_loan_id());
        let offer = LoanOffer::from_terms(loan_id, lender.clone(), terms, at);
        state.commit(
            at,
            LedgerEventKind::OfferCreated {
                offer: offer.clone(),
            },
        )?;
        Ok(offer)
    }

    fn submit_application(
        &self,
        loan_id: LoanId,
        commitment: &Commitment,
        owner: &AccountId,
        proof_reference: ProofReference,
        at: Timestamp,
    ) -> Result<Application, LedgerError> {
        let mut state = self.write()?;
        state.commit(
            at,
            LedgerEventKind::ApplicationSubmitted {
                loan_id,
                commitment: *commitment,
                owner_ref: owner.clone(),
                proof_reference,
            },
        )?;
        state.application(&ApplicationKey {
            loan_id,
            commitment: *commitment,
        })
    }

    fn update_proof(
        &self,
        loan_id: LoanId,
        commitment: &Commitment,
        owner: &AccountId,
        proof_reference: ProofReference,
        at: Timestamp,
    ) -> Result<Application, LedgerError> {
        let mut state = self.write()?;
        state.commit(
            at,
            LedgerEventKind::ProofUpdated {
                loan_id,
                commitment: *commitment,
                updated_by: owner.clone(),
                proof_reference,
            },
        )?;
        state.application(&ApplicationKey {
            loan_id,
            commitment: *commitment,
        })
    }

    fn approve(
        &self,
        caller: &AccountId,
        loan_id: LoanId,
        commitment: &Commitment,
        at: Timestamp,
    ) -> Result<Application, LedgerError> {
        let mut state = self.write()?;
        let deadline = state
            .loans
            .get(&loan_id)
            .ok_or(LedgerError::LoanNotFound(loan_id))?
            .deadline_from(at)
            .ok_or(LedgerError::DeadlineOverflow(loan_id))?;
        state.commit(
            at,
            LedgerEventKind::ApplicationApproved {
                loan_id,
                commitment: *commitment,
                approved_by: caller.clone(),
                repayment_deadline: deadline,
            },
        )?;
        state.application(&ApplicationKey {
            loan_id,
            commitment: *commitment,
        })
    }

    fn repay(
        &self,
        caller: &AccountId,
        loan_id: LoanId,
        commitment: &Commitment,
        at: Timestamp,
    ) -> Result<Application, LedgerError> {
        let mut state = self.write()?;
        let key = ApplicationKey {
            loan_id,
            commitment: *commitment,
        };
        let current = state.application(&key)?;
        if current.owner_ref != *caller {
            return Err(LedgerError::Unauthorized {
                action: "repay this application",
            });
        }
        if current.status == ApplicationStatus::Repaid {
            return Ok(current);
        }
        state.commit(
            at,
            LedgerEventKind::ApplicationRepaid {
                loan_id,
                commitment: *commitment,
                repaid_by: caller.clone(),
            },
        )?;
        state.application(&key)
    }
}

impl LedgerHistory for InMemoryLedger {
    fn events_since(&self, from: u64) -> Result<Vec<LedgerEvent>, LedgerError> {
        let state = self.read()?;
        let start = usize::try_from(from)
            .unwrap_or(usize::MAX)
            .min(state.events.len());
        Ok(state.events[start..].to_vec())
    }
}
