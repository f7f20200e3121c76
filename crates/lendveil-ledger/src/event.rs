//! Ledger events: the append-only history of accepted mutations.

use lendveil_types::{
    AccountId, ApplicationKey, Commitment, LoanId, LoanOffer, ProofReference, Timestamp,
};
use serde::{Deserialize, Serialize};

/// One accepted ledger mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// Dense, zero-based position in the log.
    pub sequence: u64,
    pub at: Timestamp,
    pub kind: LedgerEventKind,
}

/// Externally tagged: `{"offer_created": {...}}`. Internal tagging would
/// buffer the payload and lose `u128` amounts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEventKind {
    OfferCreated {
        offer: LoanOffer,
    },
    ApplicationSubmitted {
        loan_id: LoanId,
        commitment: Commitment,
        owner_ref: AccountId,
        proof_reference: ProofReference,
    },
    ProofUpdated {
        loan_id: LoanId,
        commitment: Commitment,
        updated_by: AccountId,
        proof_reference: ProofReference,
    },
    ApplicationApproved {
        loan_id: LoanId,
        commitment: Commitment,
        approved_by: AccountId,
        repayment_deadline: Timestamp,
    },
    ApplicationRepaid {
        loan_id: LoanId,
        commitment: Commitment,
        repaid_by: AccountId,
    },
}

impl LedgerEventKind {
    pub fn event_type(&self) -> &'static str {
        match self {
            LedgerEventKind::OfferCreated { .. } => "OfferCreated",
            LedgerEventKind::ApplicationSubmitted { .. } => "ApplicationSubmitted",
            LedgerEventKind::ProofUpdated { .. } => "ProofUpdated",
            LedgerEventKind::ApplicationApproved { .. } => "ApplicationApproved",
            LedgerEventKind::ApplicationRepaid { .. } => "ApplicationRepaid",
        }
    }

    pub fn loan_id(&self) -> LoanId {
        match self {
            LedgerEventKind::OfferCreated { offer } => offer.loan_id,
            LedgerEventKind::ApplicationSubmitted { loan_id, .. }
            | LedgerEventKind::ProofUpdated { loan_id, .. }
            | LedgerEventKind::ApplicationApproved { loan_id, .. }
            | LedgerEventKind::ApplicationRepaid { loan_id, .. } => *loan_id,
        }
    }

    /// The application this event touches, if any.
    pub fn application_key(&self) -> Option<ApplicationKey> {
        match self {
            LedgerEventKind::OfferCreated { .. } => None,
            LedgerEventKind::ApplicationSubmitted {
                loan_id,
                commitment,
                ..
            }
            | LedgerEventKind::ProofUpdated {
                loan_id,
                commitment,
                ..
            }
            | LedgerEventKind::ApplicationApproved {
                loan_id,
                commitment,
                ..
            }
            | LedgerEventKind::ApplicationRepaid {
                loan_id,
                commitment,
                ..
            } => Some(ApplicationKey {
                loan_id: *loan_id,
                commitment: *commitment,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use lendveil_types::LoanTerms;

    fn commitment() -> Commitment {
        "0x1".parse().unwrap()
    }

    fn every_kind() -> Vec<LedgerEventKind> {
        let wallet = AccountId::new("wallet123");
        vec![
            LedgerEventKind::OfferCreated {
                offer: LoanOffer::from_terms(
                    LoanId(7),
                    AccountId::new("lender"),
                    LoanTerms {
                        amount_per_unit: u128::from(u64::MAX) + 1,
                        total_slots: 2,
                        interest_rate_bps: 500,
                        repayment_period: Duration::from_secs(600),
                        min_score_threshold: 650,
                    },
                    Timestamp::from_secs(800),
                ),
            },
            LedgerEventKind::ApplicationSubmitted {
                loan_id: LoanId(7),
                commitment: commitment(),
                owner_ref: wallet.clone(),
                proof_reference: ProofReference::new("proof-a"),
            },
            LedgerEventKind::ProofUpdated {
                loan_id: LoanId(7),
                commitment: commitment(),
                updated_by: wallet.clone(),
                proof_reference: ProofReference::new("proof-b"),
            },
            LedgerEventKind::ApplicationApproved {
                loan_id: LoanId(7),
                commitment: commitment(),
                approved_by: AccountId::new("lender"),
                repayment_deadline: Timestamp::from_secs(1600),
            },
            LedgerEventKind::ApplicationRepaid {
                loan_id: LoanId(7),
                commitment: commitment(),
                repaid_by: wallet,
            },
        ]
    }

    #[test]
    fn events_serialize_keyed_by_kind() {
        let event = LedgerEvent {
            sequence: 3,
            at: Timestamp::from_secs(1000),
            kind: LedgerEventKind::ApplicationRepaid {
                loan_id: LoanId(7),
                commitment: commitment(),
                repaid_by: AccountId::new("wallet123"),
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"]["application_repaid"]["loan_id"], 7);
        assert_eq!(json["at"], 1000);

        let back: LedgerEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.kind.event_type(), "ApplicationRepaid");
        assert_eq!(back.kind.loan_id(), LoanId(7));
    }

    #[test]
    fn every_kind_reads_back_from_json_text() {
        for (sequence, kind) in every_kind().into_iter().enumerate() {
            let event = LedgerEvent {
                sequence: sequence as u64,
                at: Timestamp::from_secs(1000),
                kind,
            };
            let text = serde_json::to_string(&event).unwrap();
            let back: LedgerEvent = serde_json::from_str(&text)
                .unwrap_or_else(|err| panic!("{}: {err}", event.kind.event_type()));
            assert_eq!(back, event);
        }
    }

    #[test]
    fn offer_amount_above_u64_survives() {
        let text = serde_json::to_string(&every_kind()[0]).unwrap();
        let back: LedgerEventKind = serde_json::from_str(&text).unwrap();
        let LedgerEventKind::OfferCreated { offer } = back else {
            panic!("expected an offer");
        };
        assert_eq!(offer.amount_per_unit, u128::from(u64::MAX) + 1);
    }
}
