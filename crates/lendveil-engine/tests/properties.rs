//! Property tests for the lifecycle, reveal gate and discovery cache.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use lendveil_engine::{
    DiscoveryCache, EngineConfig, LendingError, LoanLifecycle, ManualClock, MockProofVerifier,
    RevealError,
};
use lendveil_ledger::{InMemoryLedger, LedgerHistory, LedgerQuery};
use lendveil_types::{AccountId, ApplicationStatus, Commitment, LoanId, LoanTerms, Timestamp};
use proptest::prelude::*;

const OWNERS: u8 = 4;

fn lender() -> AccountId {
    AccountId::new("lender")
}

fn owner(n: u8) -> AccountId {
    AccountId::new(format!("owner-{n}"))
}

fn engine(slots: u32, period: u64) -> (LoanLifecycle, Arc<ManualClock>, Arc<InMemoryLedger>) {
    let clock = Arc::new(ManualClock::new(Timestamp::from_secs(1)));
    let ledger = Arc::new(InMemoryLedger::new());
    let engine = LoanLifecycle::new(
        EngineConfig::default(),
        ledger.clone(),
        clock.clone(),
        Arc::new(MockProofVerifier::accept_all()),
    );
    engine
        .create_offer_with_id(
            &lender(),
            LoanId(1),
            LoanTerms {
                amount_per_unit: 10,
                total_slots: slots,
                interest_rate_bps: 100,
                repayment_period: Duration::from_secs(period),
                min_score_threshold: 0,
            },
        )
        .unwrap();
    (engine, clock, ledger)
}

#[derive(Debug, Clone)]
enum Op {
    Submit(u8),
    Approve(u8),
    Repay(u8),
    Tick(u64),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..OWNERS).prop_map(Op::Submit),
        (0..OWNERS).prop_map(Op::Approve),
        (0..OWNERS).prop_map(Op::Repay),
        (1u64..400).prop_map(Op::Tick),
    ]
}

fn rank(status: ApplicationStatus) -> u8 {
    match status {
        ApplicationStatus::Pending => 0,
        ApplicationStatus::Approved => 1,
        ApplicationStatus::Repaid => 2,
    }
}

proptest! {
    /// Status never moves backwards, capacity is never exceeded and
    /// deadlines are never rewritten, whatever the operation order.
    #[test]
    fn lifecycle_is_monotonic(slots in 1u32..4, ops in proptest::collection::vec(op_strategy(), 1..40)) {
        let (engine, clock, ledger) = engine(slots, 300);
        let commitments: Vec<Commitment> =
            (0..OWNERS).map(|n| engine.register_owner(&owner(n))).collect();

        let mut seen: Vec<Option<(u8, Option<Timestamp>)>> = vec![None; OWNERS as usize];
        for op in ops {
            let result = match op {
                Op::Submit(n) => engine
                    .submit_application(&owner(n), LoanId(1), &commitments[n as usize], "p".into())
                    .map(|_| ()),
                Op::Approve(n) => engine
                    .approve(&lender(), LoanId(1), &commitments[n as usize])
                    .map(|_| ()),
                Op::Repay(n) => engine
                    .repay(&owner(n), LoanId(1), &commitments[n as usize])
                    .map(|_| ()),
                Op::Tick(secs) => {
                    clock.advance(Duration::from_secs(secs));
                    Ok(())
                }
            };
            if let Err(err) = result {
                prop_assert!(matches!(
                    err,
                    LendingError::InvalidTransition { .. }
                        | LendingError::CapacityExceeded { .. }
                        | LendingError::NotFound(_)
                        | LendingError::DuplicateApplication(_)
                ), "unexpected error {err:?}");
            }

            for (i, c) in commitments.iter().enumerate() {
                let Some(app) = ledger.get_application(LoanId(1), c).unwrap() else {
                    prop_assert!(seen[i].is_none());
                    continue;
                };
                if let Some((prev_rank, prev_deadline)) = seen[i] {
                    prop_assert!(rank(app.status) >= prev_rank);
                    if prev_deadline.is_some() {
                        prop_assert_eq!(app.repayment_deadline, prev_deadline);
                    }
                }
                seen[i] = Some((rank(app.status), app.repayment_deadline));
            }

            let offer = engine.loan(LoanId(1)).unwrap();
            prop_assert!(offer.filled_slots <= offer.total_slots);
        }

        let replayed = InMemoryLedger::replay(ledger.events().unwrap()).unwrap();
        for c in &commitments {
            prop_assert_eq!(
                replayed.get_application(LoanId(1), c).unwrap(),
                ledger.get_application(LoanId(1), c).unwrap()
            );
        }
    }

    /// A reveal succeeds iff the caller is the lender, the application is
    /// Approved and the deadline has strictly passed.
    #[test]
    fn reveal_gate_is_exact(
        approve in any::<bool>(),
        repay in any::<bool>(),
        as_lender in any::<bool>(),
        offset in 0u64..1200,
    ) {
        let (engine, clock, _) = engine(1, 600);
        let borrower = owner(0);
        let c = engine.register_owner(&borrower);
        clock.set(Timestamp::from_secs(1000));
        engine.submit_application(&borrower, LoanId(1), &c, "p".into()).unwrap();
        if approve {
            engine.approve(&lender(), LoanId(1), &c).unwrap();
            if repay {
                engine.repay(&borrower, LoanId(1), &c).unwrap();
            }
        }

        let now = Timestamp::from_secs(1000 + offset);
        clock.set(now);
        let caller = if as_lender { lender() } else { owner(1) };
        let result = engine.reveal_identity(&caller, LoanId(1), &c);

        let status = engine.application(LoanId(1), &c).unwrap().status;
        let deadline = Timestamp::from_secs(1600);
        match result {
            Ok(who) => {
                prop_assert!(as_lender && status == ApplicationStatus::Approved && now > deadline);
                prop_assert_eq!(who, borrower);
            }
            Err(RevealError::Unauthorized(_)) => prop_assert!(!as_lender),
            Err(RevealError::NotApproved { status: s }) => {
                prop_assert!(as_lender);
                prop_assert_eq!(s, status);
                prop_assert!(s != ApplicationStatus::Approved);
            }
            Err(RevealError::NotYetOverdue { remaining }) => {
                prop_assert!(as_lender && status == ApplicationStatus::Approved);
                prop_assert!(now <= deadline);
                prop_assert_eq!(remaining, deadline.saturating_duration_since(now));
            }
            Err(other) => prop_assert!(false, "unexpected error {other:?}"),
        }
    }

    /// The (total_slots + 1)-th approval always fails.
    #[test]
    fn capacity_is_enforced(slots in 1u32..6) {
        let (engine, _, _) = engine(slots, 60);
        let applicants = slots as u8 + 1;
        for n in 0..applicants {
            let c = engine.register_owner(&owner(n));
            engine.submit_application(&owner(n), LoanId(1), &c, "p".into()).unwrap();
        }
        for n in 0..applicants {
            let c = engine.register_owner(&owner(n));
            let result = engine.approve(&lender(), LoanId(1), &c);
            if u32::from(n) < slots {
                prop_assert!(result.is_ok());
            } else {
                prop_assert_eq!(
                    result,
                    Err(LendingError::CapacityExceeded { loan_id: LoanId(1), total_slots: slots })
                );
            }
        }
    }

    /// Clearing and rebuilding from the ledger restores every lender view.
    #[test]
    fn cache_rebuild_restores_views(mask in proptest::collection::vec(any::<bool>(), OWNERS as usize)) {
        let (engine, _, _) = engine(4, 60);
        let applied: Vec<u8> = (0..OWNERS).filter(|n| mask[*n as usize]).collect();
        for n in &applied {
            let c = engine.register_owner(&owner(*n));
            engine.submit_application(&owner(*n), LoanId(1), &c, "p".into()).unwrap();
        }
        // Owners who never applied are known too; they must not show up.
        for n in 0..OWNERS {
            engine.register_owner(&owner(n));
        }

        let before = engine.applications_for_loan(LoanId(1)).unwrap();
        engine.cache().clear();
        let report = engine.rebuild_discovery().unwrap();
        let after = engine.applications_for_loan(LoanId(1)).unwrap();

        prop_assert_eq!(report.entries_restored, applied.len());
        prop_assert_eq!(before, after);
    }

    /// Insertion order does not matter.
    #[test]
    fn cache_insertion_commutes(pairs in proptest::collection::vec((any::<[u8; 32]>(), 0u64..8), 0..32)) {
        let forward = DiscoveryCache::new();
        let backward = DiscoveryCache::new();
        for (bytes, loan) in &pairs {
            forward.record_observation(Commitment::reduce_digest(*bytes), LoanId(*loan));
        }
        for (bytes, loan) in pairs.iter().rev() {
            backward.record_observation(Commitment::reduce_digest(*bytes), LoanId(*loan));
        }
        prop_assert_eq!(forward.len(), backward.len());
        for loan in 0..8 {
            prop_assert_eq!(
                forward.applications_for_loan(LoanId(loan)),
                backward.applications_for_loan(LoanId(loan))
            );
        }
    }
}

#[test]
fn concurrent_cache_writers_converge() {
    let cache = DiscoveryCache::new();
    let pairs: Vec<(Commitment, LoanId)> = (0u8..64)
        .map(|i| (Commitment::reduce_digest([i; 32]), LoanId(u64::from(i % 5))))
        .collect();

    std::thread::scope(|scope| {
        for worker in 0..8 {
            let cache = &cache;
            let pairs = &pairs;
            scope.spawn(move || {
                // Each worker inserts everything, starting at a different offset.
                for i in 0..pairs.len() {
                    let (c, loan) = pairs[(i + worker * 7) % pairs.len()];
                    cache.record_observation(c, loan);
                }
            });
        }
    });

    let sequential = DiscoveryCache::new();
    for (c, loan) in &pairs {
        sequential.record_observation(*c, *loan);
    }

    assert_eq!(cache.len(), pairs.len());
    for loan in 0..5 {
        assert_eq!(
            cache.applications_for_loan(LoanId(loan)),
            sequential.applications_for_loan(LoanId(loan))
        );
    }
    let all: BTreeSet<LoanId> = pairs.iter().map(|(_, l)| *l).collect();
    assert_eq!(all.len(), 5);
}

#[test]
fn shared_engine_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<LoanLifecycle>();
}
