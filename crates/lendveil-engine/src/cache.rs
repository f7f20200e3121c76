//! Commitment discovery cache.
//!
//! The ledger answers "does `(loan, commitment)` exist?" but not "who applied
//! to this loan?". This cache remembers every `commitment ↔ loan` pair the
//! engine has observed so lenders can enumerate applicants. It is a
//! materialized view: losing it costs discoverability, never correctness, and
//! it can be rebuilt from the ledger.

use std::collections::BTreeSet;

use dashmap::{DashMap, DashSet};
use lendveil_ledger::{LedgerError, LedgerEvent, LedgerEventKind, LedgerQuery};
use lendveil_types::{Commitment, LoanId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Concurrent two-way index between commitments and loan ids.
///
/// Insertion is commutative and idempotent; entries never expire.
#[derive(Debug, Default)]
pub struct DiscoveryCache {
    by_loan: DashMap<LoanId, DashSet<Commitment>>,
    by_commitment: DashMap<Commitment, DashSet<LoanId>>,
}

/// Outcome of a ledger rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuildReport {
    pub loans_scanned: usize,
    pub commitments_scanned: usize,
    pub entries_restored: usize,
}

impl DiscoveryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `commitment` has applied to `loan_id`.
    ///
    /// Returns `true` if the pair was not known before.
    pub fn record_observation(&self, commitment: Commitment, loan_id: LoanId) -> bool {
        let added = self.by_loan.entry(loan_id).or_default().insert(commitment);
        self.by_commitment
            .entry(commitment)
            .or_default()
            .insert(loan_id);
        if added {
            debug!(loan_id = %loan_id, commitment = %commitment.short(), "Cached application observation");
        }
        added
    }

    /// Commitments observed against `loan_id`, ascending.
    pub fn applications_for_loan(&self, loan_id: LoanId) -> BTreeSet<Commitment> {
        self.by_loan
            .get(&loan_id)
            .map(|set| set.iter().map(|c| *c).collect())
            .unwrap_or_default()
    }

    /// Loans `commitment` has been observed against, ascending.
    pub fn loans_for_commitment(&self, commitment: &Commitment) -> BTreeSet<LoanId> {
        self.by_commitment
            .get(commitment)
            .map(|set| set.iter().map(|id| *id).collect())
            .unwrap_or_default()
    }

    /// Number of cached `(loan, commitment)` pairs.
    pub fn len(&self) -> usize {
        self.by_loan.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.by_loan.clear();
        self.by_commitment.clear();
    }

    /// Probe the ledger for every `(loan, commitment)` pair and replace the
    /// cache contents with what it finds.
    ///
    /// Only commitments supplied by the caller can be rediscovered; the
    /// ledger has no way to list them. The cache is untouched if any probe
    /// fails.
    pub fn rebuild_from_ledger<L>(
        &self,
        ledger: &L,
        commitments: impl IntoIterator<Item = Commitment>,
    ) -> Result<RebuildReport, LedgerError>
    where
        L: LedgerQuery + ?Sized,
    {
        let commitments: BTreeSet<Commitment> = commitments.into_iter().collect();
        let loan_ids = ledger.loan_ids()?;

        let mut found = Vec::new();
        for loan_id in &loan_ids {
            for commitment in &commitments {
                if ledger.get_application(*loan_id, commitment)?.is_some() {
                    found.push((*commitment, *loan_id));
                }
            }
        }

        self.clear();
        for (commitment, loan_id) in &found {
            self.record_observation(*commitment, *loan_id);
        }
        let report = RebuildReport {
            loans_scanned: loan_ids.len(),
            commitments_scanned: commitments.len(),
            entries_restored: found.len(),
        };

        debug!(
            loans = report.loans_scanned,
            commitments = report.commitments_scanned,
            restored = report.entries_restored,
            "Discovery cache rebuilt from ledger"
        );
        Ok(report)
    }

    /// Clear the cache and restore it from recorded submissions.
    ///
    /// Returns the number of entries restored.
    pub fn rebuild_from_history<'a>(
        &self,
        events: impl IntoIterator<Item = &'a LedgerEvent>,
    ) -> usize {
        self.clear();
        let mut restored = 0;
        for event in events {
            if let LedgerEventKind::ApplicationSubmitted {
                loan_id,
                commitment,
                ..
            } = &event.kind
            {
                if self.record_observation(*commitment, *loan_id) {
                    restored += 1;
                }
            }
        }
        debug!(restored, "Discovery cache rebuilt from history");
        restored
    }
}
