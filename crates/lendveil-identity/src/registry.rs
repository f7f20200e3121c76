use dashmap::DashSet;
use lendveil_types::{AccountId, Commitment};
use tracing::debug;

use crate::derive::CommitmentDeriver;

/// Owner-identity registry.
///
/// Holds every commitment the system has seen, independent of which loans
/// they applied to. It carries no owner identifiers, only commitments, and it
/// is what lets the discovery index be rebuilt by probing the ledger.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    commitments: DashSet<Commitment>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the registry from a previously exported commitment list.
    pub fn from_commitments(commitments: impl IntoIterator<Item = Commitment>) -> Self {
        let registry = Self::new();
        for c in commitments {
            registry.insert(c);
        }
        registry
    }

    /// Derive and record the commitment of `owner`.
    pub fn register(&self, deriver: &CommitmentDeriver, owner: &AccountId) -> Commitment {
        let commitment = deriver.derive(owner);
        if self.insert(commitment) {
            debug!(commitment = %commitment.short(), "Registered owner commitment");
        }
        commitment
    }

    /// Record a commitment. Returns `true` if it was not known before.
    pub fn insert(&self, commitment: Commitment) -> bool {
        self.commitments.insert(commitment)
    }

    pub fn contains(&self, commitment: &Commitment) -> bool {
        self.commitments.contains(commitment)
    }

    /// All known commitments, in ascending order.
    pub fn known_commitments(&self) -> Vec<Commitment> {
        let mut all: Vec<Commitment> = self.commitments.iter().map(|c| *c).collect();
        all.sort();
        all
    }

    pub fn len(&self) -> usize {
        self.commitments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commitments.is_empty()
    }
}
