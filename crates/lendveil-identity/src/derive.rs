use std::fmt;

use lendveil_types::{AccountId, Commitment};
use serde::{Deserialize, Serialize};

/// Salt used when a deployment does not configure its own.
pub const DEFAULT_DOMAIN_SALT: &str = "identity_v1";

/// Domain separation tag prepended to every commitment preimage.
const COMMITMENT_DOMAIN_TAG: &[u8] = b"lendveil-commitment-v1:";

/// Derive the commitment for `(owner_identifier, domain_salt)`.
///
/// Total and deterministic. The BLAKE3 digest is reduced to the ledger scalar
/// width here and nowhere else.
pub fn derive_commitment(owner_identifier: &[u8], domain_salt: &[u8]) -> Commitment {
    let mut hasher = blake3::Hasher::new();
    hasher.update(COMMITMENT_DOMAIN_TAG);
    // Length prefixes keep ("ab", "c") and ("a", "bc") apart.
    hasher.update(&(owner_identifier.len() as u64).to_le_bytes());
    hasher.update(owner_identifier);
    hasher.update(&(domain_salt.len() as u64).to_le_bytes());
    hasher.update(domain_salt);
    Commitment::reduce_digest(*hasher.finalize().as_bytes())
}

/// Derive the commitment of a normalised account under `salt`.
pub fn derive_for_account(owner: &AccountId, salt: &DomainSalt) -> Commitment {
    derive_commitment(owner.as_bytes(), salt.as_bytes())
}

/// Fixed, per-deployment domain separation salt.
///
/// Must stay constant for the lifetime of a deployment; a per-session salt
/// would split one owner into many unlinkable identities.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainSalt(String);

impl DomainSalt {
    pub fn new(salt: impl Into<String>) -> Self {
        Self(salt.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl Default for DomainSalt {
    fn default() -> Self {
        Self::new(DEFAULT_DOMAIN_SALT)
    }
}

impl fmt::Display for DomainSalt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Commitment derivation bound to one domain salt.
#[derive(Clone, Debug, Default)]
pub struct CommitmentDeriver {
    salt: DomainSalt,
}

impl CommitmentDeriver {
    pub fn new(salt: DomainSalt) -> Self {
        Self { salt }
    }

    pub fn salt(&self) -> &DomainSalt {
        &self.salt
    }

    /// Derive from a normalised account identifier.
    pub fn derive(&self, owner: &AccountId) -> Commitment {
        derive_for_account(owner, &self.salt)
    }

    /// Whether `commitment` belongs to `owner` under this salt.
    pub fn controls(&self, owner: &AccountId, commitment: &Commitment) -> bool {
        self.derive(owner) == *commitment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lendveil_types::SCALAR_BITS;
    use proptest::prelude::*;

    #[test]
    fn same_inputs_same_commitment() {
        let a = derive_commitment(b"wallet123", b"identity_v1");
        let b = derive_commitment(b"wallet123", b"identity_v1");
        assert_eq!(a, b);
    }

    #[test]
    fn salt_separates_domains() {
        let a = derive_commitment(b"wallet123", b"identity_v1");
        let b = derive_commitment(b"wallet123", b"identity_v2");
        assert_ne!(a, b);
    }

    #[test]
    fn length_prefix_prevents_boundary_collisions() {
        assert_ne!(
            derive_commitment(b"ab", b"c"),
            derive_commitment(b"a", b"bc")
        );
    }

    #[test]
    fn deriver_uses_normalised_accounts() {
        let deriver = CommitmentDeriver::default();
        assert_eq!(
            deriver.derive(&AccountId::new("0x00AbC")),
            deriver.derive(&AccountId::new("0xabc"))
        );
        assert_eq!(deriver.salt().as_str(), DEFAULT_DOMAIN_SALT);
        assert_eq!(
            derive_for_account(&AccountId::new("0xABC"), &DomainSalt::default()),
            derive_commitment(b"0xabc", b"identity_v1")
        );
    }

    #[test]
    fn controls_matches_only_the_owner() {
        let deriver = CommitmentDeriver::default();
        let owner = AccountId::new("wallet123");
        let c = deriver.derive(&owner);
        assert!(deriver.controls(&owner, &c));
        assert!(!deriver.controls(&AccountId::new("wallet456"), &c));
    }

    proptest! {
        #[test]
        fn derivation_is_deterministic(owner in proptest::collection::vec(any::<u8>(), 0..64),
                                       salt in "[a-z_0-9]{1,16}") {
            prop_assert_eq!(
                derive_commitment(&owner, salt.as_bytes()),
                derive_commitment(&owner, salt.as_bytes())
            );
        }

        #[test]
        fn derived_commitment_fits_scalar(owner in any::<[u8; 32]>()) {
            let c = derive_commitment(&owner, DEFAULT_DOMAIN_SALT.as_bytes());
            prop_assert!(c.bit_length() <= SCALAR_BITS);
            prop_assert!(lendveil_types::Commitment::try_from_be_bytes(*c.as_bytes()).is_ok());
        }
    }
}
