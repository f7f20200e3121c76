use std::fmt;

use serde::{Deserialize, Serialize};

/// Ledger-assigned identifier of a loan offer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoanId(pub u64);

impl fmt::Display for LoanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for LoanId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Ledger-level account identifier (wallet address, public key id, ...).
///
/// Hex addresses are normalised on construction: `0x00AbC` and `0xabc`
/// name the same account. Anything else is kept verbatim after trimming.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(normalize(raw.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

fn normalize(raw: String) -> String {
    let trimmed = raw.trim();
    let digits = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(d) if !d.is_empty() && d.chars().all(|c| c.is_ascii_hexdigit()) => d,
        _ => return trimmed.to_string(),
    };

    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
        "0x0".to_string()
    } else {
        format!("0x{}", significant.to_ascii_lowercase())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for AccountId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for AccountId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<AccountId> for String {
    fn from(value: AccountId) -> Self {
        value.0
    }
}

/// Opaque attestation that an owner meets a loan's score threshold.
///
/// The engine never looks inside; verification is delegated to a
/// `ProofVerifier` collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProofReference(String);

impl ProofReference {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProofReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProofReference {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
