use lendveil_types::{ProofReference, Timestamp};

/// Source of "now" for every time-dependent decision.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Verifies an opaque proof that its owner meets a score threshold.
///
/// The engine hands over the offer's `min_score_threshold` and trusts the
/// verdict; proof formats are the verifier's business.
pub trait ProofVerifier: Send + Sync {
    fn verify(&self, proof: &ProofReference, min_score_threshold: u32) -> bool;
}
