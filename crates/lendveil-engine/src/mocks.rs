use std::collections::HashMap;

use lendveil_types::ProofReference;

use crate::traits::ProofVerifier;

/// Mock proof verifier for testing.
///
/// Either accepts or rejects everything, or judges proofs against the
/// scores attested for them with [`MockProofVerifier::attest`].
#[derive(Debug, Clone)]
pub struct MockProofVerifier {
    mode: Mode,
    scores: HashMap<ProofReference, u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    AcceptAll,
    RejectAll,
    Attested,
}

impl MockProofVerifier {
    /// Create a verifier that accepts every proof.
    pub fn accept_all() -> Self {
        Self {
            mode: Mode::AcceptAll,
            scores: HashMap::new(),
        }
    }

    /// Create a verifier that rejects every proof.
    pub fn reject_all() -> Self {
        Self {
            mode: Mode::RejectAll,
            scores: HashMap::new(),
        }
    }

    /// Create a verifier that only accepts attested proofs.
    pub fn attested() -> Self {
        Self {
            mode: Mode::Attested,
            scores: HashMap::new(),
        }
    }

    /// Attest that `proof` proves a score of `score`.
    pub fn attest(mut self, proof: impl Into<ProofReference>, score: u32) -> Self {
        self.scores.insert(proof.into(), score);
        self
    }
}

impl Default for MockProofVerifier {
    fn default() -> Self {
        Self::accept_all()
    }
}

impl ProofVerifier for MockProofVerifier {
    fn verify(&self, proof: &ProofReference, min_score_threshold: u32) -> bool {
        match self.mode {
            Mode::AcceptAll => true,
            Mode::RejectAll => false,
            Mode::Attested => self
                .scores
                .get(proof)
                .map(|score| *score >= min_score_threshold)
                .unwrap_or(false),
        }
    }
}
