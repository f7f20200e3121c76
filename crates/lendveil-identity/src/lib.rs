//! # lendveil-identity
//!
//! Identity commitments: the same owner always maps to the same commitment
//! under a deployment's fixed domain salt, across every application and every
//! proof regeneration.
//!
//! - [`derive_commitment`]: pure derivation over raw bytes
//! - [`CommitmentDeriver`]: derivation bound to one [`DomainSalt`]
//! - [`IdentityRegistry`]: the set of commitments ever observed, used to
//!   rebuild the discovery index from the ledger

#![deny(unsafe_code)]

pub mod derive;
pub mod registry;

pub use derive::{
    derive_commitment, derive_for_account, CommitmentDeriver, DomainSalt, DEFAULT_DOMAIN_SALT,
};
pub use registry::IdentityRegistry;
