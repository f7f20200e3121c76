//! # lendveil-engine
//!
//! Off-chain half of the loan lifecycle. The ledger is authoritative; this
//! crate drives it and fills the gaps it leaves:
//!
//! 1. **Lifecycle** ([`LoanLifecycle`]): guarded `Pending → Approved → Repaid`
//!    transitions, checked here before the ledger checks them again
//! 2. **Discovery** ([`DiscoveryCache`]): `commitment ↔ loan` index, because
//!    the ledger cannot list the applicants of a loan
//! 3. **Reveal** ([`RevealGate`]): discloses an application's owner to the
//!    lender once an approved loan is past its repayment deadline
//!
//! ## Invariants
//!
//! - The discovery cache is a rebuildable view. A miss means "not found",
//!   never a false positive: every listed application is re-read from the ledger.
//! - The engine only submits commitments the caller can derive from its own
//!   account under the configured domain salt.
//! - The reveal gate never changes application state, and callers other than
//!   the lender cannot use it to learn whether an application exists.
//!
//! Time comes from an injected [`Clock`]; proofs are judged by an injected
//! [`ProofVerifier`].

#![deny(unsafe_code)]

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod mocks;
pub mod reveal;
pub mod traits;

pub use cache::{DiscoveryCache, RebuildReport};
pub use clock::{ManualClock, SystemClock};
pub use config::{EngineConfig, DOMAIN_SALT_ENV};
pub use error::LendingError;
pub use lifecycle::{LoanLifecycle, Submission};
pub use mocks::MockProofVerifier;
pub use reveal::{RevealError, RevealGate, RevealRecord};
pub use traits::{Clock, ProofVerifier};
