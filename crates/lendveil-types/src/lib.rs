//! # lendveil-types
//!
//! Core value types shared by every Lendveil crate:
//!
//! - **Commitment**: fixed-width, field-safe pseudonymous owner identifier
//! - **LoanOffer / LoanTerms**: a lender's standing offer and its validated terms
//! - **Application / ApplicationStatus**: one owner's request against one offer,
//!   with the forward-only lifecycle `Pending → Approved → Repaid`
//! - **Timestamp / TimeUnit**: Unix-seconds time with explicit unit conversion
//!
//! ## Invariants
//!
//! - A `Commitment` value is always `< 2^SCALAR_BITS`. It is reduced exactly once
//!   when derived and range-checked when parsed; it is never re-truncated.
//! - Application status only moves forward, one step at a time.
//! - `repayment_deadline` is written once, at approval.

#![deny(unsafe_code)]

pub mod application;
pub mod commitment;
pub mod error;
pub mod ids;
pub mod loan;
pub mod time;

pub use application::{Application, ApplicationKey, ApplicationStatus};
pub use commitment::{Commitment, COMMITMENT_BYTES, SCALAR_BITS};
pub use error::{ScalarWidthError, TermsError, TransitionError};
pub use ids::{AccountId, LoanId, ProofReference};
pub use loan::{LoanOffer, LoanTerms, BASIS_POINTS_DENOMINATOR};
pub use time::{Timestamp, TimeUnit};
