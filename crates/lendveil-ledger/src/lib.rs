//! # lendveil-ledger
//!
//! The authoritative loan ledger is an external system (a chain contract).
//! This crate defines the boundary the engine talks through, plus an
//! in-memory reference ledger used for simulation, replay and tests.
//!
//! The ledger can look up an application by its exact `(loan_id, commitment)`
//! key but cannot enumerate the applicants of a loan. That asymmetry is
//! preserved here on purpose: [`LedgerQuery`] has no such method.
//!
//! ## Invariants
//!
//! - Every accepted mutation appends exactly one [`LedgerEvent`]; the event log
//!   is append-only and densely sequenced from 0.
//! - Replaying the event log reproduces the ledger state.
//! - The reference ledger enforces every lifecycle guard itself, independent
//!   of any off-chain caller.

#![deny(unsafe_code)]

pub mod error;
pub mod event;
pub mod memory;
pub mod traits;

pub use error::LedgerError;
pub use event::{LedgerEvent, LedgerEventKind};
pub use memory::InMemoryLedger;
pub use traits::{Ledger, LedgerHistory, LedgerMutation, LedgerQuery};
