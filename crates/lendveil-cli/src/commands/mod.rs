//! Command implementations. Each returns the text to print.

pub mod derive;
pub mod inspect;
pub mod reveal;

use std::path::Path;
use std::sync::Arc;

use lendveil_engine::{EngineConfig, LoanLifecycle, ManualClock, ProofVerifier};
use lendveil_ledger::{InMemoryLedger, LedgerEvent};
use lendveil_types::{ProofReference, Timestamp};
use tracing::debug;

use crate::error::CliResult;

/// Offline tools only read history; nothing can be submitted.
struct OfflineVerifier;

impl ProofVerifier for OfflineVerifier {
    fn verify(&self, _proof: &ProofReference, _min_score_threshold: u32) -> bool {
        false
    }
}

/// Read a JSON array of ledger events.
pub(crate) fn load_history(path: &Path) -> CliResult<Vec<LedgerEvent>> {
    let contents = std::fs::read_to_string(path)?;
    let events: Vec<LedgerEvent> = serde_json::from_str(&contents)?;
    debug!(path = %path.display(), events = events.len(), "Loaded ledger history");
    Ok(events)
}

/// Interpret a raw `--at` value in the configured time unit; defaults to now.
///
/// Event timestamps in the history are already seconds and are not converted.
pub(crate) fn evaluation_time(config: &EngineConfig, raw: Option<u64>) -> Timestamp {
    raw.map(|raw| config.ledger_time_unit.to_timestamp(raw))
        .unwrap_or_else(Timestamp::now)
}

/// Replay `events` into an engine frozen at `at`, with discovery restored.
pub(crate) fn offline_engine(
    config: &EngineConfig,
    events: &[LedgerEvent],
    at: Timestamp,
) -> CliResult<LoanLifecycle> {
    let ledger = InMemoryLedger::replay(events.iter().cloned())?;
    let engine = LoanLifecycle::new(
        config.clone(),
        Arc::new(ledger),
        Arc::new(ManualClock::new(at)),
        Arc::new(OfflineVerifier),
    );
    engine.cache().rebuild_from_history(events);
    Ok(engine)
}
