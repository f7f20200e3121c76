use std::path::PathBuf;

use clap::Args;
use lendveil_engine::{EngineConfig, RevealRecord};
use lendveil_types::{AccountId, Commitment, LoanId};
use serde::Serialize;

use super::{evaluation_time, load_history, offline_engine};
use crate::error::CliResult;

/// Arguments for `lendveil reveal`
#[derive(Args)]
pub struct RevealArgs {
    /// Ledger history: a JSON array of ledger events
    #[arg(long)]
    pub history: PathBuf,

    /// Loan id
    #[arg(long)]
    pub loan: u64,

    /// Application commitment (0x-prefixed hex)
    #[arg(long)]
    pub commitment: Commitment,

    /// Account asking for the reveal
    #[arg(long)]
    pub caller: AccountId,

    /// Evaluation time in the configured `ledger_time_unit` (defaults to now)
    #[arg(long)]
    pub at: Option<u64>,
}

#[derive(Serialize)]
struct Revealed {
    owner: AccountId,
    record: Option<RevealRecord>,
}

pub fn execute(args: RevealArgs, config: &EngineConfig) -> CliResult<String> {
    let events = load_history(&args.history)?;
    let at = evaluation_time(config, args.at);
    let engine = offline_engine(config, &events, at)?;

    let owner = engine.reveal_identity(&args.caller, LoanId(args.loan), &args.commitment)?;
    let record = engine.reveal_gate().audit_log()?.pop();
    Ok(serde_json::to_string_pretty(&Revealed { owner, record })?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::sample_history;
    use crate::error::CliError;
    use lendveil_engine::RevealError;
    use lendveil_identity::CommitmentDeriver;
    use std::time::Duration;

    fn reveal(caller: &str, at: u64) -> CliResult<String> {
        let history = sample_history();
        execute(
            RevealArgs {
                history: history.path().to_path_buf(),
                loan: 7,
                commitment: CommitmentDeriver::default().derive(&AccountId::new("wallet123")),
                caller: AccountId::new(caller),
                at: Some(at),
            },
            &EngineConfig::default(),
        )
    }

    #[test]
    fn test_reveal_after_deadline() {
        let out = reveal("lender", 1700).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["owner"], "wallet123");
        assert_eq!(value["record"]["overdue_duration"], 100);
    }

    #[test]
    fn test_reveal_refused_before_deadline() {
        assert!(matches!(
            reveal("lender", 1500),
            Err(CliError::Reveal(RevealError::NotYetOverdue { remaining }))
                if remaining == Duration::from_secs(100)
        ));
    }

    #[test]
    fn test_reveal_refused_for_stranger() {
        assert!(matches!(
            reveal("stranger", 1700),
            Err(CliError::Reveal(RevealError::Unauthorized(LoanId(7))))
        ));
    }

    #[test]
    fn test_missing_history_file() {
        let result = execute(
            RevealArgs {
                history: PathBuf::from("/nonexistent/events.json"),
                loan: 7,
                commitment: Commitment::reduce_digest([0u8; 32]),
                caller: AccountId::new("lender"),
                at: Some(0),
            },
            &EngineConfig::default(),
        );
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
