use std::path::PathBuf;

use clap::Args;
use lendveil_engine::EngineConfig;
use lendveil_types::{
    Application, ApplicationStatus, Commitment, LoanId, LoanOffer, ProofReference, Timestamp,
};
use serde::Serialize;

use super::{evaluation_time, load_history, offline_engine};
use crate::error::CliResult;

/// Arguments for `lendveil inspect`
#[derive(Args)]
pub struct InspectArgs {
    /// Ledger history: a JSON array of ledger events
    #[arg(long)]
    pub history: PathBuf,

    /// Evaluation time in the configured `ledger_time_unit` (defaults to now)
    #[arg(long)]
    pub at: Option<u64>,

    /// Only report this loan
    #[arg(long)]
    pub loan: Option<u64>,
}

#[derive(Debug, Serialize)]
struct InspectReport {
    events: usize,
    evaluated_at: Timestamp,
    loans: Vec<LoanReport>,
}

#[derive(Debug, Serialize)]
struct LoanReport {
    offer: LoanOffer,
    remaining_slots: u32,
    repayment_due_per_unit: Option<u128>,
    applications: Vec<ApplicationView>,
}

/// An application without its owner; owners only leave through the reveal gate.
#[derive(Debug, Serialize)]
struct ApplicationView {
    commitment: Commitment,
    status: ApplicationStatus,
    proof_reference: ProofReference,
    applied_at: Timestamp,
    approved_at: Option<Timestamp>,
    repayment_deadline: Option<Timestamp>,
    repaid_at: Option<Timestamp>,
    overdue: bool,
}

impl ApplicationView {
    fn new(app: Application, now: Timestamp) -> Self {
        Self {
            overdue: app.is_overdue(now),
            commitment: app.commitment,
            status: app.status,
            proof_reference: app.proof_reference,
            applied_at: app.applied_at,
            approved_at: app.approved_at,
            repayment_deadline: app.repayment_deadline,
            repaid_at: app.repaid_at,
        }
    }
}

pub fn execute(args: InspectArgs, config: &EngineConfig) -> CliResult<String> {
    let events = load_history(&args.history)?;
    let at = evaluation_time(config, args.at);
    let engine = offline_engine(config, &events, at)?;

    let loan_ids = match args.loan {
        Some(id) => vec![LoanId(id)],
        None => engine.ledger().loan_ids()?,
    };

    let mut loans = Vec::with_capacity(loan_ids.len());
    for loan_id in loan_ids {
        let offer = engine.loan(loan_id)?;
        let applications = engine
            .applications_for_loan(loan_id)?
            .into_iter()
            .map(|app| ApplicationView::new(app, at))
            .collect();
        loans.push(LoanReport {
            remaining_slots: offer.remaining_slots(),
            repayment_due_per_unit: offer.repayment_due_per_unit(),
            offer,
            applications,
        });
    }

    Ok(serde_json::to_string_pretty(&InspectReport {
        events: events.len(),
        evaluated_at: at,
        loans,
    })?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::sample_history;
    use crate::error::CliError;
    use lendveil_engine::LendingError;

    fn inspect(at: u64, loan: Option<u64>) -> CliResult<serde_json::Value> {
        let history = sample_history();
        let out = execute(
            InspectArgs {
                history: history.path().to_path_buf(),
                at: Some(at),
                loan,
            },
            &EngineConfig::default(),
        )?;
        Ok(serde_json::from_str(&out).unwrap())
    }

    #[test]
    fn test_inspect_reports_applications_without_owners() {
        let report = inspect(1700, None).unwrap();
        assert_eq!(report["events"], 4);
        let loan = &report["loans"][0];
        assert_eq!(loan["offer"]["loan_id"], 7);
        assert_eq!(loan["remaining_slots"], 1);
        assert_eq!(loan["repayment_due_per_unit"], 1_050);

        let apps = loan["applications"].as_array().unwrap();
        assert_eq!(apps.len(), 2);
        assert!(apps.iter().all(|a| a.get("owner_ref").is_none()));
        assert_eq!(apps.iter().filter(|a| a["overdue"] == true).count(), 1);
    }

    #[test]
    fn test_inspect_before_deadline() {
        let report = inspect(1600, Some(7)).unwrap();
        let apps = report["loans"][0]["applications"].as_array().unwrap();
        assert!(apps.iter().all(|a| a["overdue"] == false));
    }

    #[test]
    fn test_inspect_unknown_loan() {
        assert!(matches!(
            inspect(1700, Some(99)),
            Err(CliError::Lending(LendingError::LoanNotFound(LoanId(99))))
        ));
    }

    #[test]
    fn test_inspect_millisecond_ledger() {
        let history = sample_history();
        let config = EngineConfig {
            ledger_time_unit: lendveil_types::TimeUnit::Milliseconds,
            ..EngineConfig::default()
        };
        let out = execute(
            InspectArgs {
                history: history.path().to_path_buf(),
                at: Some(1_700_000),
                loan: None,
            },
            &config,
        )
        .unwrap();
        let report: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(report["evaluated_at"], 1700);

        // History timestamps stay in seconds: the 1600s deadline has passed.
        let apps = report["loans"][0]["applications"].as_array().unwrap();
        let approved = apps.iter().find(|a| a["status"] == "Approved").unwrap();
        assert_eq!(approved["repayment_deadline"], 1600);
        assert_eq!(approved["overdue"], true);
    }
}
