//! Lendveil CLI - offline tools for operators
//!
//! - Derive the commitment of an owner identifier
//! - Replay a ledger history and inspect loans and applications
//! - Evaluate the identity reveal gate against a recorded history

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lendveil_engine::{EngineConfig, LendingError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;

use commands::{derive, inspect, reveal};
pub use error::{CliError, CliResult};

/// Lendveil CLI application
#[derive(Parser)]
#[command(name = "lendveil")]
#[command(about = "Lendveil - loan lifecycle and identity reveal tools", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "LENDVEIL_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Derive the identity commitment of an owner
    Derive(derive::DeriveArgs),

    /// Replay a ledger history and report loans and applications
    Inspect(inspect::InspectArgs),

    /// Evaluate the identity reveal gate against a ledger history
    Reveal(reveal::RevealArgs),

    /// Show effective configuration
    Config,
}

/// Run using the current process arguments.
pub fn run() -> CliResult<()> {
    run_with_args(std::env::args_os())
}

/// Run using the provided argument iterator.
pub fn run_with_args<I, T>(args: I) -> CliResult<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    let output = match cli.command {
        Commands::Derive(args) => derive::execute(args, &config)?,
        Commands::Inspect(args) => inspect::execute(args, &config)?,
        Commands::Reveal(args) => reveal::execute(args, &config)?,
        Commands::Config => serde_json::to_string_pretty(&config)?,
    };
    println!("{output}");
    Ok(())
}

/// Install the global subscriber. Returns `false` if one was already set.
fn init_tracing(verbose: bool) -> bool {
    let filter = if verbose { "debug" } else { "info" };
    // An embedding process may already have installed a subscriber.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .try_init()
        .is_ok()
}

fn load_config(path: Option<&std::path::Path>) -> CliResult<EngineConfig> {
    EngineConfig::load(path).map_err(|err| match err {
        LendingError::Config(msg) => CliError::Config(msg),
        other => CliError::Lending(other),
    })
}
