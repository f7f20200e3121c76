use clap::Args;
use lendveil_engine::EngineConfig;
use lendveil_identity::{derive_for_account, DomainSalt};
use lendveil_types::{AccountId, Commitment};
use serde::Serialize;
use tracing::debug;

use crate::error::CliResult;

/// Arguments for `lendveil derive`
#[derive(Args)]
pub struct DeriveArgs {
    /// Owner identifier (wallet address or account id)
    #[arg(long)]
    pub owner: AccountId,

    /// Domain salt; defaults to the configured salt
    #[arg(long)]
    pub salt: Option<String>,

    /// Print a JSON object instead of the bare commitment
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct Derived<'a> {
    owner: &'a AccountId,
    salt: &'a DomainSalt,
    commitment: Commitment,
    bits: u32,
}

pub fn execute(args: DeriveArgs, config: &EngineConfig) -> CliResult<String> {
    let salt = args
        .salt
        .map(DomainSalt::new)
        .unwrap_or_else(|| config.domain_salt.clone());
    let commitment = derive_for_account(&args.owner, &salt);
    debug!(salt = %salt, commitment = %commitment.short(), "Derived commitment");

    if args.json {
        Ok(serde_json::to_string_pretty(&Derived {
            owner: &args.owner,
            salt: &salt,
            commitment,
            bits: commitment.bit_length(),
        })?)
    } else {
        Ok(commitment.to_hex())
    }
}
