//! Engine configuration

use std::path::Path;

use lendveil_identity::{CommitmentDeriver, DomainSalt};
use lendveil_types::TimeUnit;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LendingError;

/// Environment variable overriding the configured domain salt.
pub const DOMAIN_SALT_ENV: &str = "LENDVEIL_DOMAIN_SALT";

/// Engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Commitment domain salt (default: "identity_v1"). Fixed per deployment.
    pub domain_salt: DomainSalt,

    /// Unit of raw time values an operator supplies, such as the CLI `--at`
    /// (default: seconds). Recorded ledger histories always store seconds.
    pub ledger_time_unit: TimeUnit,
}

impl EngineConfig {
    /// Load configuration from a TOML file, then apply environment overrides.
    ///
    /// A missing file, or no path at all, yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, LendingError> {
        let config = match path {
            Some(p) if p.exists() => {
                let contents = std::fs::read_to_string(p).map_err(|e| {
                    LendingError::Config(format!("cannot read {}: {e}", p.display()))
                })?;
                debug!(path = %p.display(), "Loaded engine configuration");
                Self::from_toml_str(&contents)?
            }
            _ => Self::default(),
        };
        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, LendingError> {
        toml::from_str(contents).map_err(|e| LendingError::Config(e.to_string()))
    }

    /// Apply overrides from a variable lookup. Empty values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(salt) = lookup(DOMAIN_SALT_ENV).filter(|s| !s.trim().is_empty()) {
            self.domain_salt = DomainSalt::new(salt);
        }
        self
    }

    pub fn deriver(&self) -> CommitmentDeriver {
        CommitmentDeriver::new(self.domain_salt.clone())
    }
}
