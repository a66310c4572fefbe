//! Run configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::credentials::CredentialConfig;

/// Top-level TOML configuration, all fields optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the CSV ledger lives unless `--output` overrides it.
    pub ledger_path: PathBuf,

    /// Bound on every wait against the remote page, in seconds.
    pub wait_timeout_secs: u64,

    /// Credential backend.
    pub credentials: CredentialConfig,

    /// Site ids to scrape, in ledger column order. Empty means the built-in
    /// default set.
    pub sites: Vec<String>,

    /// Sendmail-style command used for operator notifications.
    pub notify_command: Option<String>,

    /// Browser profile directory. Defaults under the user data dir so
    /// cookies persist between runs and sites re-challenge less.
    pub profile_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ledger_path: PathBuf::from("balances.csv"),
            wait_timeout_secs: 10,
            credentials: CredentialConfig::default(),
            sites: Vec::new(),
            notify_command: None,
            profile_dir: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn profile_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.profile_dir {
            return Ok(dir.clone());
        }
        let base = dirs::data_dir().context("Could not find data directory")?;
        Ok(base.join("networth").join("profile"))
    }
}
