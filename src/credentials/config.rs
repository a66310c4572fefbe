//! Credential backend selection.
//!
//! The run configuration names one backend and its settings:
//!
//! ```toml
//! [credentials]
//! backend = "file"
//! dir = "Credentials"
//! ```
//!
//! or
//!
//! ```toml
//! [credentials]
//! backend = "pass"
//! prefix = "finance"
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{CredentialProvider, JsonFileProvider, PassConfig, PassVault};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum CredentialConfig {
    /// Directory of per-site JSON files.
    File { dir: PathBuf },

    /// Password-store (pass) vault.
    Pass {
        #[serde(flatten)]
        config: PassConfig,
    },
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self::File {
            dir: PathBuf::from("Credentials"),
        }
    }
}

impl CredentialConfig {
    /// Build a credential provider from this configuration.
    pub fn build(&self) -> Box<dyn CredentialProvider> {
        match self {
            CredentialConfig::File { dir } => Box::new(JsonFileProvider::new(dir.clone())),
            CredentialConfig::Pass { config } => Box::new(PassVault::new(config.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_backend() {
        let config: CredentialConfig =
            toml::from_str("backend = \"file\"\ndir = \"Credentials\"").unwrap();

        match config {
            CredentialConfig::File { dir } => assert_eq!(dir, PathBuf::from("Credentials")),
            other => panic!("expected file backend, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_pass_backend() {
        let config: CredentialConfig =
            toml::from_str("backend = \"pass\"\nprefix = \"finance\"").unwrap();

        match config {
            CredentialConfig::Pass { config } => {
                assert_eq!(config.prefix.as_deref(), Some("finance"));
            }
            other => panic!("expected pass backend, got {other:?}"),
        }
    }
}
