//! Credential retrieval.
//!
//! Provides a unified interface for fetching per-site login material from
//! interchangeable backends: a local directory of JSON files, or a
//! password-store (pass) vault. Scrapers receive a `Credentials` value for
//! exactly as long as the authentication flow needs it; nothing here is
//! persisted by the scraping core.

mod config;
mod json_file;
mod pass;

pub use config::CredentialConfig;
pub use json_file::JsonFileProvider;
pub use pass::{PassConfig, PassVault};

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

/// Login material for one site.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
    security_answers: HashMap<String, String>,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: SecretString,
        security_answers: HashMap<String, String>,
    ) -> Self {
        Self {
            username: username.into(),
            password,
            security_answers,
        }
    }

    /// Answer for a challenge question, keyed by the verbatim text the site
    /// displays. `None` means authentication cannot proceed for that
    /// question; callers must fail rather than guess.
    pub fn answer_for(&self, question: &str) -> Option<&str> {
        self.security_answers.get(question).map(String::as_str)
    }
}

#[derive(Debug, Error)]
pub enum CredentialError {
    /// The backend is healthy but has no record for this site.
    #[error("no stored credentials for site {site_id:?}")]
    NotFound { site_id: String },

    /// The backend itself failed (unreadable file, vault unreachable, ...).
    #[error("credential backend failure: {0}")]
    Backend(anyhow::Error),
}

/// Source of per-site credentials, constructed once per run.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn get_credentials(&self, site_id: &str) -> Result<Credentials, CredentialError>;
}
