//! Local-file credential backend.
//!
//! One JSON document per site under a credentials directory:
//!
//! ```json
//! {
//!     "username": "userFoo",
//!     "password": "passwordBar",
//!     "security_questions": {
//!         "What's your favorite color?": "Red"
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use secrecy::SecretString;
use serde::Deserialize;

use super::{CredentialError, CredentialProvider, Credentials};

#[derive(Debug, Deserialize)]
struct CredentialFile {
    username: String,
    password: String,
    #[serde(default)]
    security_questions: HashMap<String, String>,
}

/// Credential provider backed by a directory of `<site_id>.json` files.
#[derive(Debug, Clone)]
pub struct JsonFileProvider {
    dir: PathBuf,
}

impl JsonFileProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl CredentialProvider for JsonFileProvider {
    async fn get_credentials(&self, site_id: &str) -> Result<Credentials, CredentialError> {
        let path = self.dir.join(format!("{site_id}.json"));
        if !path.exists() {
            return Err(CredentialError::NotFound {
                site_id: site_id.to_string(),
            });
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read credential file: {}", path.display()))
            .map_err(CredentialError::Backend)?;

        let parsed: CredentialFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse credential file: {}", path.display()))
            .map_err(CredentialError::Backend)?;

        Ok(Credentials::new(
            parsed.username,
            SecretString::from(parsed.password),
            parsed.security_questions,
        ))
    }
}
