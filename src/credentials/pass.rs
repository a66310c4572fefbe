//! Password-store (pass) vault backend.
//!
//! Each site is one pass entry at `<prefix>/<site_id>`. The first line is
//! the password; the rest are `field: value` pairs:
//!
//! ```text
//! passwordBar
//! username: userFoo
//! security-questions: {"What's your favorite color?": "Red"}
//! ```

use std::collections::HashMap;
use std::process::Command;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::{CredentialError, CredentialProvider, Credentials};

/// Configuration for the pass vault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassConfig {
    /// Store path prefix joined with the site id (e.g. "finance").
    #[serde(default)]
    pub prefix: Option<String>,
}

/// Credential provider backed by password-store (pass).
///
/// A missing entry is `NotFound`; any other `pass` failure (no store,
/// gpg trouble, the command itself missing) is a backend error, so callers
/// can tell "no such site" apart from "the vault is broken".
pub struct PassVault {
    config: PassConfig,
}

impl PassVault {
    pub fn new(config: PassConfig) -> Self {
        Self { config }
    }

    fn entry_path(&self, site_id: &str) -> String {
        match &self.config.prefix {
            Some(prefix) => format!("{prefix}/{site_id}"),
            None => site_id.to_string(),
        }
    }

    fn read_entry(&self, site_id: &str) -> Result<PassEntry, CredentialError> {
        let path = self.entry_path(site_id);
        let output = Command::new("pass")
            .arg("show")
            .arg(&path)
            .output()
            .context("Failed to run pass command")
            .map_err(CredentialError::Backend)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("not in the password store") {
                return Err(CredentialError::NotFound {
                    site_id: site_id.to_string(),
                });
            }
            return Err(CredentialError::Backend(anyhow!(
                "pass show {path} failed: {}",
                stderr.trim()
            )));
        }

        let content = String::from_utf8(output.stdout)
            .context("Invalid UTF-8 in pass output")
            .map_err(CredentialError::Backend)?;

        Ok(PassEntry::parse(&content))
    }
}

#[async_trait]
impl CredentialProvider for PassVault {
    async fn get_credentials(&self, site_id: &str) -> Result<Credentials, CredentialError> {
        let entry = self.read_entry(site_id)?;

        let password = entry.password.filter(|line| !line.is_empty()).ok_or_else(|| {
            CredentialError::Backend(anyhow!("pass entry for {site_id} is empty"))
        })?;
        let username = entry.fields.get("username").cloned().ok_or_else(|| {
            CredentialError::Backend(anyhow!("pass entry for {site_id} has no username field"))
        })?;
        let answers: HashMap<String, String> = match entry.fields.get("security-questions") {
            Some(raw) => serde_json::from_str(raw)
                .with_context(|| format!("Invalid security-questions JSON for {site_id}"))
                .map_err(CredentialError::Backend)?,
            None => HashMap::new(),
        };

        Ok(Credentials::new(
            username,
            SecretString::from(password),
            answers,
        ))
    }
}

/// Parsed pass entry: password line plus `name: value` fields.
#[derive(Debug, Default)]
struct PassEntry {
    password: Option<String>,
    fields: HashMap<String, String>,
}

impl PassEntry {
    fn parse(content: &str) -> Self {
        let mut lines = content.lines();
        let password = lines.next().map(|s| s.to_string());
        let mut fields = HashMap::new();

        for line in lines {
            if let Some((key, value)) = line.split_once(": ") {
                fields.insert(key.to_string(), value.replace("\\n", "\n"));
            }
        }

        Self { password, fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entry_fields() {
        let content = "hunter2\nusername: userFoo\nnote: multi\\nline";
        let entry = PassEntry::parse(content);

        assert_eq!(entry.password, Some("hunter2".to_string()));
        assert_eq!(entry.fields.get("username"), Some(&"userFoo".to_string()));
        assert_eq!(entry.fields.get("note"), Some(&"multi\nline".to_string()));
    }

    #[test]
    fn test_security_questions_survive_embedded_separators() {
        // The JSON value itself contains ": "; only the first occurrence on
        // the line splits key from value.
        let content =
            "pw\nusername: u\nsecurity-questions: {\"What's your favorite color?\": \"Red\"}";
        let entry = PassEntry::parse(content);

        let raw = entry.fields.get("security-questions").unwrap();
        let parsed: HashMap<String, String> = serde_json::from_str(raw).unwrap();
        assert_eq!(
            parsed.get("What's your favorite color?"),
            Some(&"Red".to_string())
        );
    }

    #[test]
    fn test_entry_path_prefix() {
        let vault = PassVault::new(PassConfig {
            prefix: Some("finance".to_string()),
        });
        assert_eq!(vault.entry_path("usbank"), "finance/usbank");

        let bare = PassVault::new(PassConfig { prefix: None });
        assert_eq!(bare.entry_path("usbank"), "usbank");
    }
}
