//! Operator notification channel.
//!
//! Fire-and-forget from the orchestrator's perspective: a notification that
//! cannot be delivered is logged by the caller and dropped, never escalated.

use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<()>;
}

/// Pipes the message to a sendmail-style command.
///
/// The command gets the operator address as its final argument and the
/// message (with a subject header) on stdin. Mail transport, including any
/// SMTP credentials, stays behind the command.
pub struct CommandNotifier {
    command: String,
    args: Vec<String>,
    recipient: String,
    subject: String,
}

impl CommandNotifier {
    pub fn new(command: impl Into<String>, recipient: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            recipient: recipient.into(),
            subject: "Finance-tracker notification".to_string(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }
}

#[async_trait]
impl Notifier for CommandNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .arg(&self.recipient)
            .stdin(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn notifier command {:?}", self.command))?;

        if let Some(stdin) = child.stdin.as_mut() {
            let body = format!("Subject: {}\n\n{}", self.subject, message);
            stdin
                .write_all(body.as_bytes())
                .context("Failed to write notification body")?;
        }

        let status = child.wait().context("Failed to wait for notifier command")?;
        if !status.success() {
            bail!("notifier command exited with {status}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_command_notifier_pipes_body_to_command() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("sent.txt");

        // `tee <recipient>` stands in for sendmail: the recipient slot is
        // the output path, the body arrives on stdin.
        let notifier = CommandNotifier::new("tee", out.display().to_string());
        notifier.notify("usbank: timed out").await.unwrap();

        let content = std::fs::read_to_string(&out).unwrap();
        assert!(content.starts_with("Subject: Finance-tracker notification\n"));
        assert!(content.contains("usbank: timed out"));
    }

    #[tokio::test]
    async fn test_command_failure_is_reported() {
        let notifier = CommandNotifier::new("false", "operator@example.com");
        assert!(notifier.notify("anything").await.is_err());
    }
}
