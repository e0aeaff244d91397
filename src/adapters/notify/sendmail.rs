//! Report delivery through a sendmail-compatible program.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::domain::models::NotificationConfig;
use crate::domain::ports::{Notifier, NotifyError};

/// Pipes a plain-text message into `sendmail -t -i`.
#[derive(Debug, Clone)]
pub struct SendmailNotifier {
    sendmail_path: String,
    from: String,
}

impl SendmailNotifier {
    pub fn new(config: &NotificationConfig) -> Self {
        Self {
            sendmail_path: config.sendmail_path.clone(),
            from: config.from.clone(),
        }
    }

    /// RFC 5322 message with From/To/Subject headers.
    pub fn compose(&self, recipients: &[String], subject: &str, body: &str) -> String {
        let mut message = format!(
            "From: {}\nTo: {}\nSubject: {}\nContent-Type: text/plain; charset=utf-8\n\n",
            self.from,
            recipients.join(", "),
            single_line(subject)
        );
        message.push_str(body);
        if !message.ends_with('\n') {
            message.push('\n');
        }
        message
    }
}

/// Header values must not carry line breaks.
fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

#[async_trait]
impl Notifier for SendmailNotifier {
    async fn send(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        if recipients.is_empty() {
            return Err(NotifyError::DeliveryFailed("no recipients".to_string()));
        }

        let message = self.compose(recipients, subject, body);
        let mut child = Command::new(&self.sendmail_path)
            .args(["-t", "-i"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                NotifyError::DeliveryFailed(format!("failed to run {}: {e}", self.sendmail_path))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| NotifyError::DeliveryFailed("sendmail stdin unavailable".to_string()))?;
        stdin.write_all(message.as_bytes()).await?;
        drop(stdin);

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(NotifyError::DeliveryFailed(format!(
                "{} exited with {}: {stderr}",
                self.sendmail_path, output.status
            )));
        }

        debug!(recipients = recipients.len(), "message handed to sendmail");
        Ok(())
    }
}
