use async_trait::async_trait;

use super::errors::NotifyError;

/// Delivers the rendered run report.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipients: &[String], subject: &str, body: &str)
        -> Result<(), NotifyError>;
}
