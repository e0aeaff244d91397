//! Implementation of the `feedrunner run` command.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::adapters::{CommandIntegrationClient, SendmailNotifier, ZipArchiver};
use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::logging::LoggerImpl;
use crate::services::{ReportTotals, RunController};

#[derive(Debug, Serialize)]
pub struct RunOutput {
    pub success: bool,
    pub run_id: Uuid,
    pub subject: String,
    pub fatal: Option<String>,
    pub totals: ReportTotals,
    pub log_file: String,
    pub archive: Option<String>,
    #[serde(skip)]
    pub body: String,
}

impl CommandOutput for RunOutput {
    fn to_human(&self) -> String {
        format!("{}\n\n{}", self.subject, self.body.trim_end())
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(config_path: &Path, json_mode: bool) -> Result<()> {
    let started_at = Utc::now();
    let config = ConfigLoader::load(config_path)?;
    let logger = LoggerImpl::init(&config.logging, started_at)
        .context("Failed to initialize logging")?;

    let client = Arc::new(CommandIntegrationClient::new(&config.client));
    let notifier = Arc::new(SendmailNotifier::new(&config.notification));
    let controller = RunController::new(config, client, Arc::new(ZipArchiver::new()), notifier)
        .with_log_file(logger.log_path());

    let (result, report) = controller.run_and_notify_at(started_at).await;
    let fatal = result.fatal().map(ToString::to_string);

    let output_data = RunOutput {
        success: fatal.is_none(),
        run_id: result.run_id(),
        subject: report.subject,
        fatal: fatal.clone(),
        totals: report.totals,
        log_file: logger.log_path().display().to_string(),
        archive: result
            .cleanup()
            .archive
            .as_ref()
            .map(|p| p.display().to_string()),
        body: report.body,
    };
    output(&output_data, json_mode);

    match fatal {
        Some(fatal) => anyhow::bail!("run failed: {fatal}"),
        None => Ok(()),
    }
}
