//! Run controller: sequences every configured feed job for one run, then
//! archives and applies retention cleanup.
//!
//! Feed jobs own disjoint state, so by default each gets its own tokio task
//! and polls independently. File-system cleanup only starts once every job
//! has reached a terminal state.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use super::convergence_poller::{ConvergencePoller, PollerConfig};
use super::feed_job_runner::FeedJobRunner;
use super::report::{ReportAggregator, RunReport};
use super::retention_sweeper::{RetentionSweeper, ARTIFACT_DATE_FORMAT, ARTIFACT_TIMESTAMP_FORMAT};
use crate::domain::models::{Config, FeedJob, IntegrationFormat, RunResult};
use crate::domain::ports::{ArchiveError, Archiver, IntegrationClient, Notifier};

/// Orchestrates one run over the configured feeds.
pub struct RunController {
    config: Arc<Config>,
    client: Arc<dyn IntegrationClient>,
    archiver: Arc<dyn Archiver>,
    notifier: Arc<dyn Notifier>,
    log_file: Option<PathBuf>,
}

impl RunController {
    pub fn new(
        config: Config,
        client: Arc<dyn IntegrationClient>,
        archiver: Arc<dyn Archiver>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            client,
            archiver,
            notifier,
            log_file: None,
        }
    }

    /// The run's own log file: archived with the feeds and never swept.
    pub fn with_log_file(mut self, log_file: impl Into<PathBuf>) -> Self {
        self.log_file = Some(log_file.into());
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run every feed job, then archive and clean up.
    pub async fn execute(&self) -> RunResult {
        self.execute_at(Utc::now()).await
    }

    /// Same as [`execute`](Self::execute) with an explicit run start time,
    /// which also names the run's archive.
    #[instrument(skip(self, started_at), fields(feeds = self.config.feeds.len()))]
    pub async fn execute_at(&self, started_at: DateTime<Utc>) -> RunResult {
        let mut result = RunResult::new(started_at);
        info!(run_id = %result.run_id(), "run started");

        match self.config.integration_format.parse::<IntegrationFormat>() {
            Ok(format) => {
                result.set_format(format);
                self.run_jobs(format, &mut result).await;
                self.archive_and_clean_feeds(&mut result).await;
            }
            Err(e) => {
                error!(error = %e, "global configuration error, no feeds will be processed");
                result.fail(e);
            }
        }

        self.sweep_logs(&mut result).await;
        result.finish(Utc::now());

        info!(
            run_id = %result.run_id(),
            jobs = result.jobs().len(),
            errors = result.total_errors(),
            warnings = result.total_warnings(),
            "run finished"
        );
        result
    }

    /// Execute the run, render its report and hand it to the notifier.
    ///
    /// Notification failures are logged and never fail the run.
    pub async fn run_and_notify(&self) -> (RunResult, RunReport) {
        self.run_and_notify_at(Utc::now()).await
    }

    pub async fn run_and_notify_at(&self, started_at: DateTime<Utc>) -> (RunResult, RunReport) {
        let result = self.execute_at(started_at).await;
        let report =
            ReportAggregator::new(self.config.notification.subject_prefix.clone()).summarize(&result);
        self.notify(&report).await;
        (result, report)
    }

    async fn notify(&self, report: &RunReport) {
        let notification = &self.config.notification;
        if !notification.enabled {
            return;
        }
        if notification.recipients.is_empty() {
            warn!("notification enabled but no recipients configured");
            return;
        }

        match self
            .notifier
            .send(&notification.recipients, &report.subject, &report.body)
            .await
        {
            Ok(()) => info!(
                recipients = notification.recipients.len(),
                subject = %report.subject,
                "run report sent"
            ),
            Err(e) => error!(error = %e, "failed to send run report"),
        }
    }

    async fn run_jobs(&self, format: IntegrationFormat, result: &mut RunResult) {
        let runner = Arc::new(FeedJobRunner::new(
            Arc::clone(&self.client),
            self.config.server.clone(),
            format,
            ConvergencePoller::new(PollerConfig::from(&self.config.polling)),
        ));
        let jobs: Vec<FeedJob> = self
            .config
            .feeds
            .iter()
            .enumerate()
            .map(|(position, source)| FeedJob::new(position, source))
            .collect();

        if !self.config.polling.concurrent {
            for job in jobs {
                result.record_job(runner.run(job).await);
            }
            return;
        }

        let handles: Vec<(String, JoinHandle<FeedJob>)> = jobs
            .into_iter()
            .map(|job| {
                let runner = Arc::clone(&runner);
                let name = job.name().to_string();
                (name, tokio::spawn(async move { runner.run(job).await }))
            })
            .collect();

        for (name, handle) in handles {
            match handle.await {
                Ok(job) => result.record_job(job),
                Err(e) => {
                    error!(feed = %name, error = %e, "feed job task failed");
                    result.record_task_failure(&name, e.to_string());
                }
            }
        }
    }

    /// Archive the log and feed files, sweep expired archives, then delete
    /// the feed files.
    async fn archive_and_clean_feeds(&self, result: &mut RunResult) {
        let archive_cfg = &self.config.archive;
        let mut keep_feeds = false;

        if archive_cfg.enabled {
            match self.write_archive(result.started_at()).await {
                Ok(Some(archive)) => result.cleanup_mut().archive = Some(archive),
                Ok(None) => {}
                Err(e) => {
                    error!(error = %e, "failed to write archive, keeping feed files");
                    result.cleanup_mut().archive_error = Some(e.to_string());
                    keep_feeds = true;
                }
            }

            let keep: Vec<PathBuf> = result.cleanup().archive.iter().cloned().collect();
            match RetentionSweeper::archives(archive_cfg.retention_days)
                .sweep(&archive_cfg.dir, Utc::now(), &keep)
                .await
            {
                Ok(deleted) => result.cleanup_mut().archives_deleted = deleted,
                Err(e) => warn!(error = %e, "archive retention sweep failed"),
            }
        }

        if keep_feeds {
            return;
        }

        for path in self.existing_feed_paths().await {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    info!(path = %path.display(), "deleted feed file");
                    result.cleanup_mut().feeds_deleted.push(path);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "failed to delete feed file"),
            }
        }
    }

    /// Bundle the log file and every feed file still on disk.
    ///
    /// # Returns
    /// The archive path, or `None` when there was nothing to archive
    async fn write_archive(
        &self,
        started_at: DateTime<Utc>,
    ) -> Result<Option<PathBuf>, ArchiveError> {
        let archive_cfg = &self.config.archive;

        let mut paths = Vec::new();
        if let Some(log_file) = &self.log_file {
            if tokio::fs::try_exists(log_file).await.unwrap_or(false) {
                paths.push(log_file.clone());
            }
        }
        paths.extend(self.existing_feed_paths().await);

        if paths.is_empty() {
            info!("nothing to archive");
            return Ok(None);
        }

        tokio::fs::create_dir_all(&archive_cfg.dir).await?;

        let stamp = if archive_cfg.append {
            started_at.format(ARTIFACT_DATE_FORMAT)
        } else {
            started_at.format(ARTIFACT_TIMESTAMP_FORMAT)
        };
        let archive = archive_cfg.dir.join(format!("feeds_{stamp}.zip"));

        self.archiver
            .create_archive(&archive, &paths, archive_cfg.append)
            .await?;

        info!(archive = %archive.display(), files = paths.len(), "archive written");
        Ok(Some(archive))
    }

    /// Configured feed files that still exist, deduplicated, in order.
    async fn existing_feed_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = Vec::new();
        for feed in &self.config.feeds {
            if paths.contains(&feed.path) {
                continue;
            }
            if tokio::fs::try_exists(&feed.path).await.unwrap_or(false) {
                paths.push(feed.path.clone());
            } else {
                info!(path = %feed.path.display(), "feed file no longer exists, skipping");
            }
        }
        paths
    }

    async fn sweep_logs(&self, result: &mut RunResult) {
        let logging = &self.config.logging;
        let keep: Vec<PathBuf> = self.log_file.iter().cloned().collect();

        match RetentionSweeper::logs(logging.retention_days)
            .sweep(&logging.dir, Utc::now(), &keep)
            .await
        {
            Ok(deleted) => result.cleanup_mut().logs_deleted = deleted,
            Err(e) => warn!(error = %e, "log retention sweep failed"),
        }
    }
}
