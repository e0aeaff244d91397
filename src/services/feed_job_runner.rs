//! Drives one feed job through its whole lifecycle.
//!
//! Pending → Counted → Submitted → Polling → Converged | Aborted → Finalized,
//! with early exits to ConfigInvalid, Skipped and SubmitFailed. Every exit
//! returns the job; nothing here stops other jobs from running.

use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use super::convergence_poller::ConvergencePoller;
use super::record_counter;
use crate::domain::errors::DomainResult;
use crate::domain::models::{FeedJob, IntegrationFormat, JobId, ServerOptions};
use crate::domain::ports::{FeedSubmission, IntegrationClient};

/// Runs feed jobs against one integration endpoint.
pub struct FeedJobRunner {
    client: Arc<dyn IntegrationClient>,
    server: ServerOptions,
    format: IntegrationFormat,
    poller: ConvergencePoller,
}

impl FeedJobRunner {
    pub fn new(
        client: Arc<dyn IntegrationClient>,
        server: ServerOptions,
        format: IntegrationFormat,
        poller: ConvergencePoller,
    ) -> Self {
        Self {
            client,
            server,
            format,
            poller,
        }
    }

    /// Run `job` to a terminal state and hand it back.
    #[instrument(skip(self, job), fields(feed = %job.name()))]
    pub async fn run(&self, mut job: FeedJob) -> FeedJob {
        if let Err(e) = self.drive(&mut job).await {
            // Transitions are issued in lifecycle order, so this means a bug.
            error!(error = %e, state = %job.state(), "feed lifecycle out of order");
        }
        job
    }

    async fn drive(&self, job: &mut FeedJob) -> DomainResult<()> {
        job.start(Utc::now());
        let path = job.path().to_path_buf();

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            error!(path = %path.display(), "feed file not found");
            return job.mark_config_invalid(
                format!("feed file not found: {}", path.display()),
                Utc::now(),
            );
        }

        let expected = match record_counter::count_records(self.format, &path).await {
            Ok(count) => count,
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to read feed file");
                return job.mark_config_invalid(
                    format!("failed to read feed file: {e}"),
                    Utc::now(),
                );
            }
        };
        job.record_count(expected)?;

        if expected == 0 {
            info!("feed file has no records, skipping");
            return job.mark_skipped(Utc::now());
        }

        let (record_type, operation) = match self.format.validate(job.record_type(), job.operation()) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!(
                    record_type = job.record_type(),
                    operation = job.operation(),
                    error = %e,
                    "invalid feed configuration"
                );
                return job.mark_config_invalid(e.to_string(), Utc::now());
            }
        };

        let submission = FeedSubmission {
            path,
            format: self.format,
            record_type,
            operation,
        };
        let job_id = match self.client.submit(&self.server, &submission).await {
            Ok(job_id) => job_id,
            Err(e) => {
                error!(error = %e, "feed submission failed");
                return job.mark_submit_failed(e.to_string(), Utc::now());
            }
        };
        info!(
            job_id = %job_id,
            expected = expected,
            record_type = %record_type,
            operation = %operation,
            "feed submitted"
        );
        job.mark_submitted(job_id.clone())?;

        job.begin_polling()?;
        let report = self
            .poller
            .poll_until_settled(expected, || self.client.poll_completed(&self.server, &job_id))
            .await;
        job.record_poll(report.outcome, report.completed, report.consecutive_stalls)?;

        let (errors, warnings, summary) = self.collect_final_counts(&job_id).await;
        job.finalize(errors, warnings, summary, Utc::now())?;

        info!(
            job_id = %job_id,
            outcome = job.outcome_label(),
            completed = ?job.completed_count(),
            expected = expected,
            errors = job.error_count(),
            warnings = job.warning_count(),
            "feed finalized"
        );
        Ok(())
    }

    /// Error count, warning count and summary for a settled job. Lookups that
    /// fail are logged and contribute nothing.
    async fn collect_final_counts(&self, job_id: &JobId) -> (u64, u64, Option<String>) {
        let errors = self
            .client
            .poll_errors(&self.server, job_id)
            .await
            .unwrap_or_else(|e| {
                warn!(job_id = %job_id, error = %e, "failed to fetch error count");
                0
            });
        let warnings = self
            .client
            .poll_warnings(&self.server, job_id)
            .await
            .unwrap_or_else(|e| {
                warn!(job_id = %job_id, error = %e, "failed to fetch warning count");
                0
            });
        let summary = match self.client.poll_summary(&self.server, job_id).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "failed to fetch job summary");
                None
            }
        };
        (errors, warnings, summary)
    }
}
