//! Result of one run over the configured feeds.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

use super::feed::IntegrationFormat;
use super::feed_job::FeedJob;
use crate::domain::errors::FatalRunError;

/// What the post-run archiving and retention passes did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupSummary {
    /// Archive written this run
    pub archive: Option<PathBuf>,
    /// Why the archive could not be written
    pub archive_error: Option<String>,
    pub archives_deleted: Vec<PathBuf>,
    pub logs_deleted: Vec<PathBuf>,
    pub feeds_deleted: Vec<PathBuf>,
}

/// Aggregate state of one run, owned by the run controller.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    format: Option<IntegrationFormat>,
    jobs: Vec<FeedJob>,
    total_errors: u64,
    total_warnings: u64,
    fatal: Option<FatalRunError>,
    task_failures: Vec<String>,
    cleanup: CleanupSummary,
}

impl RunResult {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            ended_at: None,
            format: None,
            jobs: Vec::new(),
            total_errors: 0,
            total_warnings: 0,
            fatal: None,
            task_failures: Vec::new(),
            cleanup: CleanupSummary::default(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn format(&self) -> Option<IntegrationFormat> {
        self.format
    }

    /// Jobs in configuration order.
    pub fn jobs(&self) -> &[FeedJob] {
        &self.jobs
    }

    pub fn total_errors(&self) -> u64 {
        self.total_errors
    }

    pub fn total_warnings(&self) -> u64 {
        self.total_warnings
    }

    pub fn fatal(&self) -> Option<&FatalRunError> {
        self.fatal.as_ref()
    }

    /// Jobs whose task died before producing a result.
    pub fn task_failures(&self) -> &[String] {
        &self.task_failures
    }

    pub fn cleanup(&self) -> &CleanupSummary {
        &self.cleanup
    }

    pub fn cleanup_mut(&mut self) -> &mut CleanupSummary {
        &mut self.cleanup
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        self.ended_at.map(|end| end - self.started_at)
    }

    pub fn set_format(&mut self, format: IntegrationFormat) {
        self.format = Some(format);
    }

    /// Stop the run on a global configuration error. It becomes the run's
    /// only reported error.
    pub fn fail(&mut self, error: FatalRunError) {
        self.jobs.clear();
        self.total_errors = 1;
        self.total_warnings = 0;
        self.fatal = Some(error);
    }

    /// Add a finished job, keeping configuration order whatever the
    /// completion order.
    pub fn record_job(&mut self, job: FeedJob) {
        self.total_errors += job.error_count();
        self.total_warnings += job.warning_count();
        let at = self
            .jobs
            .partition_point(|existing| existing.position() < job.position());
        self.jobs.insert(at, job);
    }

    /// Count a job whose task ended without handing back its state.
    pub fn record_task_failure(&mut self, feed: &str, reason: impl Into<String>) {
        self.total_errors += 1;
        self.task_failures.push(format!("{feed}: {}", reason.into()));
    }

    pub fn finish(&mut self, at: DateTime<Utc>) {
        self.ended_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::config::FeedSource;

    fn job(position: usize, name: &str) -> FeedJob {
        FeedJob::new(
            position,
            &FeedSource {
                path: PathBuf::from(name),
                record_type: "person".to_string(),
                operation: "store".to_string(),
            },
        )
    }

    #[test]
    fn test_record_job_keeps_configuration_order() {
        let mut result = RunResult::new(Utc::now());
        result.record_job(job(2, "c.txt"));
        result.record_job(job(0, "a.txt"));
        result.record_job(job(1, "b.txt"));

        let names: Vec<_> = result.jobs().iter().map(FeedJob::name).collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
    }

    #[test]
    fn test_record_job_sums_counts() {
        let mut result = RunResult::new(Utc::now());
        let mut missing = job(0, "a.txt");
        missing.mark_config_invalid("missing", Utc::now()).unwrap();
        result.record_job(missing);
        result.record_job(job(1, "b.txt"));

        assert_eq!(result.total_errors(), 1);
        assert_eq!(result.total_warnings(), 0);
    }

    #[test]
    fn test_fail_reports_single_error_and_no_jobs() {
        let mut result = RunResult::new(Utc::now());
        result.record_job(job(0, "a.txt"));
        result.fail(FatalRunError::InvalidIntegrationFormat("Bogus".to_string()));

        assert!(result.jobs().is_empty());
        assert_eq!(result.total_errors(), 1);
        assert!(result.fatal().is_some());
    }

    #[test]
    fn test_task_failure_counts_as_error() {
        let mut result = RunResult::new(Utc::now());
        result.record_task_failure("a.txt", "task panicked");
        assert_eq!(result.total_errors(), 1);
        assert_eq!(result.task_failures(), ["a.txt: task panicked".to_string()]);
    }
}
