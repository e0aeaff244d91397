//! Run report rendering.
//!
//! Reduces a finished `RunResult` to totals, a subject line and a plain-text
//! body for the notification collaborator.

use chrono::Duration;
use comfy_table::{presets, Cell, ContentArrangement, Table};
use serde::Serialize;
use std::fmt::Write as _;

use crate::domain::models::{FeedJob, FeedJobState, PollOutcome, RunResult};

/// Per-outcome counts for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportTotals {
    pub jobs: usize,
    pub converged: usize,
    pub aborted: usize,
    pub skipped: usize,
    pub config_invalid: usize,
    pub submit_failed: usize,
    pub errors: u64,
    pub warnings: u64,
    pub duration_secs: Option<i64>,
}

/// Rendered report handed to the notifier.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub subject: String,
    pub body: String,
    pub totals: ReportTotals,
}

/// Builds run reports.
#[derive(Debug, Clone)]
pub struct ReportAggregator {
    subject_prefix: String,
}

impl ReportAggregator {
    pub fn new(subject_prefix: impl Into<String>) -> Self {
        Self {
            subject_prefix: subject_prefix.into(),
        }
    }

    pub fn totals(result: &RunResult) -> ReportTotals {
        let mut totals = ReportTotals {
            jobs: result.jobs().len(),
            errors: result.total_errors(),
            warnings: result.total_warnings(),
            duration_secs: result.duration().map(|d| d.num_seconds()),
            ..Default::default()
        };

        for job in result.jobs() {
            match (job.state(), job.poll_outcome()) {
                (FeedJobState::Skipped, _) => totals.skipped += 1,
                (FeedJobState::ConfigInvalid, _) => totals.config_invalid += 1,
                (FeedJobState::SubmitFailed, _) => totals.submit_failed += 1,
                (_, Some(PollOutcome::Converged)) => totals.converged += 1,
                (_, Some(PollOutcome::Aborted)) => totals.aborted += 1,
                _ => {}
            }
        }

        totals
    }

    pub fn subject(&self, result: &RunResult) -> String {
        let prefix = &self.subject_prefix;
        let errors = result.total_errors();
        let warnings = result.total_warnings();

        if result.fatal().is_some() {
            format!("{prefix} FAILED: global configuration error")
        } else if errors > 0 {
            format!("{prefix} completed with {errors} error(s), {warnings} warning(s)")
        } else if warnings > 0 {
            format!("{prefix} completed with {warnings} warning(s)")
        } else {
            format!("{prefix} completed successfully")
        }
    }

    /// Summarize a finished run.
    pub fn summarize(&self, result: &RunResult) -> RunReport {
        RunReport {
            subject: self.subject(result),
            body: render_body(result),
            totals: Self::totals(result),
        }
    }
}

impl Default for ReportAggregator {
    fn default() -> Self {
        Self::new("[feedrunner]")
    }
}

fn render_body(result: &RunResult) -> String {
    let mut body = String::new();
    let timestamp = |t: chrono::DateTime<chrono::Utc>| t.format("%Y-%m-%d %H:%M:%S UTC").to_string();

    let _ = writeln!(body, "Run:      {}", result.run_id());
    let _ = writeln!(body, "Started:  {}", timestamp(result.started_at()));
    if let Some(ended) = result.ended_at() {
        let _ = writeln!(body, "Ended:    {}", timestamp(ended));
    }
    if let Some(duration) = result.duration() {
        let _ = writeln!(body, "Duration: {}", format_duration(duration));
    }
    if let Some(format) = result.format() {
        let _ = writeln!(body, "Format:   {format}");
    }
    let _ = writeln!(
        body,
        "Errors:   {}\nWarnings: {}",
        result.total_errors(),
        result.total_warnings()
    );

    if let Some(fatal) = result.fatal() {
        let _ = writeln!(body, "\nGlobal configuration error, no feeds were processed:\n  {fatal}");
        return body;
    }

    if result.jobs().is_empty() {
        body.push_str("\nNo feeds configured.\n");
    } else {
        let _ = writeln!(body, "\n{}", job_table(result.jobs()));
    }

    for failure in result.task_failures() {
        let _ = writeln!(body, "Job task failed: {failure}");
    }

    let summaries: Vec<_> = result
        .jobs()
        .iter()
        .filter_map(|job| job.summary().map(|s| (job.name(), s)))
        .collect();
    if !summaries.is_empty() {
        body.push_str("\nRemote summaries:\n");
        for (name, summary) in summaries {
            let _ = writeln!(body, "--- {name}\n{}", summary.trim_end());
        }
    }

    let cleanup = result.cleanup();
    body.push_str("\nCleanup:\n");
    match (&cleanup.archive, &cleanup.archive_error) {
        (Some(archive), _) => {
            let _ = writeln!(body, "  archive written: {}", archive.display());
        }
        (None, Some(error)) => {
            let _ = writeln!(body, "  archive failed: {error}");
        }
        (None, None) => body.push_str("  archiving disabled\n"),
    }
    let _ = writeln!(
        body,
        "  feeds deleted: {}\n  expired archives deleted: {}\n  expired logs deleted: {}",
        cleanup.feeds_deleted.len(),
        cleanup.archives_deleted.len(),
        cleanup.logs_deleted.len()
    );

    body
}

fn job_table(jobs: &[FeedJob]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::ASCII_MARKDOWN)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(vec![
            "Feed",
            "Record type",
            "Operation",
            "Outcome",
            "Expected",
            "Completed",
            "Errors",
            "Warnings",
            "Duration",
            "Detail",
        ]);

    for job in jobs {
        table.add_row(vec![
            Cell::new(job.name()),
            Cell::new(job.record_type()),
            Cell::new(job.operation()),
            Cell::new(job.outcome_label()),
            Cell::new(optional(job.expected_count())),
            Cell::new(optional(job.completed_count())),
            Cell::new(job.error_count()),
            Cell::new(job.warning_count()),
            Cell::new(job.duration().map_or_else(|| "-".to_string(), format_duration)),
            Cell::new(job.detail().unwrap_or("")),
        ]);
    }

    table
}

fn optional(value: Option<u64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.num_seconds().max(0);
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::FatalRunError;
    use crate::domain::models::{FeedSource, IntegrationFormat, JobId};
    use chrono::Utc;
    use std::path::PathBuf;

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

    fn finalized(position: usize, name: &str, outcome: PollOutcome, errors: u64) -> FeedJob {
        let mut job = job(position, name);
        job.start(Utc::now());
        job.record_count(10).unwrap();
        job.mark_submitted(JobId::new(format!("job-{name}")).unwrap()).unwrap();
        job.begin_polling().unwrap();
        job.record_poll(outcome, Some(10), 0).unwrap();
        job.finalize(errors, 0, Some(format!("{name} summary")), Utc::now())
            .unwrap();
        job
    }

    #[test]
    fn test_fatal_subject_mentions_global_configuration_error() {
        let mut result = RunResult::new(Utc::now());
        result.fail(FatalRunError::InvalidIntegrationFormat("Bogus".to_string()));
        result.finish(Utc::now());

        let report = ReportAggregator::new("[sis]").summarize(&result);
        assert_eq!(report.subject, "[sis] FAILED: global configuration error");
        assert!(report.body.contains("Bogus"));
        assert_eq!(report.totals.jobs, 0);
        assert_eq!(report.totals.errors, 1);
    }

    #[test]
    fn test_subject_variants() {
        let aggregator = ReportAggregator::default();

        let mut clean = RunResult::new(Utc::now());
        clean.record_job(finalized(0, "a.txt", PollOutcome::Converged, 0));
        assert_eq!(aggregator.subject(&clean), "[feedrunner] completed successfully");

        let mut with_errors = RunResult::new(Utc::now());
        with_errors.record_job(finalized(0, "a.txt", PollOutcome::Converged, 3));
        assert_eq!(
            aggregator.subject(&with_errors),
            "[feedrunner] completed with 3 error(s), 0 warning(s)"
        );

        let mut with_warnings = RunResult::new(Utc::now());
        with_warnings.record_job(finalized(0, "a.txt", PollOutcome::Aborted, 0));
        assert_eq!(
            aggregator.subject(&with_warnings),
            "[feedrunner] completed with 10 warning(s)"
        );
    }

    #[test]
    fn test_totals_count_each_outcome() {
        let mut result = RunResult::new(Utc::now());
        result.record_job(finalized(0, "a.txt", PollOutcome::Converged, 0));
        result.record_job(finalized(1, "b.txt", PollOutcome::Aborted, 0));

        let mut skipped = job(2, "c.txt");
        skipped.record_count(0).unwrap();
        skipped.mark_skipped(Utc::now()).unwrap();
        result.record_job(skipped);

        let mut invalid = job(3, "d.txt");
        invalid.mark_config_invalid("feed file not found", Utc::now()).unwrap();
        result.record_job(invalid);

        let mut failed = job(4, "e.txt");
        failed.record_count(2).unwrap();
        failed.mark_submit_failed("timeout", Utc::now()).unwrap();
        result.record_job(failed);
        result.finish(Utc::now());

        let totals = ReportAggregator::totals(&result);
        assert_eq!(totals.jobs, 5);
        assert_eq!(totals.converged, 1);
        assert_eq!(totals.aborted, 1);
        assert_eq!(totals.skipped, 1);
        assert_eq!(totals.config_invalid, 1);
        assert_eq!(totals.submit_failed, 1);
        assert_eq!(totals.errors, 2);
        assert_eq!(totals.warnings, 10);
    }

    #[test]
    fn test_body_lists_jobs_in_order_with_summaries() {
        let mut result = RunResult::new(Utc::now());
        result.set_format(IntegrationFormat::FlatFile);
        result.record_job(finalized(1, "course.txt", PollOutcome::Converged, 0));
        result.record_job(finalized(0, "person.txt", PollOutcome::Converged, 0));
        result.finish(Utc::now());

        let body = ReportAggregator::default().summarize(&result).body;
        let person = body.find("person.txt").unwrap();
        let course = body.find("course.txt").unwrap();
        assert!(person < course);
        assert!(body.contains("Format:   flat_file"));
        assert!(body.contains("person.txt summary"));
        assert!(body.contains("archiving disabled"));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::seconds(3725)), "01:02:05");
        assert_eq!(format_duration(Duration::seconds(-4)), "00:00:00");
    }
}
