//! Feed job domain model.
//!
//! A feed job tracks one configured feed file from discovery through
//! submission, status polling and final accounting. State changes go through
//! the transition methods so that the job identifier and expected record count
//! invariants hold at every step.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use super::config::FeedSource;
use crate::domain::errors::{DomainError, DomainResult};

/// Opaque identifier the remote system assigns to a submitted feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    /// Build a job identifier, rejecting blank values.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of a feed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedJobState {
    /// Configured, not yet inspected
    Pending,
    /// File exists and its records were counted
    Counted,
    /// File holds no records; nothing to submit
    Skipped,
    /// Missing file or rejected record type / operation
    ConfigInvalid,
    /// Accepted by the remote system, job identifier assigned
    Submitted,
    /// The submission call itself failed
    SubmitFailed,
    /// Waiting for the remote job to settle
    Polling,
    /// Completed count reached the expected count
    Converged,
    /// Polling stalled past the abort threshold
    Aborted,
    /// Error and warning counts collected
    Finalized,
}

impl FeedJobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Counted => "counted",
            Self::Skipped => "skipped",
            Self::ConfigInvalid => "config_invalid",
            Self::Submitted => "submitted",
            Self::SubmitFailed => "submit_failed",
            Self::Polling => "polling",
            Self::Converged => "converged",
            Self::Aborted => "aborted",
            Self::Finalized => "finalized",
        }
    }

    /// Check if the job has nothing left to do.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Skipped | Self::ConfigInvalid | Self::SubmitFailed | Self::Finalized
        )
    }

    /// States in which the job holds a job identifier.
    pub fn has_job_id(&self) -> bool {
        matches!(
            self,
            Self::Submitted | Self::Polling | Self::Converged | Self::Aborted | Self::Finalized
        )
    }

    /// Valid transitions from this state.
    pub fn valid_transitions(&self) -> &'static [FeedJobState] {
        match self {
            Self::Pending => &[Self::Counted, Self::ConfigInvalid],
            Self::Counted => &[
                Self::Skipped,
                Self::ConfigInvalid,
                Self::Submitted,
                Self::SubmitFailed,
            ],
            Self::Submitted => &[Self::Polling],
            Self::Polling => &[Self::Converged, Self::Aborted],
            Self::Converged | Self::Aborted => &[Self::Finalized],
            Self::Skipped | Self::ConfigInvalid | Self::SubmitFailed | Self::Finalized => &[],
        }
    }

    pub fn can_transition_to(&self, next: Self) -> bool {
        self.valid_transitions().contains(&next)
    }
}

impl fmt::Display for FeedJobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How status polling for a submitted job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollOutcome {
    Converged,
    Aborted,
}

impl PollOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Converged => "converged",
            Self::Aborted => "aborted",
        }
    }
}

/// One configured feed file and everything observed about it during a run.
#[derive(Debug, Clone, Serialize)]
pub struct FeedJob {
    position: usize,
    path: PathBuf,
    name: String,
    record_type: String,
    operation: String,
    state: FeedJobState,
    job_id: Option<JobId>,
    expected_count: Option<u64>,
    completed_count: Option<u64>,
    consecutive_stalls: u32,
    poll_outcome: Option<PollOutcome>,
    error_count: u64,
    warning_count: u64,
    detail: Option<String>,
    summary: Option<String>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
}

impl FeedJob {
    /// Create a pending job for the feed at `position` in configuration order.
    pub fn new(position: usize, source: &FeedSource) -> Self {
        let name = source
            .path
            .file_name()
            .map_or_else(|| source.path.display().to_string(), |n| n.to_string_lossy().into_owned());

        Self {
            position,
            path: source.path.clone(),
            name,
            record_type: source.record_type.clone(),
            operation: source.operation.clone(),
            state: FeedJobState::Pending,
            job_id: None,
            expected_count: None,
            completed_count: None,
            consecutive_stalls: 0,
            poll_outcome: None,
            error_count: 0,
            warning_count: 0,
            detail: None,
            summary: None,
            started_at: None,
            ended_at: None,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Display name: the final path component.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn state(&self) -> FeedJobState {
        self.state
    }

    pub fn job_id(&self) -> Option<&JobId> {
        self.job_id.as_ref()
    }

    pub fn expected_count(&self) -> Option<u64> {
        self.expected_count
    }

    pub fn completed_count(&self) -> Option<u64> {
        self.completed_count
    }

    pub fn consecutive_stalls(&self) -> u32 {
        self.consecutive_stalls
    }

    pub fn poll_outcome(&self) -> Option<PollOutcome> {
        self.poll_outcome
    }

    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    pub fn warning_count(&self) -> u64 {
        self.warning_count
    }

    /// Reason a job ended early (config problem or submission failure).
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Free-form summary text reported by the remote system.
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Wall time spent on this job, once it has ended.
    pub fn duration(&self) -> Option<chrono::Duration> {
        Some(self.ended_at? - self.started_at?)
    }

    fn transition_to(&mut self, next: FeedJobState) -> DomainResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(DomainError::InvalidStateTransition {
                feed: self.name.clone(),
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    fn end(&mut self, at: DateTime<Utc>) {
        self.ended_at = Some(at);
    }

    /// Stamp the start of processing.
    pub fn start(&mut self, at: DateTime<Utc>) {
        self.started_at.get_or_insert(at);
    }

    /// `Pending → Counted`. The expected count is set exactly once.
    pub fn record_count(&mut self, count: u64) -> DomainResult<()> {
        if self.expected_count.is_some() {
            return Err(DomainError::ExpectedCountAlreadySet(self.name.clone()));
        }
        self.transition_to(FeedJobState::Counted)?;
        self.expected_count = Some(count);
        Ok(())
    }

    /// `Counted → Skipped` for a feed without records.
    pub fn mark_skipped(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        self.transition_to(FeedJobState::Skipped)?;
        self.end(at);
        Ok(())
    }

    /// `Pending | Counted → ConfigInvalid`. Counts as one error.
    pub fn mark_config_invalid(
        &mut self,
        reason: impl Into<String>,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.transition_to(FeedJobState::ConfigInvalid)?;
        self.detail = Some(reason.into());
        self.error_count = 1;
        self.end(at);
        Ok(())
    }

    /// `Counted → SubmitFailed`. Counts as one error.
    pub fn mark_submit_failed(
        &mut self,
        reason: impl Into<String>,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.transition_to(FeedJobState::SubmitFailed)?;
        self.detail = Some(reason.into());
        self.error_count = 1;
        self.end(at);
        Ok(())
    }

    /// `Counted → Submitted`, attaching the remote job identifier.
    pub fn mark_submitted(&mut self, job_id: JobId) -> DomainResult<()> {
        self.transition_to(FeedJobState::Submitted)?;
        self.job_id = Some(job_id);
        Ok(())
    }

    /// `Submitted → Polling`.
    pub fn begin_polling(&mut self) -> DomainResult<()> {
        self.transition_to(FeedJobState::Polling)
    }

    /// `Polling → Converged | Aborted`, keeping the last observed progress.
    pub fn record_poll(
        &mut self,
        outcome: PollOutcome,
        completed: Option<u64>,
        consecutive_stalls: u32,
    ) -> DomainResult<()> {
        let next = match outcome {
            PollOutcome::Converged => FeedJobState::Converged,
            PollOutcome::Aborted => FeedJobState::Aborted,
        };
        self.transition_to(next)?;
        self.poll_outcome = Some(outcome);
        self.completed_count = completed;
        self.consecutive_stalls = consecutive_stalls;
        Ok(())
    }

    /// `Converged | Aborted → Finalized` with the remote error/warning counts.
    ///
    /// An aborted job also carries its whole expected record count as
    /// warnings, since none of its records can be confirmed.
    pub fn finalize(
        &mut self,
        errors: u64,
        warnings: u64,
        summary: Option<String>,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.transition_to(FeedJobState::Finalized)?;
        self.error_count = errors;
        self.warning_count = warnings;
        if self.poll_outcome == Some(PollOutcome::Aborted) {
            self.warning_count += self.expected_count.unwrap_or(0);
        }
        self.summary = summary.filter(|s| !s.trim().is_empty());
        self.end(at);
        Ok(())
    }

    /// Short label for reports: the poll outcome once finalized, else the state.
    pub fn outcome_label(&self) -> &'static str {
        match (self.state, self.poll_outcome) {
            (FeedJobState::Finalized, Some(outcome)) => outcome.as_str(),
            (state, _) => state.as_str(),
        }
    }
}
