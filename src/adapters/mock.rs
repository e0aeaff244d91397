//! Mock collaborators for testing.
//!
//! The integration client replays a per-feed script keyed by the feed's file
//! name; the notifier and archiver record what they were asked to do.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::models::{JobId, ServerOptions};
use crate::domain::ports::{
    ArchiveError, Archiver, FeedSubmission, IntegrationClient, IntegrationError, Notifier,
    NotifyError,
};
use crate::services::record_counter;

/// Scripted behavior for one feed file.
#[derive(Debug, Clone)]
pub struct MockFeedScript {
    /// Error message returned by `submit`, if it should fail
    pub submit_error: Option<String>,
    /// Results replayed by `poll_completed`; the last entry repeats
    pub completed: Vec<Result<u64, String>>,
    pub errors: u64,
    pub warnings: u64,
    pub summary: String,
}

impl Default for MockFeedScript {
    fn default() -> Self {
        Self {
            submit_error: None,
            completed: vec![],
            errors: 0,
            warnings: 0,
            summary: "Mock job processed.".to_string(),
        }
    }
}

impl MockFeedScript {
    pub fn completing(sequence: Vec<Result<u64, &str>>) -> Self {
        Self {
            completed: sequence
                .into_iter()
                .map(|r| r.map_err(str::to_string))
                .collect(),
            ..Default::default()
        }
    }

    pub fn submit_error(error: impl Into<String>) -> Self {
        Self {
            submit_error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn with_counts(mut self, errors: u64, warnings: u64) -> Self {
        self.errors = errors;
        self.warnings = warnings;
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }
}

#[derive(Debug, Default)]
struct MockState {
    scripts: HashMap<String, MockFeedScript>,
    pending: HashMap<String, VecDeque<Result<u64, String>>>,
    last: HashMap<String, Result<u64, String>>,
    jobs: HashMap<JobId, String>,
    submitted: Vec<FeedSubmission>,
    polls: HashMap<String, u32>,
}

/// Integration client that replays scripts instead of calling a server.
///
/// Feeds without a script are accepted and report all of their records
/// completed on the first status check.
#[derive(Debug, Clone, Default)]
pub struct MockIntegrationClient {
    state: Arc<RwLock<MockState>>,
}

impl MockIntegrationClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the script for the feed whose file name is `feed`.
    pub async fn script(&self, feed: &str, script: MockFeedScript) {
        let mut state = self.state.write().await;
        state
            .pending
            .insert(feed.to_string(), script.completed.iter().cloned().collect());
        state.scripts.insert(feed.to_string(), script);
    }

    /// Every submission received, in arrival order.
    pub async fn submitted(&self) -> Vec<FeedSubmission> {
        self.state.read().await.submitted.clone()
    }

    /// Number of `poll_completed` calls made for a feed.
    pub async fn poll_count(&self, feed: &str) -> u32 {
        self.state.read().await.polls.get(feed).copied().unwrap_or(0)
    }

    async fn feed_for(&self, job_id: &JobId) -> Result<String, IntegrationError> {
        self.state
            .read()
            .await
            .jobs
            .get(job_id)
            .cloned()
            .ok_or_else(|| IntegrationError::Rejected(format!("unknown job {job_id}")))
    }

    async fn script_for(&self, job_id: &JobId) -> Result<MockFeedScript, IntegrationError> {
        let feed = self.feed_for(job_id).await?;
        Ok(self
            .state
            .read()
            .await
            .scripts
            .get(&feed)
            .cloned()
            .unwrap_or_default())
    }
}

fn feed_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

#[async_trait]
impl IntegrationClient for MockIntegrationClient {
    async fn submit(
        &self,
        _server: &ServerOptions,
        feed: &FeedSubmission,
    ) -> Result<JobId, IntegrationError> {
        let name = feed_name(&feed.path);
        let record_count = record_counter::count_records(feed.format, &feed.path)
            .await
            .unwrap_or(0);
        let mut state = self.state.write().await;
        state.submitted.push(feed.clone());

        if let Some(error) = state.scripts.get(&name).and_then(|s| s.submit_error.clone()) {
            return Err(IntegrationError::Transport(error));
        }

        // Unscripted feeds report every record completed on the first check.
        if !state.scripts.contains_key(&name) {
            state.last.insert(name.clone(), Ok(record_count));
        }

        let job_id = JobId::new(format!("job-{name}"))
            .ok_or_else(|| IntegrationError::MalformedResponse("empty job id".to_string()))?;
        state.jobs.insert(job_id.clone(), name);
        Ok(job_id)
    }

    async fn poll_completed(
        &self,
        _server: &ServerOptions,
        job_id: &JobId,
    ) -> Result<u64, IntegrationError> {
        let feed = self.feed_for(job_id).await?;
        let mut state = self.state.write().await;
        *state.polls.entry(feed.clone()).or_insert(0) += 1;

        let next = match state.pending.get_mut(&feed).and_then(VecDeque::pop_front) {
            Some(next) => next,
            None => state
                .last
                .get(&feed)
                .cloned()
                .unwrap_or_else(|| Err("no status scripted".to_string())),
        };
        state.last.insert(feed, next.clone());
        next.map_err(IntegrationError::Transport)
    }

    async fn poll_errors(
        &self,
        _server: &ServerOptions,
        job_id: &JobId,
    ) -> Result<u64, IntegrationError> {
        Ok(self.script_for(job_id).await?.errors)
    }

    async fn poll_warnings(
        &self,
        _server: &ServerOptions,
        job_id: &JobId,
    ) -> Result<u64, IntegrationError> {
        Ok(self.script_for(job_id).await?.warnings)
    }

    async fn poll_summary(
        &self,
        _server: &ServerOptions,
        job_id: &JobId,
    ) -> Result<String, IntegrationError> {
        Ok(self.script_for(job_id).await?.summary)
    }
}

/// A notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Notifier that keeps every message instead of delivering it.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<RwLock<Vec<SentNotification>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose deliveries always fail.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub async fn sent(&self) -> Vec<SentNotification> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::DeliveryFailed("mock delivery failure".to_string()));
        }
        self.sent.write().await.push(SentNotification {
            recipients: recipients.to_vec(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// An archive request captured by [`RecordingArchiver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRequest {
    pub archive: PathBuf,
    pub paths: Vec<PathBuf>,
    pub append: bool,
}

/// Archiver that records requests and writes nothing.
#[derive(Debug, Clone, Default)]
pub struct RecordingArchiver {
    requests: Arc<RwLock<Vec<ArchiveRequest>>>,
    fail: bool,
}

impl RecordingArchiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// An archiver whose writes always fail.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub async fn requests(&self) -> Vec<ArchiveRequest> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl Archiver for RecordingArchiver {
    async fn create_archive(
        &self,
        archive: &Path,
        paths: &[PathBuf],
        append: bool,
    ) -> Result<(), ArchiveError> {
        if self.fail {
            return Err(ArchiveError::Write("mock archive failure".to_string()));
        }
        self.requests.write().await.push(ArchiveRequest {
            archive: archive.to_path_buf(),
            paths: paths.to_vec(),
            append,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{IntegrationFormat, Operation, RecordType};

    fn submission(path: &str) -> FeedSubmission {
        FeedSubmission {
            path: PathBuf::from(path),
            format: IntegrationFormat::FlatFile,
            record_type: RecordType::Person,
            operation: Operation::Store,
        }
    }

    #[tokio::test]
    async fn test_script_replays_then_repeats_last() {
        let client = MockIntegrationClient::new();
        client
            .script("a.txt", MockFeedScript::completing(vec![Ok(1), Ok(2)]))
            .await;
        let server = ServerOptions::default();
        let job = client.submit(&server, &submission("/x/a.txt")).await.unwrap();

        assert_eq!(client.poll_completed(&server, &job).await.unwrap(), 1);
        assert_eq!(client.poll_completed(&server, &job).await.unwrap(), 2);
        assert_eq!(client.poll_completed(&server, &job).await.unwrap(), 2);
        assert_eq!(client.poll_count("a.txt").await, 3);
    }

    #[tokio::test]
    async fn test_unknown_job_is_rejected() {
        let client = MockIntegrationClient::new();
        let result = client
            .poll_completed(&ServerOptions::default(), &JobId::new("nope").unwrap())
            .await;
        assert!(matches!(result, Err(IntegrationError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_recording_notifier_keeps_messages() {
        let notifier = RecordingNotifier::new();
        notifier
            .send(&["ops@example.edu".to_string()], "subject", "body")
            .await
            .unwrap();
        let sent = notifier.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "subject");
    }
}
