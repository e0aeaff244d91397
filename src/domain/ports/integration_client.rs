//! Integration client port - the remote system that ingests feed files.

use async_trait::async_trait;
use std::path::PathBuf;

use super::errors::IntegrationError;
use crate::domain::models::{IntegrationFormat, JobId, Operation, RecordType, ServerOptions};

/// A validated feed ready to be handed to the remote system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSubmission {
    pub path: PathBuf,
    pub format: IntegrationFormat,
    pub record_type: RecordType,
    pub operation: Operation,
}

/// Client for the remote integration endpoint.
///
/// The runner never speaks the wire protocol itself; every remote call goes
/// through this trait so it can be swapped for a scripted client in tests.
#[async_trait]
pub trait IntegrationClient: Send + Sync {
    /// Submit a feed file and return the job identifier assigned to it.
    async fn submit(
        &self,
        server: &ServerOptions,
        feed: &FeedSubmission,
    ) -> Result<JobId, IntegrationError>;

    /// Number of records the remote job has completed so far.
    async fn poll_completed(
        &self,
        server: &ServerOptions,
        job_id: &JobId,
    ) -> Result<u64, IntegrationError>;

    /// Number of records the remote job rejected.
    async fn poll_errors(
        &self,
        server: &ServerOptions,
        job_id: &JobId,
    ) -> Result<u64, IntegrationError>;

    /// Number of records the remote job accepted with warnings.
    async fn poll_warnings(
        &self,
        server: &ServerOptions,
        job_id: &JobId,
    ) -> Result<u64, IntegrationError>;

    /// Free-form status summary for the remote job.
    async fn poll_summary(
        &self,
        server: &ServerOptions,
        job_id: &JobId,
    ) -> Result<String, IntegrationError>;
}
