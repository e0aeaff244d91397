pub mod config;
pub mod feed;
pub mod feed_job;
pub mod retention;
pub mod run;

pub use config::{
    ArchiveConfig, ClientConfig, Config, FeedSource, LoggingConfig, NotificationConfig,
    PollingConfig, ServerOptions,
};
pub use feed::{IntegrationFormat, Operation, RecordType};
pub use feed_job::{FeedJob, FeedJobState, JobId, PollOutcome};
pub use retention::{is_expired, RetentionWindow};
pub use run::{CleanupSummary, RunResult};
