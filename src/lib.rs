//! Feedrunner - feed file lifecycle controller
//!
//! Submits configured feed files to a remote integration endpoint, polls each
//! remote job until its completed count converges or stalls, then archives
//! the run's files, applies retention to old logs and archives, and reports.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): feed jobs, run results, retention and the port traits
//! - **Service Layer** (`services`): polling, per-feed lifecycle, run control, reporting
//! - **Adapters** (`adapters`): external client program, sendmail, zip, test doubles
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use feedrunner::adapters::{CommandIntegrationClient, SendmailNotifier, ZipArchiver};
//! use feedrunner::{ConfigLoader, RunController};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load("feedrunner.yaml")?;
//!     let client = Arc::new(CommandIntegrationClient::new(&config.client));
//!     let notifier = Arc::new(SendmailNotifier::new(&config.notification));
//!     let controller = RunController::new(config, client, Arc::new(ZipArchiver::new()), notifier);
//!     let (result, report) = controller.run_and_notify().await;
//!     println!("{}", report.subject);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    Config, FeedJob, FeedJobState, FeedSource, IntegrationFormat, JobId, Operation, PollOutcome,
    RecordType, RetentionWindow, RunResult,
};
pub use domain::ports::{Archiver, IntegrationClient, Notifier};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{ConvergencePoller, ReportAggregator, RetentionSweeper, RunController};
