//! Feed lifecycle services: counting, polling, per-feed orchestration,
//! run control, retention and reporting.

pub mod convergence_poller;
pub mod feed_job_runner;
pub mod record_counter;
pub mod report;
pub mod retention_sweeper;
pub mod run_controller;

pub use convergence_poller::{ConvergencePoller, PollReport, PollerConfig};
pub use feed_job_runner::FeedJobRunner;
pub use report::{ReportAggregator, ReportTotals, RunReport};
pub use retention_sweeper::RetentionSweeper;
pub use run_controller::RunController;
