use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::domain::models::LoggingConfig;
use crate::services::retention_sweeper::ARTIFACT_TIMESTAMP_FORMAT;

/// Logger implementation using tracing
///
/// Every run writes its own JSON log file named after the run start time.
/// Lines from concurrently polling jobs go through one non-blocking writer.
pub struct LoggerImpl {
    log_path: PathBuf,
    _guard: WorkerGuard,
}

impl LoggerImpl {
    /// Initialize the global subscriber for a run starting at `started_at`
    ///
    /// # Returns
    /// * `Result<Self>` - Logger instance with guard to keep the file writer alive
    ///
    /// # Errors
    /// Returns an error for an invalid level, an unwritable log directory, or
    /// when a global subscriber is already installed
    pub fn init(config: &LoggingConfig, started_at: DateTime<Utc>) -> Result<Self> {
        let default_level = parse_log_level(&config.level)?;

        std::fs::create_dir_all(&config.dir).with_context(|| {
            format!("Failed to create log directory {}", config.dir.display())
        })?;

        let file_name = log_file_name(started_at);
        let log_path = config.dir.join(&file_name);
        let (non_blocking_file, guard) =
            tracing_appender::non_blocking(rolling::never(&config.dir, &file_name));

        // File layer - always JSON for structured logging
        let file_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(non_blocking_file)
            .with_ansi(false)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(env_filter(default_level));

        let registry = tracing_subscriber::registry().with(file_layer);

        let installed = if !config.enable_stdout {
            registry.try_init()
        } else if config.format == "pretty" {
            let stdout_layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(io::stdout)
                .with_target(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_filter(env_filter(default_level));
            registry.with(stdout_layer).try_init()
        } else {
            let stdout_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(io::stdout)
                .with_current_span(true)
                .with_target(true)
                .with_filter(env_filter(default_level));
            registry.with(stdout_layer).try_init()
        };
        installed.context("Failed to install tracing subscriber")?;

        tracing::info!(
            level = %config.level,
            format = %config.format,
            log_file = %log_path.display(),
            "logger initialized"
        );

        Ok(Self {
            log_path,
            _guard: guard,
        })
    }

    /// Path of this run's log file
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

/// `feedrunner_YYYYmmdd_HHMMSS.log` for a run started at `started_at`.
pub fn log_file_name(started_at: DateTime<Utc>) -> String {
    format!("feedrunner_{}.log", started_at.format(ARTIFACT_TIMESTAMP_FORMAT))
}

/// `RUST_LOG` wins over the configured level.
fn env_filter(default_level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy()
}

/// Parse log level string to Level
fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!("Invalid log level: {level}"),
    }
}
