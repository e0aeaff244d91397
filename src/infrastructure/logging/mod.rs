//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - One JSON log file per run, written through a non-blocking appender
//! - Optional stdout mirror (json or pretty)

pub mod logger;

pub use logger::{log_file_name, LoggerImpl};
