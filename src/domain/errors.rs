//! Domain errors for the feed runner.

use serde::Serialize;
use thiserror::Error;

use super::models::feed_job::FeedJobState;

/// Domain-level errors raised by the feed lifecycle.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid state transition for feed {feed} from {from} to {to}")]
    InvalidStateTransition {
        feed: String,
        from: FeedJobState,
        to: FeedJobState,
    },

    #[error("Expected record count for feed {0} is already set")]
    ExpectedCountAlreadySet(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

/// Why a feed's record type or operation was rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedValidationError {
    #[error("Unknown record type '{0}'")]
    UnknownRecordType(String),

    #[error("Record type '{record_type}' is not supported by the {format} format")]
    UnsupportedRecordType { format: String, record_type: String },

    #[error("Unknown operation '{0}'")]
    UnknownOperation(String),

    #[error("Operation '{operation}' is not supported by the {format} format")]
    UnsupportedOperation { format: String, operation: String },
}

/// Run-level errors that stop a run before any feed is touched.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
pub enum FatalRunError {
    #[error("Invalid integration format '{0}'. Must be one of: flat_file, xml")]
    InvalidIntegrationFormat(String),
}
