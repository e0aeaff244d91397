//! Domain layer for the feed runner
//!
//! This module contains the feed lifecycle models and the collaborator ports.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{DomainError, DomainResult, FatalRunError, FeedValidationError};
