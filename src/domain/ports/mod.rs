//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that adapters must implement:
//! - IntegrationClient: submit feeds and poll remote job status
//! - Notifier: deliver the run report
//! - Archiver: bundle logs and feed files
//!
//! These traits keep the feed lifecycle independent of the remote protocol,
//! mail transport and archive format.

pub mod archiver;
pub mod errors;
pub mod integration_client;
pub mod notifier;

pub use archiver::Archiver;
pub use errors::{ArchiveError, IntegrationError, NotifyError};
pub use integration_client::{FeedSubmission, IntegrationClient};
pub use notifier::Notifier;
