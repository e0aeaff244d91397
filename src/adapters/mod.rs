//! Adapters for the external systems a run talks to.

pub mod archive;
pub mod integration;
pub mod mock;
pub mod notify;

pub use archive::ZipArchiver;
pub use integration::CommandIntegrationClient;
pub use notify::SendmailNotifier;
