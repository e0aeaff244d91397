//! Report delivery adapters.

pub mod sendmail;

pub use sendmail::SendmailNotifier;
