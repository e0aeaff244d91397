use thiserror::Error;

/// Integration client errors
#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Notification delivery errors
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Archive packaging errors
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Archive write failed: {0}")]
    Write(String),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
