//! Error types for the core library.

use thiserror::Error;

use crate::backend::BackendError;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Fetching a snapshot from the backend failed.
    #[error("Snapshot fetch failed: {0}")]
    SnapshotFetch(#[source] BackendError),

    /// A record arrived without a usable id.
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// A mutating backend call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
