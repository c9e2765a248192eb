//! Error types for state storage and store operations.

use thiserror::Error;

/// Errors that can occur while persisting, restoring or loading store state.
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O error in a file-backed storage
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Storage backend unavailable or rejected the operation
    #[error("Storage error: {0}")]
    Storage(String),

    /// Persisted snapshot was written by a newer version of the store
    #[error("Snapshot for '{key}' has version {found}, newer than supported version {supported}")]
    VersionTooNew {
        /// Storage key of the snapshot
        key: String,
        /// Version found in storage
        found: u32,
        /// Highest version this build understands
        supported: u32,
    },

    /// Report payload has no patient identifier
    #[error("Patient data is incomplete: missing patient ID")]
    MissingPatientId,
}

impl StoreError {
    /// Create a storage backend error with a message.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }
}
