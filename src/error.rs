//! Error handling module for debsteward
//!
//! Provides centralized error handling with proper error types using thiserror.
//! All errors in the library should use these types for consistency.

use thiserror::Error;

/// Main error type for debsteward
#[derive(Error, Debug)]
pub enum StewardError {
    /// IO errors (file operations, process spawning, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors (loading, parsing, validation)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Precondition failures (wrong distro/release, not root, missing binary)
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Every fallback strategy for a resource failed
    #[error("All acquisition strategies failed for {identifier}")]
    AcquisitionExhausted { identifier: String },

    /// Snapshot verification failed (expected path missing under snapshot)
    #[error("Snapshot incomplete: {0}")]
    SnapshotIncomplete(String),

    /// A mutating system command exited non-zero
    #[error("Mutation failed: {0}")]
    MutationFailed(String),

    /// JSON serialization/deserialization errors (snapshot manifests)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for steward operations
pub type Result<T> = std::result::Result<T, StewardError>;

// Convenient error constructors
impl StewardError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a precondition error
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Create an exhausted-acquisition error naming the resource
    pub fn exhausted(identifier: impl Into<String>) -> Self {
        Self::AcquisitionExhausted {
            identifier: identifier.into(),
        }
    }

    /// Create a snapshot-incomplete error
    pub fn snapshot_incomplete(msg: impl Into<String>) -> Self {
        Self::SnapshotIncomplete(msg.into())
    }

    /// Create a mutation error
    pub fn mutation(msg: impl Into<String>) -> Self {
        Self::MutationFailed(msg.into())
    }
}
