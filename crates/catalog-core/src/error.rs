//! Error types for catalog-core

use std::time::Duration;

use catalog_meta::interval::format_duration;

/// Result type for catalog-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running sources.
///
/// The `Display` text of whatever ends a run is what operators see as the
/// source's `lastError`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source could not be observed at all during this run
    #[error("source unavailable: {message}")]
    SourceUnavailable { source_id: String, message: String },

    /// The run exceeded its per-run timeout
    #[error("timed out after {}", format_duration(*.timeout))]
    Timeout { timeout: Duration },

    /// The run was abandoned because the scheduler stopped
    #[error("shutdown")]
    Shutdown,

    /// A run for this source is already in flight
    #[error("a run for source '{source_id}' is already in progress")]
    AlreadyRunning { source_id: String },

    /// No source with this id is configured
    #[error("Unknown source: {id}")]
    UnknownSource { id: String },

    /// Persisting a component failed
    #[error("registry error: {message}")]
    Registry { message: String },

    /// A blocking task panicked or was cancelled
    #[error("background task failed: {message}")]
    Task { message: String },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from catalog-fs
    #[error(transparent)]
    Fs(#[from] catalog_fs::Error),

    /// Configuration error from catalog-meta
    #[error(transparent)]
    Meta(#[from] catalog_meta::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn unavailable(source_id: &str, message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            source_id: source_id.to_string(),
            message: message.into(),
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task {
            message: err.to_string(),
        }
    }
}
