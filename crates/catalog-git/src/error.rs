//! Error types for catalog-git

use std::path::PathBuf;

/// Result type for catalog-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in catalog-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Filesystem error: {0}")]
    Fs(#[from] catalog_fs::Error),

    #[error("Branch '{name}' not found at {url}")]
    BranchNotFound { name: String, url: String },

    #[error("Remote {url} is unreachable: {message}")]
    RemoteUnreachable { url: String, message: String },

    #[error("Authentication failed for {url}: {message}")]
    AuthenticationFailed { url: String, message: String },

    #[error("Remote {url} does not advertise a default branch")]
    NoDefaultBranch { url: String },

    #[error("Working copy at {path} is unusable: {message}")]
    InvalidWorkingCopy { path: PathBuf, message: String },
}
