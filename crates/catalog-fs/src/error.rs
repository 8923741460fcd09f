//! Error types for catalog-fs

use std::path::PathBuf;

/// Result type for catalog-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in catalog-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} config at {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Unsupported config format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },

    #[error("Invalid relative path '{path}': {reason}")]
    InvalidRelativePath { path: String, reason: String },

    #[error("File too large: {path} is {size} bytes (max {max})")]
    FileTooLarge { path: PathBuf, size: u64, max: u64 },

    #[error("Failed to walk {path}: {message}")]
    Walk { path: PathBuf, message: String },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
