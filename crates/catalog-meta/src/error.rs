//! Error types for catalog-meta

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Configuration errors. All of them are fatal at load time.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Filesystem error: {0}")]
    Fs(#[from] catalog_fs::Error),

    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid configuration at {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    #[error("sources[{index}]: missing source type")]
    MissingSourceType { index: usize },

    #[error("sources[{index}]: unknown source type '{type_name}' (expected filesystem or git)")]
    UnknownSourceType { index: usize, type_name: String },

    #[error("sources[{index}]: missing required field '{field}' for type {kind}")]
    MissingField {
        index: usize,
        field: &'static str,
        kind: &'static str,
    },

    #[error("sources[{index}]: field '{field}' is not valid for type {kind}")]
    ForeignField {
        index: usize,
        field: &'static str,
        kind: &'static str,
    },

    #[error("sources[{index}]: invalid basePath '{path}': {reason}")]
    InvalidBasePath {
        index: usize,
        path: String,
        reason: String,
    },

    #[error("sources[{index}]: field '{field}' must not be empty")]
    EmptyField { index: usize, field: &'static str },

    #[error("Duplicate source id '{id}' (sources[{first}] and sources[{second}])")]
    DuplicateSourceId {
        id: String,
        first: usize,
        second: usize,
    },

    #[error("Invalid interval '{value}': {reason}")]
    InvalidInterval { value: String, reason: String },

    #[error("sources[{index}]: {source}")]
    SourceInterval {
        index: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("Invalid engine setting '{field}': {message}")]
    InvalidEngineSetting {
        field: &'static str,
        message: String,
    },
}
