//! Filesystem primitives for the component catalog
//!
//! Provides forward-slash normalized paths, atomic writes, format-agnostic
//! config loading and deterministic tree walking shared by every source
//! adapter and persistence layer.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod path;
pub mod walk;

pub use config::ConfigStore;
pub use error::{Error, Result};
pub use path::{NormalizedPath, validate_relative};
pub use walk::{WalkedFile, walk_files};
