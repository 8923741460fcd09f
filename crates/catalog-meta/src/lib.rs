//! Source configuration and manifest model for the component catalog.
//!
//! This crate owns everything that is read from user-authored files: the
//! catalog configuration (engine settings plus the list of sources) and the
//! `manifest.yaml` files discovered inside those sources.

pub mod config;
pub mod error;
pub mod interval;
pub mod manifest;
pub mod source;

pub use config::{CatalogConfig, EngineSettings, load_config, parse_config};
pub use error::{Error, Result};
pub use interval::Interval;
pub use manifest::{Manifest, ManifestError, Owners, is_manifest_file, parse_manifest};
pub use source::{SourceConfig, SourceKind};
