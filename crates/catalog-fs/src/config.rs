//! Format-agnostic configuration loading

use crate::{Error, NormalizedPath, Result, io};
use serde::de::DeserializeOwned;

/// Format-agnostic configuration store.
///
/// Detects the format from the file extension and deserializes
/// transparently. Used to load the source configuration.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigStore;

impl ConfigStore {
    pub fn new() -> Self {
        Self
    }

    /// Load a document from a file.
    ///
    /// Format is detected from file extension:
    /// - `.toml` -> TOML
    /// - `.json` -> JSON
    /// - `.yaml`, `.yml` -> YAML
    pub fn load<T: DeserializeOwned>(&self, path: &NormalizedPath) -> Result<T> {
        let content = io::read_text(path)?;
        self.parse(path, &content)
    }

    /// Parse already-loaded text as if it came from `path`.
    pub fn parse<T: DeserializeOwned>(&self, path: &NormalizedPath, content: &str) -> Result<T> {
        let extension = path.extension().unwrap_or("");

        match extension.to_lowercase().as_str() {
            "toml" => toml::from_str(content).map_err(|e| Error::ConfigParse {
                path: path.to_native(),
                format: "TOML".into(),
                message: e.to_string(),
            }),
            "json" => serde_json::from_str(content).map_err(|e| Error::ConfigParse {
                path: path.to_native(),
                format: "JSON".into(),
                message: e.to_string(),
            }),
            "yaml" | "yml" => serde_yaml::from_str(content).map_err(|e| Error::ConfigParse {
                path: path.to_native(),
                format: "YAML".into(),
                message: e.to_string(),
            }),
            _ => Err(Error::UnsupportedFormat {
                extension: extension.to_string(),
            }),
        }
    }
}
