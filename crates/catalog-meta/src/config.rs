//! Catalog configuration loading
//!
//! The file is either a bare list of sources or a mapping with an optional
//! `engine` section and a `sources` list. YAML, JSON and TOML are accepted,
//! chosen by extension.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use catalog_fs::{ConfigStore, NormalizedPath};
use serde::Deserialize;

use crate::interval::Interval;
use crate::source::{RawSourceEntry, SourceConfig};
use crate::{Error, Result};

/// Directory (relative to the config file) holding registry, status and
/// checkouts when `engine.dataDir` is not set.
pub const DEFAULT_DATA_DIR: &str = ".catalog";

/// Fraction of a source's interval a single run may take.
pub const DEFAULT_RUN_TIMEOUT_RATIO: f64 = 0.8;

/// Engine-wide settings.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Root for `registry.json`, `status.json` and `checkouts/`
    pub data_dir: NormalizedPath,

    /// Per-run timeout as a fraction of the source interval, in (0, 1]
    pub run_timeout_ratio: f64,

    /// Fixed per-run timeout that overrides the ratio for every source
    pub run_timeout: Option<Duration>,
}

impl EngineSettings {
    /// Settings with defaults, storing data under `data_dir`.
    pub fn new(data_dir: NormalizedPath) -> Self {
        Self {
            data_dir,
            run_timeout_ratio: DEFAULT_RUN_TIMEOUT_RATIO,
            run_timeout: None,
        }
    }

    /// Timeout for one run of a source with the given interval.
    pub fn run_timeout_for(&self, interval: Duration) -> Duration {
        self.run_timeout
            .unwrap_or_else(|| interval.mul_f64(self.run_timeout_ratio))
    }

    pub fn registry_path(&self) -> NormalizedPath {
        self.data_dir.join("registry.json")
    }

    pub fn status_path(&self) -> NormalizedPath {
        self.data_dir.join("status.json")
    }

    pub fn checkouts_dir(&self) -> NormalizedPath {
        self.data_dir.join("checkouts")
    }
}

/// Fully validated catalog configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogConfig {
    pub engine: EngineSettings,
    pub sources: Vec<SourceConfig>,
}

impl CatalogConfig {
    pub fn source(&self, id: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.id == id)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDocument {
    List(Vec<RawSourceEntry>),
    Full(RawCatalog),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCatalog {
    #[serde(default)]
    engine: RawEngine,
    #[serde(default)]
    sources: Vec<RawSourceEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEngine {
    data_dir: Option<String>,
    run_timeout_ratio: Option<f64>,
    run_timeout: Option<String>,
}

/// Load and validate the configuration file at `path`.
///
/// Relative `dataDir` and filesystem `path` values are resolved against the
/// directory containing the file.
pub fn load_config(path: &Path) -> Result<CatalogConfig> {
    if !path.is_file() {
        return Err(Error::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }

    let document: RawDocument = ConfigStore::new().load(&NormalizedPath::new(path))?;
    let config_dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let config = from_document(document, config_dir)?;

    tracing::debug!(
        path = %path.display(),
        sources = config.sources.len(),
        data_dir = %config.engine.data_dir,
        "loaded catalog configuration"
    );
    Ok(config)
}

/// Parse configuration text directly. `path` selects the format and is used
/// as the base for relative paths.
pub fn parse_config(path: &Path, content: &str) -> Result<CatalogConfig> {
    let document: RawDocument = ConfigStore::new().parse(&NormalizedPath::new(path), content)?;
    from_document(document, path.parent().filter(|p| !p.as_os_str().is_empty()))
}

fn from_document(document: RawDocument, config_dir: Option<&Path>) -> Result<CatalogConfig> {
    let (raw_engine, raw_sources) = match document {
        RawDocument::List(sources) => (RawEngine::default(), sources),
        RawDocument::Full(catalog) => (catalog.engine, catalog.sources),
    };

    let engine = engine_settings(raw_engine, config_dir)?;

    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut sources = Vec::with_capacity(raw_sources.len());
    for (index, raw) in raw_sources.into_iter().enumerate() {
        let source = SourceConfig::from_raw(index, raw, config_dir)?;
        if let Some(&first) = seen.get(&source.id) {
            return Err(Error::DuplicateSourceId {
                id: source.id,
                first,
                second: index,
            });
        }
        seen.insert(source.id.clone(), index);
        sources.push(source);
    }

    Ok(CatalogConfig { engine, sources })
}

fn engine_settings(raw: RawEngine, config_dir: Option<&Path>) -> Result<EngineSettings> {
    let data_dir_raw = raw.data_dir.as_deref().unwrap_or(DEFAULT_DATA_DIR);
    let data_dir = NormalizedPath::new(data_dir_raw);
    let data_dir = match config_dir {
        Some(dir) if !data_dir.is_absolute() => NormalizedPath::new(dir).join(data_dir.as_str()),
        _ => data_dir,
    };

    let run_timeout_ratio = raw.run_timeout_ratio.unwrap_or(DEFAULT_RUN_TIMEOUT_RATIO);
    if !(run_timeout_ratio > 0.0 && run_timeout_ratio <= 1.0) {
        return Err(Error::InvalidEngineSetting {
            field: "runTimeoutRatio",
            message: format!("{run_timeout_ratio} is outside (0, 1]"),
        });
    }

    let run_timeout = raw
        .run_timeout
        .as_deref()
        .map(|s| s.parse::<Interval>().map(Duration::from))
        .transpose()
        .map_err(|e| Error::InvalidEngineSetting {
            field: "runTimeout",
            message: e.to_string(),
        })?;

    Ok(EngineSettings {
        data_dir,
        run_timeout_ratio,
        run_timeout,
    })
}
