//! Catalog facade
//!
//! Wires a loaded [`CatalogConfig`] to a registry, a status tracker and an
//! engine, and exposes the read surface operators use.

use std::sync::Arc;

use catalog_meta::{CatalogConfig, SourceConfig};
use tokio::sync::broadcast;

use crate::Result;
use crate::engine::{RunReport, SyncEngine};
use crate::registry::{Component, ComponentRegistry, FileRegistry, MemoryRegistry};
use crate::scheduler::Scheduler;
use crate::status::{SourceStatus, StatusEvent, StatusTracker, load_snapshot};

/// A configured catalog: sources, their status, and the registry they feed.
pub struct Catalog {
    config: CatalogConfig,
    engine: Arc<SyncEngine>,
}

impl Catalog {
    /// Open the catalog persisted under the configured data directory.
    ///
    /// Registry contents and the bookkeeping of known sources carry over
    /// from earlier processes.
    pub fn open(config: CatalogConfig) -> Result<Self> {
        let registry = FileRegistry::open(config.engine.registry_path())?;

        let status_path = config.engine.status_path();
        let previous = load_snapshot(&status_path)?;
        let tracker = StatusTracker::new(config.sources.iter().map(|s| s.id.clone()))
            .with_persistence(status_path);
        tracker.restore(previous);

        tracing::info!(
            data_dir = %config.engine.data_dir,
            sources = config.sources.len(),
            "opened catalog"
        );
        Ok(Self::assemble(config, Arc::new(registry), Arc::new(tracker)))
    }

    /// A catalog that keeps nothing on disk apart from git checkouts.
    pub fn in_memory(config: CatalogConfig) -> Self {
        let tracker = StatusTracker::new(config.sources.iter().map(|s| s.id.clone()));
        Self::assemble(config, Arc::new(MemoryRegistry::new()), Arc::new(tracker))
    }

    fn assemble(
        config: CatalogConfig,
        registry: Arc<dyn ComponentRegistry>,
        tracker: Arc<StatusTracker>,
    ) -> Self {
        let engine = Arc::new(SyncEngine::from_config(&config, registry, tracker));
        Self { config, engine }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Configured sources, in configuration order.
    pub fn sources(&self) -> &[SourceConfig] {
        &self.config.sources
    }

    pub fn status(&self, source_id: &str) -> Option<SourceStatus> {
        self.engine.tracker().get(source_id)
    }

    /// Status of every source, ordered by source id.
    pub fn statuses(&self) -> Vec<SourceStatus> {
        self.engine.tracker().all()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.engine.tracker().subscribe()
    }

    pub async fn components(&self) -> Result<Vec<Component>> {
        self.engine.registry().list().await
    }

    pub async fn component(&self, key: &str) -> Result<Option<Component>> {
        self.engine.registry().get(key).await
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    /// A stopped scheduler over this catalog's engine.
    pub fn scheduler(&self) -> Scheduler {
        Scheduler::new(Arc::clone(&self.engine))
    }

    /// Run every source once.
    pub async fn run_once(&self) -> Vec<RunReport> {
        self.engine.run_all_once().await
    }

    /// Run one source once.
    pub async fn run_source(&self, source_id: &str) -> Result<RunReport> {
        self.engine.run_source(source_id).await
    }
}
