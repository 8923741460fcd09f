//! SyncEngine implementation
//!
//! The engine owns everything needed to run a source once: its adapter, its
//! discoverer cache, the shared registry and the status tracker. Scheduling
//! is layered on top by [`Scheduler`](crate::Scheduler).

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use catalog_meta::{CatalogConfig, EngineSettings, ManifestError, SourceConfig};
use serde::Serialize;
use tokio::task::JoinSet;

use crate::discovery::ManifestDiscoverer;
use crate::reconcile::{ReconcileReport, Reconciler};
use crate::registry::ComponentRegistry;
use crate::source::{SourceAdapter, build_adapter};
use crate::status::{Completion, RunTicket, SourceState, StatusTracker};
use crate::{Error, Result};

/// Report of one source run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub source_id: String,
    /// `completed` or `failed`
    pub status: SourceState,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub components_count: usize,
    pub failed: Vec<ManifestError>,
    /// Whatever ended up in `lastError`
    pub error: Option<String>,
    pub revision: Option<String>,
    pub duration_ms: u64,
}

impl RunReport {
    fn completed(source_id: &str, reconcile: ReconcileReport, revision: Option<String>, elapsed: Duration) -> Self {
        Self {
            source_id: source_id.to_string(),
            status: SourceState::Completed,
            created: reconcile.created,
            updated: reconcile.updated,
            unchanged: reconcile.unchanged,
            components_count: reconcile.components_count(),
            error: reconcile.failure_summary(),
            failed: reconcile.failed,
            revision,
            duration_ms: elapsed.as_millis() as u64,
        }
    }

    fn failed(source_id: &str, error: String, elapsed: Duration) -> Self {
        Self {
            source_id: source_id.to_string(),
            status: SourceState::Failed,
            created: 0,
            updated: 0,
            unchanged: 0,
            components_count: 0,
            failed: Vec::new(),
            error: Some(error),
            revision: None,
            duration_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SourceState::Completed
    }
}

/// Everything the engine keeps per source.
struct SourceRuntime {
    config: SourceConfig,
    adapter: Arc<dyn SourceAdapter>,
    discoverer: ManifestDiscoverer,
    timeout: Duration,
}

/// Marks the run failed with "shutdown" if it is dropped before finishing.
struct RunGuard {
    tracker: Arc<StatusTracker>,
    ticket: Option<RunTicket>,
}

impl RunGuard {
    fn take(&mut self) -> Option<RunTicket> {
        self.ticket.take()
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            tracing::warn!(source_id = %ticket.source_id(), "run abandoned");
            self.tracker.fail(ticket, Error::Shutdown.to_string());
        }
    }
}

/// Runs sources: snapshot, discover, reconcile, record.
pub struct SyncEngine {
    settings: EngineSettings,
    sources: BTreeMap<String, SourceRuntime>,
    reconciler: Reconciler,
    registry: Arc<dyn ComponentRegistry>,
    tracker: Arc<StatusTracker>,
}

impl SyncEngine {
    /// An engine with no sources. Add them with [`add_source`](Self::add_source).
    pub fn new(
        settings: EngineSettings,
        registry: Arc<dyn ComponentRegistry>,
        tracker: Arc<StatusTracker>,
    ) -> Self {
        Self {
            settings,
            sources: BTreeMap::new(),
            reconciler: Reconciler::new(Arc::clone(&registry)),
            registry,
            tracker,
        }
    }

    /// An engine with the built-in adapter for every configured source.
    pub fn from_config(
        config: &CatalogConfig,
        registry: Arc<dyn ComponentRegistry>,
        tracker: Arc<StatusTracker>,
    ) -> Self {
        let mut engine = Self::new(config.engine.clone(), registry, tracker);
        for source in &config.sources {
            let adapter = build_adapter(source, &config.engine);
            engine.add_source(source.clone(), adapter);
        }
        engine
    }

    /// Register a source with an explicit adapter, replacing any source with
    /// the same id.
    pub fn add_source(&mut self, config: SourceConfig, adapter: Arc<dyn SourceAdapter>) {
        self.tracker.register(&config.id);
        let timeout = self
            .settings
            .run_timeout_for(config.interval.as_duration());
        self.sources.insert(
            config.id.clone(),
            SourceRuntime {
                config,
                adapter,
                discoverer: ManifestDiscoverer::new(),
                timeout,
            },
        );
    }

    pub fn sources(&self) -> impl Iterator<Item = &SourceConfig> {
        self.sources.values().map(|s| &s.config)
    }

    pub fn source(&self, id: &str) -> Option<&SourceConfig> {
        self.sources.get(id).map(|s| &s.config)
    }

    pub fn registry(&self) -> &Arc<dyn ComponentRegistry> {
        &self.registry
    }

    pub fn tracker(&self) -> &Arc<StatusTracker> {
        &self.tracker
    }

    /// Run one source once and record the outcome.
    ///
    /// Fails without running when the source is unknown or already running.
    /// Every other failure is recorded on the source's status and reported as
    /// a failed [`RunReport`].
    pub async fn run_source(&self, source_id: &str) -> Result<RunReport> {
        let runtime = self
            .sources
            .get(source_id)
            .ok_or_else(|| Error::UnknownSource {
                id: source_id.to_string(),
            })?;
        let ticket = self
            .tracker
            .try_begin(source_id)
            .ok_or_else(|| Error::AlreadyRunning {
                source_id: source_id.to_string(),
            })?;
        let mut guard = RunGuard {
            tracker: Arc::clone(&self.tracker),
            ticket: Some(ticket),
        };

        tracing::info!(source_id, "source run started");
        let outcome = tokio::time::timeout(runtime.timeout, self.execute(runtime)).await;

        let Some(ticket) = guard.take() else {
            return Err(Error::Shutdown);
        };
        let elapsed = ticket.elapsed();

        let result = match outcome {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout {
                timeout: runtime.timeout,
            }),
        };

        let report = match result {
            Ok((reconcile, revision)) => {
                let report = RunReport::completed(source_id, reconcile, revision.clone(), elapsed);
                self.tracker.complete(
                    ticket,
                    Completion {
                        components_count: report.components_count,
                        last_error: report.error.clone(),
                        revision,
                    },
                );
                tracing::info!(
                    source_id,
                    created = report.created,
                    updated = report.updated,
                    unchanged = report.unchanged,
                    failed = report.failed.len(),
                    duration_ms = report.duration_ms,
                    "source run completed"
                );
                report
            }
            Err(e) => {
                let message = e.to_string();
                self.tracker.fail(ticket, message.clone());
                tracing::warn!(
                    source_id,
                    error = %message,
                    duration_ms = elapsed.as_millis() as u64,
                    "source run failed"
                );
                RunReport::failed(source_id, message, elapsed)
            }
        };
        self.tracker.persist().await;
        Ok(report)
    }

    async fn execute(&self, runtime: &SourceRuntime) -> Result<(ReconcileReport, Option<String>)> {
        let snapshot = runtime.adapter.snapshot().await?;
        let discovery = runtime.discoverer.discover(&snapshot);
        let report = self
            .reconciler
            .reconcile(&runtime.config.id, discovery)
            .await?;
        Ok((report, snapshot.revision))
    }

    /// Run every source once, concurrently, and collect the reports in
    /// source-id order.
    pub async fn run_all_once(self: &Arc<Self>) -> Vec<RunReport> {
        let mut set = JoinSet::new();
        for id in self.sources.keys().cloned() {
            let engine = Arc::clone(self);
            set.spawn(async move {
                let result = engine.run_source(&id).await;
                (id, result)
            });
        }

        let mut reports = Vec::with_capacity(self.sources.len());
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((_, Ok(report))) => reports.push(report),
                Ok((id, Err(e))) => reports.push(RunReport::failed(&id, e.to_string(), Duration::ZERO)),
                Err(e) => tracing::error!(error = %e, "source run task panicked"),
            }
        }
        reports.sort_by(|a, b| a.source_id.cmp(&b.source_id));
        reports
    }
}
