//! Registry reconciliation
//!
//! Applies one run's parsed manifests to the registry in discovery order.
//! Each upsert is atomic on its own; there is no transaction spanning the
//! run, so a registry failure leaves earlier upserts committed.

use std::collections::BTreeSet;
use std::sync::Arc;

use catalog_meta::ManifestError;
use serde::Serialize;

use crate::discovery::DiscoveryReport;
use crate::registry::{ComponentFields, ComponentRegistry, UpsertOutcome};
use crate::Result;

/// Outcome of reconciling one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: Vec<ManifestError>,
    /// Distinct component keys upserted by this run
    #[serde(skip)]
    pub keys: BTreeSet<String>,
}

impl ReconcileReport {
    /// The run's `componentsCount`.
    pub fn components_count(&self) -> usize {
        self.keys.len()
    }

    /// `lastError` text for a run with manifest failures.
    pub fn failure_summary(&self) -> Option<String> {
        let first = self.failed.first()?;
        Some(format!(
            "{} manifest(s) failed to parse: {}: {}",
            self.failed.len(),
            first.path,
            first.reason
        ))
    }
}

/// Writes parsed manifests into a registry.
#[derive(Clone)]
pub struct Reconciler {
    registry: Arc<dyn ComponentRegistry>,
}

impl Reconciler {
    pub fn new(registry: Arc<dyn ComponentRegistry>) -> Self {
        Self { registry }
    }

    pub async fn reconcile(
        &self,
        source_id: &str,
        discovery: DiscoveryReport,
    ) -> Result<ReconcileReport> {
        let mut report = ReconcileReport {
            failed: discovery.failures,
            ..Default::default()
        };

        for (path, manifest) in discovery.manifests {
            let key = manifest.component_key().to_string();
            let outcome = self
                .registry
                .upsert(&key, ComponentFields::from(&manifest), source_id)
                .await?;

            tracing::debug!(
                source_id,
                component_key = %key,
                path = %path,
                outcome = ?outcome,
                "reconciled component"
            );
            match outcome {
                UpsertOutcome::Created => report.created += 1,
                UpsertOutcome::Updated => report.updated += 1,
                UpsertOutcome::Unchanged => report.unchanged += 1,
            }
            report.keys.insert(key);
        }

        Ok(report)
    }
}
