//! Persistent component registry
//!
//! The registry is the only state shared between source runs. Every write
//! goes through [`ComponentRegistry::upsert`], which is atomic per key: two
//! concurrent upserts of the same key are applied one after the other and
//! the later one wins.

mod file;
mod memory;

pub use file::FileRegistry;
pub use memory::MemoryRegistry;

use std::collections::BTreeMap;

use async_trait::async_trait;
use catalog_meta::Manifest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;

/// A catalog component as stored in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    /// Reconciliation key (`id`, or `name` when the manifest has no id)
    pub key: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub maintainers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Last time a mutable field actually changed
    pub updated_at: DateTime<Utc>,
    /// Source whose write was applied last. Informational only.
    pub last_source: String,
}

/// The mutable part of a component, as observed in one manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentFields {
    pub name: String,
    pub description: Option<String>,
    pub maintainers: Vec<String>,
    pub team: Option<String>,
}

impl From<&Manifest> for ComponentFields {
    fn from(manifest: &Manifest) -> Self {
        Self {
            name: manifest.name.clone(),
            description: manifest.description.clone(),
            maintainers: manifest.owners.maintainers.clone(),
            team: manifest.owners.team.clone(),
        }
    }
}

impl Component {
    fn matches(&self, fields: &ComponentFields) -> bool {
        self.name == fields.name
            && self.description == fields.description
            && self.maintainers == fields.maintainers
            && self.team == fields.team
    }
}

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Created,
    Updated,
    Unchanged,
}

/// Storage for components, keyed by component key.
#[async_trait]
pub trait ComponentRegistry: Send + Sync {
    /// Create the component or update its mutable fields if they differ.
    async fn upsert(
        &self,
        key: &str,
        fields: ComponentFields,
        source_id: &str,
    ) -> Result<UpsertOutcome>;

    async fn get(&self, key: &str) -> Result<Option<Component>>;

    /// All components ordered by key.
    async fn list(&self) -> Result<Vec<Component>>;

    async fn count(&self) -> Result<usize> {
        Ok(self.list().await?.len())
    }
}

/// Apply one upsert to an in-memory map.
///
/// Returns the outcome and, when something changed, the previous value so a
/// failed persist can be rolled back.
pub(crate) fn apply_upsert(
    components: &mut BTreeMap<String, Component>,
    key: &str,
    fields: ComponentFields,
    source_id: &str,
    now: DateTime<Utc>,
) -> (UpsertOutcome, Option<Option<Component>>) {
    match components.get_mut(key) {
        Some(existing) if existing.matches(&fields) => (UpsertOutcome::Unchanged, None),
        Some(existing) => {
            let previous = existing.clone();
            existing.name = fields.name;
            existing.description = fields.description;
            existing.maintainers = fields.maintainers;
            existing.team = fields.team;
            existing.updated_at = now;
            existing.last_source = source_id.to_string();
            (UpsertOutcome::Updated, Some(Some(previous)))
        }
        None => {
            components.insert(
                key.to_string(),
                Component {
                    key: key.to_string(),
                    name: fields.name,
                    description: fields.description,
                    maintainers: fields.maintainers,
                    team: fields.team,
                    created_at: now,
                    updated_at: now,
                    last_source: source_id.to_string(),
                },
            );
            (UpsertOutcome::Created, Some(None))
        }
    }
}
