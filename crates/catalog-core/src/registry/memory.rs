//! In-memory registry for embedding and tests

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use super::{Component, ComponentFields, ComponentRegistry, UpsertOutcome, apply_upsert};
use crate::Result;

/// A registry that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    components: RwLock<BTreeMap<String, Component>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ComponentRegistry for MemoryRegistry {
    async fn upsert(
        &self,
        key: &str,
        fields: ComponentFields,
        source_id: &str,
    ) -> Result<UpsertOutcome> {
        let mut components = self.components.write();
        let (outcome, _) = apply_upsert(&mut components, key, fields, source_id, Utc::now());
        Ok(outcome)
    }

    async fn get(&self, key: &str) -> Result<Option<Component>> {
        Ok(self.components.read().get(key).cloned())
    }

    async fn list(&self) -> Result<Vec<Component>> {
        Ok(self.components.read().values().cloned().collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.components.read().len())
    }
}
