//! JSON-file registry
//!
//! The whole registry is one JSON document rewritten atomically (temp file,
//! exclusive lock, rename) after every upsert that changes something. Each
//! upsert applies and writes on the blocking pool as one step under a writer
//! lock, so a dropped caller can neither split it nor reorder the writes.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use catalog_fs::NormalizedPath;
use catalog_fs::io::write_atomic;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use super::{Component, ComponentFields, ComponentRegistry, UpsertOutcome, apply_upsert};
use crate::{Error, Result};

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct RegistryDocument {
    version: u32,
    components: Vec<Component>,
}

struct Store {
    path: NormalizedPath,
    /// Held across apply and write so documents reach disk in upsert order
    writer: Mutex<()>,
    components: RwLock<BTreeMap<String, Component>>,
}

impl Store {
    fn upsert(&self, key: &str, fields: ComponentFields, source_id: &str) -> Result<UpsertOutcome> {
        let _writer = self.writer.lock();

        let (outcome, previous, bytes) = {
            let mut components = self.components.write();
            let (outcome, previous) =
                apply_upsert(&mut components, key, fields, source_id, Utc::now());
            let Some(previous) = previous else {
                return Ok(outcome);
            };
            let document = RegistryDocument {
                version: FORMAT_VERSION,
                components: components.values().cloned().collect(),
            };
            (outcome, previous, serde_json::to_vec_pretty(&document))
        };

        let written = bytes.map_err(Error::from).and_then(|bytes| {
            write_atomic(&self.path, &bytes).map_err(|e| Error::Registry {
                message: e.to_string(),
            })
        });

        if let Err(e) = written {
            // Keep memory in step with what is on disk
            let mut components = self.components.write();
            match previous {
                Some(old) => {
                    components.insert(key.to_string(), old);
                }
                None => {
                    components.remove(key);
                }
            }
            return Err(e);
        }
        Ok(outcome)
    }
}

/// Registry persisted to a JSON document on disk.
pub struct FileRegistry {
    store: Arc<Store>,
}

impl FileRegistry {
    /// Open the registry at `path`, starting empty if the file is absent.
    pub fn open(path: NormalizedPath) -> Result<Self> {
        let components = Self::read(&path)?
            .into_iter()
            .map(|c| (c.key.clone(), c))
            .collect::<BTreeMap<_, _>>();

        tracing::debug!(path = %path, components = components.len(), "opened registry");
        Ok(Self::with_components(path, components))
    }

    fn with_components(path: NormalizedPath, components: BTreeMap<String, Component>) -> Self {
        Self {
            store: Arc::new(Store {
                path,
                writer: Mutex::new(()),
                components: RwLock::new(components),
            }),
        }
    }

    /// Read the components stored at `path` without opening a registry.
    pub fn read(path: &NormalizedPath) -> Result<Vec<Component>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = catalog_fs::io::read_text(path)?;
        let document: RegistryDocument = serde_json::from_str(&content)?;
        if document.version != FORMAT_VERSION {
            return Err(Error::Registry {
                message: format!(
                    "{path}: unsupported registry format version {}",
                    document.version
                ),
            });
        }
        Ok(document.components)
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.store.path
    }
}

#[async_trait]
impl ComponentRegistry for FileRegistry {
    async fn upsert(
        &self,
        key: &str,
        fields: ComponentFields,
        source_id: &str,
    ) -> Result<UpsertOutcome> {
        let store = Arc::clone(&self.store);
        let key = key.to_string();
        let source_id = source_id.to_string();
        tokio::task::spawn_blocking(move || store.upsert(&key, fields, &source_id)).await?
    }

    async fn get(&self, key: &str) -> Result<Option<Component>> {
        Ok(self.store.components.read().get(key).cloned())
    }

    async fn list(&self) -> Result<Vec<Component>> {
        Ok(self.store.components.read().values().cloned().collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.store.components.read().len())
    }
}
