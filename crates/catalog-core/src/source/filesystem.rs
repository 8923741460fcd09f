//! Filesystem source adapter

use async_trait::async_trait;
use catalog_fs::NormalizedPath;

use super::{Snapshot, SourceAdapter, scan_tree};
use crate::Result;

/// Scans a local directory tree.
#[derive(Debug, Clone)]
pub struct FilesystemAdapter {
    source_id: String,
    root: NormalizedPath,
    base_path: Option<NormalizedPath>,
}

impl FilesystemAdapter {
    pub fn new(
        source_id: impl Into<String>,
        root: NormalizedPath,
        base_path: Option<NormalizedPath>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            root,
            base_path,
        }
    }
}

#[async_trait]
impl SourceAdapter for FilesystemAdapter {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    async fn snapshot(&self) -> Result<Snapshot> {
        let adapter = self.clone();
        let (files, rejected) = tokio::task::spawn_blocking(move || {
            scan_tree(
                &adapter.source_id,
                &adapter.root.to_native(),
                adapter.base_path.as_ref(),
            )
        })
        .await??;

        Ok(Snapshot {
            files,
            rejected,
            revision: None,
        })
    }
}
