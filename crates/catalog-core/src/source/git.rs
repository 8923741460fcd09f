//! Git source adapter

use std::sync::Arc;

use async_trait::async_trait;
use catalog_fs::NormalizedPath;
use catalog_git::{WorkingCopy, checkout_dir_name};
use tokio::sync::Mutex;

use super::{Snapshot, SourceAdapter, scan_tree};
use crate::{Error, Result};

/// Observes the tip of one branch through a catalog-owned working copy.
pub struct GitAdapter {
    source_id: String,
    working_copy: WorkingCopy,
    base_path: Option<NormalizedPath>,
    /// Held for the whole blocking sync. A timed-out run keeps running on
    /// the blocking pool, and the next run must not touch the same copy
    /// until it is done.
    busy: Arc<Mutex<()>>,
}

impl GitAdapter {
    /// `checkouts_dir` is the parent of every working copy; this source gets
    /// its own subdirectory named after its id.
    pub fn new(
        source_id: impl Into<String>,
        url: impl Into<String>,
        branch: Option<String>,
        base_path: Option<NormalizedPath>,
        checkouts_dir: &NormalizedPath,
    ) -> Self {
        let source_id = source_id.into();
        let path = checkouts_dir.join(&checkout_dir_name(&source_id));
        Self {
            working_copy: WorkingCopy::new(url, branch, path),
            source_id,
            base_path,
            busy: Arc::new(Mutex::new(())),
        }
    }

    pub fn working_copy(&self) -> &WorkingCopy {
        &self.working_copy
    }
}

#[async_trait]
impl SourceAdapter for GitAdapter {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    async fn snapshot(&self) -> Result<Snapshot> {
        let guard = Arc::clone(&self.busy).lock_owned().await;
        let source_id = self.source_id.clone();
        let working_copy = self.working_copy.clone();
        let base_path = self.base_path.clone();

        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            let checkout = working_copy
                .sync()
                .map_err(|e| Error::unavailable(&source_id, e.to_string()))?;
            let (files, rejected) =
                scan_tree(&source_id, &checkout.path.to_native(), base_path.as_ref())?;

            tracing::debug!(
                source_id = %source_id,
                branch = %checkout.branch,
                revision = %checkout.commit.id,
                "observed git source"
            );
            Ok(Snapshot {
                files,
                rejected,
                revision: Some(checkout.commit.id),
            })
        })
        .await?
    }
}
