//! Source adapters
//!
//! An adapter turns a configured source into a [`Snapshot`]: every manifest
//! file currently visible under the source root (or its base path), with its
//! bytes, in lexicographic path order.

mod filesystem;
mod git;

pub use filesystem::FilesystemAdapter;
pub use git::GitAdapter;

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use catalog_fs::NormalizedPath;
use catalog_meta::manifest::MAX_MANIFEST_SIZE;
use catalog_meta::{EngineSettings, ManifestError, SourceConfig, SourceKind, is_manifest_file};

use crate::{Error, Result};

/// One manifest file read from a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFile {
    /// Path relative to the source root, forward slashes
    pub path: NormalizedPath,
    pub content: Vec<u8>,
}

/// Everything an adapter observed in one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Readable manifest files in lexicographic path order
    pub files: Vec<SnapshotFile>,

    /// Manifest files that were found but are too large to parse
    pub rejected: Vec<ManifestError>,

    /// Commit id for version-controlled sources
    pub revision: Option<String>,
}

/// Produces snapshots of one source.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn source_id(&self) -> &str;

    /// Observe the source. Any failure here means the source is unavailable
    /// for this run; no partial snapshot is ever returned.
    async fn snapshot(&self) -> Result<Snapshot>;
}

/// Build the adapter for a configured source.
pub fn build_adapter(config: &SourceConfig, engine: &EngineSettings) -> Arc<dyn SourceAdapter> {
    match &config.kind {
        SourceKind::Filesystem { path } => Arc::new(FilesystemAdapter::new(
            config.id.clone(),
            path.clone(),
            config.base_path.clone(),
        )),
        SourceKind::Git { url, branch } => Arc::new(GitAdapter::new(
            config.id.clone(),
            url.clone(),
            branch.clone(),
            config.base_path.clone(),
            &engine.checkouts_dir(),
        )),
    }
}

/// Collect manifest files below `root`, restricted to `base_path`.
///
/// Shared by every adapter once it has a directory on disk.
pub(crate) fn scan_tree(
    source_id: &str,
    root: &Path,
    base_path: Option<&NormalizedPath>,
) -> Result<(Vec<SnapshotFile>, Vec<ManifestError>)> {
    if !root.is_dir() {
        return Err(Error::unavailable(
            source_id,
            format!("{} does not exist or is not a directory", root.display()),
        ));
    }
    if let Some(base) = base_path {
        check_base_path(source_id, root, base)?;
    }

    let walked = catalog_fs::walk_files(root, base_path, is_manifest_file)
        .map_err(|e| Error::unavailable(source_id, e.to_string()))?;

    let mut files = Vec::with_capacity(walked.len());
    let mut rejected = Vec::new();
    for file in walked {
        match read_capped(&file.native) {
            Ok(content) if content.len() > MAX_MANIFEST_SIZE => {
                rejected.push(ManifestError::new(
                    file.relative,
                    format!("file is larger than {MAX_MANIFEST_SIZE} bytes"),
                ));
            }
            Ok(content) => files.push(SnapshotFile {
                path: file.relative,
                content,
            }),
            Err(e) => {
                return Err(Error::unavailable(
                    source_id,
                    format!("failed to read {}: {e}", file.native.display()),
                ));
            }
        }
    }

    tracing::debug!(
        source_id,
        files = files.len(),
        rejected = rejected.len(),
        "scanned source tree"
    );
    Ok((files, rejected))
}

/// The base path must be a directory that resolves inside `root`, even
/// through symbolic links.
fn check_base_path(source_id: &str, root: &Path, base: &NormalizedPath) -> Result<()> {
    let start = root.join(base.to_native());
    if !start.is_dir() {
        return Err(Error::unavailable(
            source_id,
            format!(
                "base path '{base}' does not exist or is not a directory under {}",
                root.display()
            ),
        ));
    }

    let resolved = root.canonicalize().and_then(|root| {
        start
            .canonicalize()
            .map(|start| start.starts_with(&root))
    });
    match resolved {
        Ok(true) => Ok(()),
        Ok(false) => Err(Error::unavailable(
            source_id,
            format!("base path '{base}' resolves outside {}", root.display()),
        )),
        Err(e) => Err(Error::unavailable(
            source_id,
            format!("failed to resolve base path '{base}': {e}"),
        )),
    }
}

/// Read at most one byte past the manifest size limit.
fn read_capped(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut content = Vec::new();
    File::open(path)?
        .take(MAX_MANIFEST_SIZE as u64 + 1)
        .read_to_end(&mut content)?;
    Ok(content)
}
