//! Manifest discovery
//!
//! Turns a [`Snapshot`] into parsed manifests and per-file failures. A bad
//! file never stops the others from being parsed.

use std::collections::{HashMap, HashSet};

use catalog_fs::NormalizedPath;
use catalog_fs::checksum::compute_checksum;
use catalog_meta::{Manifest, ManifestError, parse_manifest};
use parking_lot::Mutex;

use crate::source::Snapshot;

/// Result of discovering one snapshot. Both lists are in path order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    pub manifests: Vec<(NormalizedPath, Manifest)>,
    pub failures: Vec<ManifestError>,
}

impl DiscoveryReport {
    pub fn total(&self) -> usize {
        self.manifests.len() + self.failures.len()
    }
}

#[derive(Debug)]
struct CacheEntry {
    checksum: String,
    parsed: Result<Manifest, ManifestError>,
}

/// Parses manifests for one source, reusing results for unchanged bytes.
#[derive(Debug, Default)]
pub struct ManifestDiscoverer {
    cache: Mutex<HashMap<NormalizedPath, CacheEntry>>,
}

impl ManifestDiscoverer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn discover(&self, snapshot: &Snapshot) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();
        let mut cache = self.cache.lock();
        let mut hits = 0usize;

        for file in &snapshot.files {
            let checksum = compute_checksum(&file.content);
            let parsed = match cache.get(&file.path) {
                Some(entry) if entry.checksum == checksum => {
                    hits += 1;
                    entry.parsed.clone()
                }
                _ => {
                    let parsed = parse_manifest(&file.path, &file.content);
                    cache.insert(
                        file.path.clone(),
                        CacheEntry {
                            checksum,
                            parsed: parsed.clone(),
                        },
                    );
                    parsed
                }
            };

            match parsed {
                Ok(manifest) => report.manifests.push((file.path.clone(), manifest)),
                Err(error) => {
                    tracing::warn!(path = %error.path, error = %error.reason, "invalid manifest");
                    report.failures.push(error);
                }
            }
        }

        let present: HashSet<&NormalizedPath> = snapshot.files.iter().map(|f| &f.path).collect();
        cache.retain(|path, _| present.contains(path));
        drop(cache);

        for rejected in &snapshot.rejected {
            tracing::warn!(path = %rejected.path, error = %rejected.reason, "invalid manifest");
        }
        report.failures.extend(snapshot.rejected.iter().cloned());
        report.failures.sort_by(|a, b| a.path.cmp(&b.path));

        tracing::debug!(
            files = snapshot.files.len(),
            cache_hits = hits,
            parsed = report.manifests.len(),
            failed = report.failures.len(),
            "discovered manifests"
        );
        report
    }

    /// Number of cached parse results.
    pub fn cached(&self) -> usize {
        self.cache.lock().len()
    }
}
