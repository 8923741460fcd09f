//! Source-tree and manifest fixtures.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A scratch directory laid out like a filesystem source.
///
/// The directory is deleted when the value is dropped.
///
/// ```ignore
/// let tree = SourceTree::new();
/// tree.write_manifest("services/api", &manifest("api").team("core"));
/// ```
pub struct SourceTree {
    dir: TempDir,
}

impl SourceTree {
    /// # Panics
    /// Panics if the temporary directory cannot be created.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new()
                .unwrap_or_else(|e| panic!("SourceTree: failed to create temp dir: {e}")),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of `rel` inside the tree.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Writes `content` to `rel`, creating parent directories.
    ///
    /// # Panics
    /// Panics if the write fails.
    pub fn write(&self, rel: &str, content: &str) -> &Self {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("SourceTree: failed to create {parent:?}: {e}"));
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("SourceTree: failed to write {path:?}: {e}"));
        self
    }

    /// Writes `<dir>/manifest.yaml` (or `manifest.yaml` at the root when `dir`
    /// is empty).
    pub fn write_manifest(&self, dir: &str, manifest: &ManifestBuilder) -> &Self {
        let rel = if dir.is_empty() {
            "manifest.yaml".to_string()
        } else {
            format!("{}/manifest.yaml", dir.trim_end_matches('/'))
        };
        self.write(&rel, &manifest.build())
    }

    /// # Panics
    /// Panics if the file cannot be removed.
    pub fn remove(&self, rel: &str) -> &Self {
        let path = self.path(rel);
        fs::remove_file(&path)
            .unwrap_or_else(|e| panic!("SourceTree: failed to remove {path:?}: {e}"));
        self
    }
}

impl Default for SourceTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Start building a `v1` manifest named `name`.
pub fn manifest(name: &str) -> ManifestBuilder {
    ManifestBuilder {
        version: "v1".to_string(),
        id: None,
        name: name.to_string(),
        description: None,
        maintainers: Vec::new(),
        team: None,
    }
}

/// Renders manifest YAML for tests.
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    version: String,
    id: Option<String>,
    name: String,
    description: Option<String>,
    maintainers: Vec<String>,
    team: Option<String>,
}

impl ManifestBuilder {
    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn maintainers(mut self, maintainers: &[&str]) -> Self {
        self.maintainers = maintainers.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn team(mut self, team: &str) -> Self {
        self.team = Some(team.to_string());
        self
    }

    /// Render as YAML. Values are double-quoted so any string survives.
    pub fn build(&self) -> String {
        let mut out = format!("version: {}\n", quote(&self.version));
        if let Some(id) = &self.id {
            out.push_str(&format!("id: {}\n", quote(id)));
        }
        out.push_str(&format!("name: {}\n", quote(&self.name)));
        if let Some(description) = &self.description {
            out.push_str(&format!("description: {}\n", quote(description)));
        }
        if !self.maintainers.is_empty() || self.team.is_some() {
            out.push_str("owners:\n");
            if !self.maintainers.is_empty() {
                out.push_str("  maintainers:\n");
                for maintainer in &self.maintainers {
                    out.push_str(&format!("    - {}\n", quote(maintainer)));
                }
            }
            if let Some(team) = &self.team {
                out.push_str(&format!("  team: {}\n", quote(team)));
            }
        }
        out
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
