//! Source configuration
//!
//! Entries are decoded in two steps: serde reads a permissive
//! [`RawSourceEntry`], then [`SourceConfig::from_raw`] inspects the `type`
//! discriminator and validates the fields that belong to that variant.

use std::path::Path;

use catalog_fs::{NormalizedPath, validate_relative};
use serde::{Deserialize, Serialize};

use crate::interval::Interval;
use crate::{Error, Result};

const FILESYSTEM: &str = "filesystem";
const GIT: &str = "git";

/// Where a source's files come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceKind {
    /// A local directory tree.
    Filesystem { path: NormalizedPath },

    /// One branch of a git repository.
    Git {
        url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        branch: Option<String>,
    },
}

impl SourceKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            SourceKind::Filesystem { .. } => FILESYSTEM,
            SourceKind::Git { .. } => GIT,
        }
    }
}

/// A validated source entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceConfig {
    /// Stable identifier, configured or derived from the entry
    pub id: String,

    /// Time between runs
    pub interval: Interval,

    /// Subtree of the source root that discovery is restricted to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_path: Option<NormalizedPath>,

    #[serde(flatten)]
    pub kind: SourceKind,
}

/// Source entry exactly as written in the configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSourceEntry {
    #[serde(rename = "type")]
    pub source_type: Option<String>,
    pub id: Option<String>,
    pub interval: Option<String>,
    pub base_path: Option<String>,
    pub path: Option<String>,
    pub url: Option<String>,
    pub branch: Option<String>,
}

impl SourceConfig {
    /// Validate entry number `index` of the configuration.
    ///
    /// A relative filesystem `path` is resolved against `config_dir`.
    pub fn from_raw(index: usize, raw: RawSourceEntry, config_dir: Option<&Path>) -> Result<Self> {
        let type_name = raw
            .source_type
            .as_deref()
            .map(str::trim)
            .ok_or(Error::MissingSourceType { index })?;

        let kind = match type_name {
            FILESYSTEM => {
                reject_foreign(index, FILESYSTEM, "url", &raw.url)?;
                reject_foreign(index, FILESYSTEM, "branch", &raw.branch)?;
                let path = require(index, FILESYSTEM, "path", &raw.path)?;
                SourceKind::Filesystem {
                    path: resolve_path(path, config_dir),
                }
            }
            GIT => {
                reject_foreign(index, GIT, "path", &raw.path)?;
                let url = require(index, GIT, "url", &raw.url)?;
                let branch = match raw.branch.as_deref().map(str::trim) {
                    Some("") => return Err(Error::EmptyField { index, field: "branch" }),
                    other => other.map(str::to_string),
                };
                SourceKind::Git {
                    url: url.to_string(),
                    branch,
                }
            }
            other => {
                return Err(Error::UnknownSourceType {
                    index,
                    type_name: other.to_string(),
                });
            }
        };
        let kind_name = kind.type_name();

        let interval_raw = require(index, kind_name, "interval", &raw.interval)?;
        let interval: Interval = interval_raw.parse().map_err(|e| Error::SourceInterval {
            index,
            source: Box::new(e),
        })?;

        let base_path = match raw.base_path.as_deref() {
            None => None,
            Some(raw_base) => Some(validate_relative(raw_base).map_err(|e| {
                Error::InvalidBasePath {
                    index,
                    path: raw_base.to_string(),
                    reason: match e {
                        catalog_fs::Error::InvalidRelativePath { reason, .. } => reason,
                        other => other.to_string(),
                    },
                }
            })?),
        };

        let id = match raw.id.as_deref().map(str::trim) {
            Some("") => return Err(Error::EmptyField { index, field: "id" }),
            Some(id) => id.to_string(),
            None => derive_id(&kind, base_path.as_ref()),
        };

        Ok(Self {
            id,
            interval,
            base_path,
            kind,
        })
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }
}

/// Identifier used when an entry has no explicit `id`.
///
/// `filesystem:<path>` or `git:<url>[#<branch>]`, plus `/<basePath>`.
pub fn derive_id(kind: &SourceKind, base_path: Option<&NormalizedPath>) -> String {
    let mut id = match kind {
        SourceKind::Filesystem { path } => format!("{FILESYSTEM}:{path}"),
        SourceKind::Git { url, branch } => match branch {
            Some(branch) => format!("{GIT}:{url}#{branch}"),
            None => format!("{GIT}:{url}"),
        },
    };
    if let Some(base) = base_path {
        id.push('/');
        id.push_str(base.as_str());
    }
    id
}

fn require<'a>(
    index: usize,
    kind: &'static str,
    field: &'static str,
    value: &'a Option<String>,
) -> Result<&'a str> {
    match value.as_deref().map(str::trim) {
        None => Err(Error::MissingField { index, field, kind }),
        Some("") => Err(Error::EmptyField { index, field }),
        Some(v) => Ok(v),
    }
}

fn reject_foreign(
    index: usize,
    kind: &'static str,
    field: &'static str,
    value: &Option<String>,
) -> Result<()> {
    if value.is_some() {
        return Err(Error::ForeignField { index, field, kind });
    }
    Ok(())
}

fn resolve_path(raw: &str, config_dir: Option<&Path>) -> NormalizedPath {
    let path = NormalizedPath::new(raw);
    match config_dir {
        Some(dir) if !path.is_absolute() => NormalizedPath::new(dir).join(path.as_str()),
        _ => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fs_entry(path: &str) -> RawSourceEntry {
        RawSourceEntry {
            source_type: Some("filesystem".into()),
            interval: Some("30s".into()),
            path: Some(path.into()),
            ..Default::default()
        }
    }

    fn git_entry(url: &str) -> RawSourceEntry {
        RawSourceEntry {
            source_type: Some("git".into()),
            interval: Some("5m".into()),
            url: Some(url.into()),
            ..Default::default()
        }
    }

    #[test]
    fn derives_filesystem_id() {
        let config = SourceConfig::from_raw(0, fs_entry("/srv/catalog"), None).unwrap();
        assert_eq!(config.id, "filesystem:/srv/catalog");
        assert_eq!(config.type_name(), "filesystem");
    }

    #[test]
    fn derives_git_id_with_branch_and_base_path() {
        let mut raw = git_entry("https://example.com/acme.git");
        raw.branch = Some("release".into());
        raw.base_path = Some("services".into());
        let config = SourceConfig::from_raw(0, raw, None).unwrap();
        assert_eq!(config.id, "git:https://example.com/acme.git#release/services");
    }

    #[test]
    fn explicit_id_wins() {
        let mut raw = git_entry("https://example.com/acme.git");
        raw.id = Some("acme".into());
        let config = SourceConfig::from_raw(0, raw, None).unwrap();
        assert_eq!(config.id, "acme");
    }

    #[test]
    fn relative_filesystem_path_resolved_against_config_dir() {
        let config =
            SourceConfig::from_raw(0, fs_entry("components"), Some(Path::new("/etc/catalog")))
                .unwrap();
        assert_eq!(
            config.kind,
            SourceKind::Filesystem {
                path: NormalizedPath::new("/etc/catalog/components")
            }
        );
    }

    #[test]
    fn unknown_type_is_rejected() {
        let mut raw = fs_entry("/x");
        raw.source_type = Some("svn".into());
        let err = SourceConfig::from_raw(3, raw, None).unwrap_err();
        assert!(matches!(err, Error::UnknownSourceType { index: 3, ref type_name } if type_name == "svn"));
    }

    #[test]
    fn foreign_field_is_rejected() {
        let mut raw = fs_entry("/x");
        raw.url = Some("https://example.com".into());
        let err = SourceConfig::from_raw(0, raw, None).unwrap_err();
        assert!(matches!(err, Error::ForeignField { field: "url", .. }));
    }

    #[test]
    fn parent_base_path_is_rejected() {
        let mut raw = fs_entry("/x");
        raw.base_path = Some("../outside".into());
        let err = SourceConfig::from_raw(0, raw, None).unwrap_err();
        assert!(matches!(err, Error::InvalidBasePath { .. }));
    }

    #[test]
    fn serializes_with_type_tag() {
        let config = SourceConfig::from_raw(0, git_entry("https://example.com/a.git"), None).unwrap();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["type"], "git");
        assert_eq!(json["interval"], "5m");
        assert_eq!(json["url"], "https://example.com/a.git");
        assert!(json.get("branch").is_none());
    }
}
