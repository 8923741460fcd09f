//! Component manifests (`manifest.yaml` / `manifest.yml`)
//!
//! ```yaml
//! version: "v1"
//! id: payments-api          # optional, defaults to name
//! name: Payments API
//! description: Card payments
//! owners:
//!   maintainers: [alice, bob]
//!   team: payments
//! ```

use catalog_fs::NormalizedPath;
use serde::{Deserialize, Serialize};

/// The only manifest schema version understood by this crate.
pub const SUPPORTED_VERSION: &str = "v1";

/// File names recognised as manifests (case-sensitive).
pub const MANIFEST_FILE_NAMES: [&str; 2] = ["manifest.yaml", "manifest.yml"];

/// Manifests larger than this are rejected without parsing.
pub const MAX_MANIFEST_SIZE: usize = 1024 * 1024;

/// Whether `path` names a manifest file.
pub fn is_manifest_file(path: &NormalizedPath) -> bool {
    path.file_name()
        .is_some_and(|name| MANIFEST_FILE_NAMES.contains(&name))
}

/// Component ownership.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owners {
    #[serde(default)]
    pub maintainers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
}

/// A parsed and validated manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub owners: Owners,
}

impl Manifest {
    /// Reconciliation key: `id` when present, otherwise `name`.
    pub fn component_key(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.name)
    }

    fn validate(&self) -> Result<(), String> {
        if self.version != SUPPORTED_VERSION {
            return Err(format!(
                "unsupported version '{}' (expected '{SUPPORTED_VERSION}')",
                self.version
            ));
        }
        if self.name.trim().is_empty() {
            return Err("'name' must not be empty".to_string());
        }
        if self.id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            return Err("'id' must not be empty when present".to_string());
        }
        Ok(())
    }
}

/// A manifest file that could not be turned into a [`Manifest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{path}: {reason}")]
pub struct ManifestError {
    /// Path of the file, relative to the source root
    pub path: NormalizedPath,
    pub reason: String,
}

impl ManifestError {
    pub fn new(path: NormalizedPath, reason: impl Into<String>) -> Self {
        Self {
            path,
            reason: reason.into(),
        }
    }
}

/// Parse and validate one manifest file.
///
/// `path` is only used for error reporting.
pub fn parse_manifest(path: &NormalizedPath, bytes: &[u8]) -> Result<Manifest, ManifestError> {
    if bytes.len() > MAX_MANIFEST_SIZE {
        return Err(ManifestError::new(
            path.clone(),
            format!(
                "file is {} bytes (max {MAX_MANIFEST_SIZE})",
                bytes.len()
            ),
        ));
    }

    let text = std::str::from_utf8(bytes)
        .map_err(|e| ManifestError::new(path.clone(), format!("not valid UTF-8: {e}")))?;

    let manifest: Manifest = serde_yaml::from_str(text)
        .map_err(|e| ManifestError::new(path.clone(), format!("invalid YAML: {e}")))?;

    manifest
        .validate()
        .map_err(|reason| ManifestError::new(path.clone(), reason))?;

    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn parse(yaml: &str) -> Result<Manifest, ManifestError> {
        parse_manifest(&NormalizedPath::new("svc/manifest.yaml"), yaml.as_bytes())
    }

    #[test]
    fn parses_full_manifest() {
        let manifest = parse(
            r#"
version: "v1"
id: payments-api
name: Payments API
description: Card payments
owners:
  maintainers: [alice, bob]
  team: payments
"#,
        )
        .unwrap();

        assert_eq!(manifest.component_key(), "payments-api");
        assert_eq!(manifest.owners.maintainers, vec!["alice", "bob"]);
        assert_eq!(manifest.owners.team.as_deref(), Some("payments"));
    }

    #[test]
    fn key_falls_back_to_name() {
        let manifest = parse("version: v1\nname: api\n").unwrap();
        assert_eq!(manifest.component_key(), "api");
        assert_eq!(manifest.owners, Owners::default());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let manifest = parse("version: v1\nname: api\nlifecycle: beta\n").unwrap();
        assert_eq!(manifest.name, "api");
    }

    #[rstest]
    #[case::unsupported_version("version: v2\nname: api\n", "unsupported version")]
    #[case::missing_version("name: api\n", "invalid YAML")]
    #[case::missing_name("version: v1\n", "invalid YAML")]
    #[case::blank_name("version: v1\nname: '  '\n", "'name' must not be empty")]
    #[case::blank_id("version: v1\nid: ''\nname: api\n", "'id' must not be empty")]
    #[case::not_a_mapping("- a\n- b\n", "invalid YAML")]
    #[case::malformed("version: v1\nname: [unclosed\n", "invalid YAML")]
    fn rejects_invalid(#[case] yaml: &str, #[case] reason: &str) {
        let err = parse(yaml).unwrap_err();
        assert_eq!(err.path.as_str(), "svc/manifest.yaml");
        assert!(err.reason.contains(reason), "reason was: {}", err.reason);
    }

    #[test]
    fn rejects_non_utf8() {
        let err = parse_manifest(&NormalizedPath::new("m.yaml"), &[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(err.reason.contains("UTF-8"));
    }

    #[test]
    fn rejects_oversized_file() {
        let big = vec![b'#'; MAX_MANIFEST_SIZE + 1];
        let err = parse_manifest(&NormalizedPath::new("m.yaml"), &big).unwrap_err();
        assert!(err.reason.contains("bytes"));
    }

    #[rstest]
    #[case("manifest.yaml", true)]
    #[case("a/b/manifest.yml", true)]
    #[case("Manifest.yaml", false)]
    #[case("manifest.json", false)]
    #[case("my-manifest.yaml", false)]
    fn recognises_manifest_names(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(is_manifest_file(&NormalizedPath::new(path)), expected);
    }

    #[test]
    fn error_display_includes_path() {
        let err = ManifestError::new(NormalizedPath::new("a/manifest.yaml"), "bad");
        assert_eq!(err.to_string(), "a/manifest.yaml: bad");
    }
}
