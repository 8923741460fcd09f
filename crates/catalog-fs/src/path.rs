//! Normalized path handling for cross-platform compatibility

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// A path normalized to use forward slashes internally.
///
/// Backslashes become forward slashes, repeated separators collapse and `.`
/// segments are dropped. `..` segments are kept verbatim; callers that must
/// stay inside a root use [`validate_relative`] instead.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let raw = path.as_ref().to_string_lossy();
        Self {
            inner: normalize(&raw),
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a segment.
    pub fn join(&self, segment: &str) -> Self {
        Self {
            inner: normalize(&format!("{}/{}", self.inner, segment)),
        }
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        if self.inner == "/" || self.inner == "." {
            return None;
        }
        match self.inner.rfind('/') {
            Some(0) => Some(Self {
                inner: "/".to_string(),
            }),
            Some(idx) => Some(Self {
                inner: self.inner[..idx].to_string(),
            }),
            None => None,
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        self.inner
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty() && *name != ".")
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 {
                None
            } else {
                Some(&name[idx + 1..])
            }
        })
    }

    /// Iterate over the non-empty path segments.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.inner
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != ".")
    }

    /// Whether the path is rooted (`/x` or a drive letter such as `C:/x`).
    pub fn is_absolute(&self) -> bool {
        let bytes = self.inner.as_bytes();
        self.inner.starts_with('/')
            || (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':')
    }

    /// Component-wise prefix test; `a/bc` does not start with `a/b`.
    pub fn starts_with(&self, base: &NormalizedPath) -> bool {
        if self.is_absolute() != base.is_absolute() {
            return false;
        }
        let mut own = self.components();
        base.components().all(|segment| own.next() == Some(segment))
    }

    /// Remove `base` from the front of this path.
    ///
    /// Returns `.` when both paths are equal and `None` when `base` is not a
    /// component-wise prefix.
    pub fn strip_prefix(&self, base: &NormalizedPath) -> Option<NormalizedPath> {
        if !self.starts_with(base) {
            return None;
        }
        let skip = base.components().count();
        let rest: Vec<&str> = self.components().skip(skip).collect();
        Some(Self::new(rest.join("/")))
    }

    /// Check if this path exists on the filesystem.
    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }
}

fn normalize(raw: &str) -> String {
    let replaced = raw.replace('\\', "/");
    let absolute = replaced.starts_with('/');
    let joined = replaced
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/");

    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Validate a user-supplied path that must stay inside some root.
///
/// Rejects empty input, absolute paths and any `..` segment.
pub fn validate_relative(raw: &str) -> Result<NormalizedPath> {
    let invalid = |reason: &str| Error::InvalidRelativePath {
        path: raw.to_string(),
        reason: reason.to_string(),
    };

    let path = NormalizedPath::new(raw.trim());
    if path.as_str() == "." {
        return Err(invalid("must not be empty"));
    }
    if path.is_absolute() {
        return Err(invalid("must be relative"));
    }
    if path.components().any(|segment| segment == "..") {
        return Err(invalid("must not contain '..'"));
    }
    Ok(path)
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

impl serde::Serialize for NormalizedPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.inner)
    }
}

impl<'de> serde::Deserialize<'de> for NormalizedPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::new(raw))
    }
}
