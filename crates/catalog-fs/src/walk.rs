//! Deterministic directory tree walking
//!
//! Source adapters walk a root (optionally narrowed to a subdirectory) and
//! need the same file list, in the same order, on every run.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{Error, NormalizedPath, Result};

/// Directory names that are never descended into.
const SKIPPED_DIRS: &[&str] = &[".git"];

/// A regular file found by [`walk_files`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct WalkedFile {
    /// Path relative to the walk root. Lossy for names that are not UTF-8.
    pub relative: NormalizedPath,
    /// The path as found on disk; open the file through this one.
    pub native: PathBuf,
}

/// Collect regular files below `root`, optionally starting at `start`.
///
/// Relative paths are relative to `root` (not to `start`) and the result is
/// sorted by them. Symbolic links are not followed. Any unreadable entry
/// aborts the walk so callers never act on a partial listing.
pub fn walk_files<F>(
    root: &Path,
    start: Option<&NormalizedPath>,
    mut keep: F,
) -> Result<Vec<WalkedFile>>
where
    F: FnMut(&NormalizedPath) -> bool,
{
    let walk_root = match start {
        Some(sub) => root.join(sub.to_native()),
        None => root.to_path_buf(),
    };

    let walker = WalkDir::new(&walk_root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let skipped = entry.depth() > 0
                && entry.file_type().is_dir()
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| SKIPPED_DIRS.contains(&name));
            !skipped
        });

    let mut found = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| Error::Walk {
            path: e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| walk_root.clone()),
            message: e.to_string(),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(root).map_err(|e| Error::Walk {
            path: entry.path().to_path_buf(),
            message: e.to_string(),
        })?;
        let relative = NormalizedPath::new(relative);
        if keep(&relative) {
            found.push(WalkedFile {
                relative,
                native: entry.into_path(),
            });
        }
    }

    found.sort();
    tracing::trace!(root = %root.display(), files = found.len(), "walked tree");
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    fn relative(files: &[WalkedFile]) -> Vec<NormalizedPath> {
        files.iter().map(|f| f.relative.clone()).collect()
    }

    #[test]
    fn returns_sorted_relative_paths() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "b/file.txt");
        touch(temp.path(), "a/nested/file.txt");
        touch(temp.path(), "top.txt");

        let files = walk_files(temp.path(), None, |_| true).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.relative.as_str()).collect();
        assert_eq!(names, vec!["a/nested/file.txt", "b/file.txt", "top.txt"]);
    }

    #[test]
    fn start_narrows_walk_but_keeps_root_relative_paths() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "services/api/file.txt");
        touch(temp.path(), "libs/file.txt");

        let start = NormalizedPath::new("services");
        let files = walk_files(temp.path(), Some(&start), |_| true).unwrap();
        assert_eq!(relative(&files), vec![NormalizedPath::new("services/api/file.txt")]);
        assert_eq!(files[0].native, temp.path().join("services/api/file.txt"));
    }

    #[test]
    fn skips_git_directory() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), ".git/config");
        touch(temp.path(), "src/file.txt");

        let files = walk_files(temp.path(), None, |_| true).unwrap();
        assert_eq!(relative(&files), vec![NormalizedPath::new("src/file.txt")]);
    }

    #[test]
    fn filter_is_applied() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "keep.yaml");
        touch(temp.path(), "drop.txt");

        let files = walk_files(temp.path(), None, |p| p.extension() == Some("yaml")).unwrap();
        assert_eq!(relative(&files), vec![NormalizedPath::new("keep.yaml")]);
    }

    #[test]
    fn missing_root_is_an_error() {
        let temp = TempDir::new().unwrap();
        let result = walk_files(&temp.path().join("absent"), None, |_| true);
        assert!(matches!(result, Err(Error::Walk { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_names_keep_their_native_path() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(OsStr::from_bytes(b"caf\xe9"));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("file.txt"), "x").unwrap();

        let files = walk_files(temp.path(), None, |_| true).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative.as_str(), "caf\u{FFFD}/file.txt");
        assert_eq!(files[0].native, dir.join("file.txt"));
        assert_eq!(fs::read(&files[0].native).unwrap(), b"x");
    }
}
