//! Git repositories that stand in for remotes in git-source tests.
//!
//! Everything goes through `git2`, so tests never depend on a `git` binary
//! or on the user's global git config.

use std::fs;
use std::path::Path;

use git2::{Oid, Repository, RepositoryInitOptions, Signature};

/// Initialises a real, non-bare repository whose unborn HEAD is `main`.
///
/// # Panics
/// Panics if `git2` fails to initialise the repository.
pub fn init_repo(path: &Path) -> Repository {
    let mut options = RepositoryInitOptions::new();
    options.initial_head("main");
    Repository::init_opts(path, &options).unwrap_or_else(|e| {
        panic!(
            "init_repo: failed to init repository at {}: {e}",
            path.display()
        )
    })
}

/// Writes `files` (relative path, content) into the working tree and commits
/// them on the current branch.
///
/// # Panics
/// Panics if any filesystem or git operation fails.
pub fn commit_files(repo: &Repository, files: &[(&str, &str)], message: &str) -> Oid {
    let workdir = workdir(repo);
    let mut index = repo
        .index()
        .unwrap_or_else(|e| panic!("commit_files: failed to open index: {e}"));

    for (rel, content) in files {
        let path = workdir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("commit_files: failed to create {parent:?}: {e}"));
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("commit_files: failed to write {path:?}: {e}"));
        index
            .add_path(Path::new(rel))
            .unwrap_or_else(|e| panic!("commit_files: failed to stage {rel}: {e}"));
    }

    commit_index(repo, &mut index, message)
}

/// Deletes `paths` from the working tree and commits the removal.
///
/// # Panics
/// Panics if any filesystem or git operation fails.
pub fn remove_files(repo: &Repository, paths: &[&str], message: &str) -> Oid {
    let workdir = workdir(repo);
    let mut index = repo
        .index()
        .unwrap_or_else(|e| panic!("remove_files: failed to open index: {e}"));

    for rel in paths {
        let path = workdir.join(rel);
        fs::remove_file(&path)
            .unwrap_or_else(|e| panic!("remove_files: failed to delete {path:?}: {e}"));
        index
            .remove_path(Path::new(rel))
            .unwrap_or_else(|e| panic!("remove_files: failed to unstage {rel}: {e}"));
    }

    commit_index(repo, &mut index, message)
}

/// Creates branch `name` at the current HEAD commit and switches to it.
///
/// # Panics
/// Panics if HEAD has no commit or any git operation fails.
pub fn create_branch(repo: &Repository, name: &str) {
    let head = repo
        .head()
        .and_then(|h| h.peel_to_commit())
        .unwrap_or_else(|e| panic!("create_branch: HEAD has no commit: {e}"));
    repo.branch(name, &head, false)
        .unwrap_or_else(|e| panic!("create_branch: failed to create {name}: {e}"));
    repo.set_head(&format!("refs/heads/{name}"))
        .unwrap_or_else(|e| panic!("create_branch: failed to switch to {name}: {e}"));
}

fn workdir(repo: &Repository) -> &Path {
    repo.workdir()
        .unwrap_or_else(|| panic!("fixture repository must have a working tree"))
}

fn commit_index(repo: &Repository, index: &mut git2::Index, message: &str) -> Oid {
    index
        .write()
        .unwrap_or_else(|e| panic!("commit: failed to write index: {e}"));
    let tree_id = index
        .write_tree()
        .unwrap_or_else(|e| panic!("commit: failed to write tree: {e}"));
    let tree = repo
        .find_tree(tree_id)
        .unwrap_or_else(|e| panic!("commit: failed to find tree: {e}"));

    let sig = Signature::now("Test User", "test@test.com")
        .unwrap_or_else(|e| panic!("commit: failed to build signature: {e}"));
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap_or_else(|e| panic!("commit: failed to commit: {e}"))
}
