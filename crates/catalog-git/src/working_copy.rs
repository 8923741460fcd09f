//! Local working copy of one branch of a remote repository

use std::fs;

use catalog_fs::NormalizedPath;
use chrono::{DateTime, TimeZone, Utc};
use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{Commit, Direction, Repository};

use crate::helpers::{classify, fetch_options, head_branch, remote_callbacks};
use crate::{Error, Result};

const ORIGIN: &str = "origin";

/// The commit a working copy was checked out at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// Full commit id
    pub id: String,

    /// First line of the commit message
    pub summary: String,

    /// Commit timestamp
    pub timestamp: DateTime<Utc>,
}

impl CommitInfo {
    fn from_commit(commit: &Commit<'_>) -> Self {
        let timestamp = Utc
            .timestamp_opt(commit.time().seconds(), 0)
            .single()
            .unwrap_or_default();

        Self {
            id: commit.id().to_string(),
            summary: commit.summary().unwrap_or("").to_string(),
            timestamp,
        }
    }
}

/// Result of a successful [`WorkingCopy::sync`].
#[derive(Debug, Clone)]
pub struct Checkout {
    /// Directory holding the checked-out tree
    pub path: NormalizedPath,

    /// Branch that was checked out (resolved when not configured)
    pub branch: String,

    /// Tip commit of that branch
    pub commit: CommitInfo,
}

/// A local clone that mirrors the tip of one branch of `url`.
///
/// The working copy is owned by the catalog: local modifications are
/// discarded on every sync and HEAD is left detached at the fetched tip.
#[derive(Debug, Clone)]
pub struct WorkingCopy {
    url: String,
    branch: Option<String>,
    path: NormalizedPath,
}

impl WorkingCopy {
    /// Create a working copy handle. Nothing touches the disk until
    /// [`sync`](Self::sync).
    ///
    /// `branch: None` follows the remote's default branch.
    pub fn new(url: impl Into<String>, branch: Option<String>, path: NormalizedPath) -> Self {
        Self {
            url: url.into(),
            branch,
            path,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    /// Bring the working copy to the current tip of the branch.
    ///
    /// Clones when no usable copy exists, otherwise fetches the branch and
    /// force-checks-out its tip.
    pub fn sync(&self) -> Result<Checkout> {
        let (repo, branch) = match self.open_existing()? {
            Some(repo) => {
                let branch = self.resolve_branch(&repo)?;
                self.fetch(&repo, &branch)?;
                (repo, branch)
            }
            None => self.clone_fresh()?,
        };

        let commit = self.checkout_tip(&repo, &branch)?;
        tracing::debug!(
            url = %self.url,
            branch = %branch,
            commit = %commit.id,
            "working copy synced"
        );

        Ok(Checkout {
            path: self.path.clone(),
            branch,
            commit,
        })
    }

    /// Open the copy on disk if it exists and still tracks `url`.
    ///
    /// Copies that cannot be opened or whose origin changed are removed so
    /// the caller falls back to a fresh clone.
    fn open_existing(&self) -> Result<Option<Repository>> {
        let native = self.path.to_native();
        if !native.exists() {
            return Ok(None);
        }

        match Repository::open(&native) {
            Ok(repo) => {
                let same_origin = repo
                    .find_remote(ORIGIN)
                    .ok()
                    .and_then(|remote| remote.url().map(|url| url == self.url))
                    .unwrap_or(false);
                if same_origin {
                    return Ok(Some(repo));
                }
                tracing::warn!(
                    path = %self.path,
                    url = %self.url,
                    "working copy tracks a different origin, re-cloning"
                );
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path,
                    error = %e,
                    "working copy unreadable, re-cloning"
                );
            }
        }

        fs::remove_dir_all(&native).map_err(|e| Error::InvalidWorkingCopy {
            path: native.clone(),
            message: format!("failed to remove stale copy: {e}"),
        })?;
        Ok(None)
    }

    fn clone_fresh(&self) -> Result<(Repository, String)> {
        let native = self.path.to_native();
        if let Some(parent) = native.parent() {
            fs::create_dir_all(parent).map_err(|e| catalog_fs::Error::io(parent, e))?;
        }

        let mut builder = RepoBuilder::new();
        builder.fetch_options(fetch_options());
        if let Some(branch) = &self.branch {
            builder.branch(branch);
        }

        tracing::info!(url = %self.url, path = %self.path, "cloning source repository");
        let repo = builder.clone(&self.url, &native).map_err(|e| {
            // A failed clone can leave a half-initialized directory behind
            let _ = fs::remove_dir_all(&native);
            classify(&self.url, self.branch.as_deref(), e)
        })?;

        let branch = match &self.branch {
            Some(branch) => branch.clone(),
            None => head_branch(&repo).ok_or_else(|| Error::NoDefaultBranch {
                url: self.url.clone(),
            })?,
        };
        Ok((repo, branch))
    }

    /// The configured branch, or the remote's current default branch.
    fn resolve_branch(&self, repo: &Repository) -> Result<String> {
        if let Some(branch) = &self.branch {
            return Ok(branch.clone());
        }

        let mut remote = repo.find_remote(ORIGIN)?;
        let mut connection = remote
            .connect_auth(Direction::Fetch, Some(remote_callbacks()), None)
            .map_err(|e| classify(&self.url, None, e))?;
        let advertised = connection
            .remote()
            .default_branch()
            .ok()
            .and_then(|buf| buf.as_str().map(str::to_string));
        drop(connection);

        // Transports that do not advertise HEAD fall back to the symref
        // recorded at clone time.
        let default = advertised.or_else(|| {
            repo.find_reference(&format!("refs/remotes/{ORIGIN}/HEAD"))
                .ok()
                .and_then(|r| r.symbolic_target().map(str::to_string))
        });

        default
            .as_deref()
            .and_then(|name| {
                name.strip_prefix("refs/heads/")
                    .or_else(|| name.strip_prefix(&format!("refs/remotes/{ORIGIN}/")))
            })
            .map(str::to_string)
            .ok_or_else(|| Error::NoDefaultBranch {
                url: self.url.clone(),
            })
    }

    fn fetch(&self, repo: &Repository, branch: &str) -> Result<()> {
        let tracking = tracking_ref(branch);

        // Drop the old tracking ref so a branch deleted upstream is reported
        // instead of silently serving the last fetched tip.
        if let Ok(mut reference) = repo.find_reference(&tracking) {
            reference.delete()?;
        }

        let mut remote = repo.find_remote(ORIGIN)?;
        let refspec = format!("+refs/heads/{branch}:{tracking}");
        remote
            .fetch(&[refspec.as_str()], Some(&mut fetch_options()), None)
            .map_err(|e| classify(&self.url, Some(branch), e))?;
        Ok(())
    }

    fn checkout_tip(&self, repo: &Repository, branch: &str) -> Result<CommitInfo> {
        let reference =
            repo.find_reference(&tracking_ref(branch))
                .map_err(|_| Error::BranchNotFound {
                    name: branch.to_string(),
                    url: self.url.clone(),
                })?;
        let commit = reference.peel_to_commit()?;

        let mut checkout = CheckoutBuilder::new();
        checkout.force().remove_untracked(true);
        repo.checkout_tree(commit.as_object(), Some(&mut checkout))?;
        repo.set_head_detached(commit.id())?;

        Ok(CommitInfo::from_commit(&commit))
    }
}

fn tracking_ref(branch: &str) -> String {
    format!("refs/remotes/{ORIGIN}/{branch}")
}
