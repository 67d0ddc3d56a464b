use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, TimeZone};
use git2::{ErrorCode, Repository, Sort};
use log::{debug, error, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::model::CommitInfo;

/// Validate that the given path is an accessible git repository
/// Returns a Repository handle if valid, error otherwise
pub fn validate_git_repository_handle<P: AsRef<Path>>(path: P) -> Result<Repository> {
    let path = path.as_ref();
    debug!("Validating git repository handle at: {}", path.display());

    if !path.exists() {
        error!("Path does not exist: {}", path.display());
        anyhow::bail!("Path does not exist: {}", path.display());
    }

    let repo = Repository::open(path)
        .with_context(|| format!("Failed to open repository at: {}", path.display()))?;

    if repo.is_bare() {
        debug!("Repository is bare: {}", path.display());
    }

    Ok(repo)
}

/// Read-only handle on the repository whose history is mined
pub struct RepositoryHandle {
    repository: Repository,
    path: PathBuf,
}

impl RepositoryHandle {
    /// Open a repository from a path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = validate_git_repository_handle(path)?;
        Ok(Self::from_repository(repo))
    }

    /// Create a handle from an existing Repository
    pub fn from_repository(repository: Repository) -> Self {
        let path = repository
            .workdir()
            .unwrap_or_else(|| repository.path())
            .to_path_buf();

        Self { repository, path }
    }

    /// Get the repository path as a string
    pub fn path(&self) -> String {
        self.path.to_string_lossy().to_string()
    }

    pub fn is_bare(&self) -> bool {
        self.repository.is_bare()
    }

    /// Walk the history reachable from HEAD, newest first.
    ///
    /// Commit times are converted to the local calendar date. An empty
    /// repository (unborn HEAD) yields no commits.
    pub fn read_commit_log(&self) -> Result<Vec<Arc<CommitInfo>>> {
        let repo = &self.repository;

        match repo.head() {
            Ok(_) => {}
            Err(e) if e.code() == ErrorCode::UnbornBranch => {
                info!("Repository at {} has no commits", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to resolve HEAD of {}", self.path.display()));
            }
        }

        let mut revwalk = repo.revwalk()
            .context("Failed to create repository walker")?;
        revwalk.set_sorting(Sort::TIME)
            .context("Failed to set revwalk sorting")?;
        revwalk.push_head()
            .context("Failed to push HEAD to revwalk")?;

        let mut commits = Vec::new();
        for oid_result in revwalk {
            let oid = oid_result.context("Failed to get commit OID")?;
            let commit = repo.find_commit(oid)
                .with_context(|| format!("Failed to find commit {}", oid))?;

            let author = commit.author();
            let commit_date = local_date(commit.time().seconds())
                .with_context(|| format!("Commit {} has an out of range timestamp", oid))?;

            commits.push(Arc::new(CommitInfo::new(
                oid.to_string(),
                author.name().unwrap_or("Unknown"),
                author.email().unwrap_or(""),
                commit_date,
                String::from_utf8_lossy(commit.message_bytes()),
            )));

            if commits.len() % 1000 == 0 {
                debug!("Read {} commits", commits.len());
            }
        }

        info!("Read {} commits from {}", commits.len(), self.path.display());
        Ok(commits)
    }
}

/// Local calendar date of an epoch timestamp
pub fn local_date(epoch_seconds: i64) -> Option<NaiveDate> {
    Local
        .timestamp_opt(epoch_seconds, 0)
        .earliest()
        .map(|dt| dt.date_naive())
}
