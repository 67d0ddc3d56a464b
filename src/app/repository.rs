//! Repository path resolution and validation

use anyhow::{Context, Result};
use git2::Repository;
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Resolve the repository to analyse.
///
/// An explicit path must exist and be a git repository; otherwise the
/// current directory (or a parent of it) must be one.
pub fn resolve_repository_path(repository: Option<&Path>) -> Result<PathBuf> {
    match repository {
        Some(path) => {
            debug!("Repository path provided: {}", path.display());
            let path_buf = expand_home(path);

            if !path_buf.exists() {
                anyhow::bail!(
                    "Directory does not exist: {}\n\nPlease check the path and try again.",
                    path_buf.display()
                );
            }

            Repository::open(&path_buf)
                .with_context(|| format!(
                    "Not a valid git repository: {}\n\nMake sure this directory contains a git repository.",
                    path_buf.display()
                ))?;

            path_buf.canonicalize()
                .with_context(|| format!("Failed to resolve canonical path for: {}", path_buf.display()))
        }
        None => {
            debug!("No repository path provided, using current directory");
            let current_dir = std::env::current_dir()
                .context("Failed to get current directory")?;

            let repo = Repository::discover(&current_dir)
                .with_context(|| format!(
                    "Current directory '{}' is not a git repository.\n\nSpecify a repository path: defectset --repo /path/to/repo",
                    current_dir.display()
                ))?;

            let root = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();
            info!("Using git repository: {}", root.display());
            Ok(root)
        }
    }
}

/// Expand a leading `~/` to the home directory
fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_existing_repository() {
        let temp_dir = TempDir::new().unwrap();
        Repository::init(temp_dir.path()).unwrap();

        let resolved = resolve_repository_path(Some(temp_dir.path())).unwrap();
        assert_eq!(resolved, temp_dir.path().canonicalize().unwrap());
    }

    #[test]
    fn test_resolve_missing_directory() {
        let error = resolve_repository_path(Some(Path::new("/definitely/not/here"))).unwrap_err();
        assert!(error.to_string().contains("Directory does not exist"));
    }

    #[test]
    fn test_resolve_plain_directory() {
        let temp_dir = TempDir::new().unwrap();
        let error = resolve_repository_path(Some(temp_dir.path())).unwrap_err();
        assert!(error.to_string().contains("Not a valid git repository"));
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home(Path::new("/abs/path")), PathBuf::from("/abs/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home(Path::new("~/src")), home.join("src"));
        }
    }
}
