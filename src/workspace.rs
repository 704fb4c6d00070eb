// src/workspace.rs

use crate::error::{ConfigError, FetchError};
use crate::history::GitHistory;
use crate::model::ProjectId;
use git2::Repository;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Repository list file: `{"repos": [{"repo": "<url or path>", "tags": [...]}]}`
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryList {
    pub repos: Vec<RepositoryEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryEntry {
    /// Clone URL, or the path of an existing checkout
    pub repo: String,
    /// Release tags to sample, in order; empty means pick tags automatically
    #[serde(default)]
    pub tags: Vec<String>,
}

impl RepositoryEntry {
    pub fn new(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            tags: Vec::new(),
        }
    }

    fn local_path(&self) -> Option<&Path> {
        let path = Path::new(&self.repo);
        path.is_dir().then_some(path)
    }

    pub fn project_id(&self) -> Option<ProjectId> {
        match self.local_path() {
            Some(path) => ProjectId::from_path(&path.canonicalize().unwrap_or_else(|_| path.to_path_buf())),
            None => ProjectId::from_repo_url(&self.repo),
        }
    }
}

pub fn load_repository_list(path: &Path) -> Result<RepositoryList, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::RepositoryList {
        path: path.to_path_buf(),
        source,
    })
}

/// Where remote repositories are cloned to, one directory per project.
#[derive(Debug, Clone)]
pub struct Workspace {
    clone_dir: PathBuf,
}

impl Workspace {
    pub fn new(clone_dir: impl Into<PathBuf>) -> Self {
        Self {
            clone_dir: clone_dir.into(),
        }
    }

    pub fn checkout_path(&self, project: &ProjectId) -> PathBuf {
        self.clone_dir.join(project.as_str())
    }

    /// Opens a local checkout in place, or clones the URL unless a clone
    /// already exists. Existing clones are not updated.
    pub fn open(&self, entry: &RepositoryEntry, project: &ProjectId) -> Result<GitHistory, FetchError> {
        if let Some(path) = entry.local_path() {
            return GitHistory::open(path);
        }

        let dest = self.checkout_path(project);
        if dest.exists() {
            tracing::debug!(project = %project, path = %dest.display(), "using existing clone");
            return GitHistory::open(&dest);
        }

        fs::create_dir_all(&self.clone_dir)?;
        tracing::info!(project = %project, url = %entry.repo, "cloning repository");
        let repo = Repository::clone(&entry.repo, &dest)?;
        Ok(GitHistory::from_repository(repo))
    }
}
