// src/history.rs

use crate::error::FetchError;
use crate::model::{Commit, CommitId, Tag};
use chrono::{DateTime, FixedOffset, Offset, TimeZone, Utc};
use git2::{ErrorCode, ObjectType, Oid, Repository, Sort, TreeWalkMode, TreeWalkResult};
use std::collections::BTreeSet;
use std::path::Path;

/// A file read out of one commit's tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeFile {
    pub path: String,
    pub contents: String,
}

/// Read-only access to one repository's history.
pub trait HistoryProvider {
    /// Commits reachable from HEAD, oldest first.
    fn commits(&self) -> Result<Vec<Commit>, FetchError>;

    /// One entry per tag name, in no particular order.
    fn tags(&self) -> Result<Vec<Tag>, FetchError>;

    /// Files in the commit's tree whose path ends with `suffix` (case-insensitive).
    fn files_with_suffix(&self, commit: &CommitId, suffix: &str) -> Result<Vec<TreeFile>, FetchError>;

    /// Commits at or before `until`, most recent first.
    fn commits_until(&self, until: DateTime<Utc>) -> Result<Vec<Commit>, FetchError> {
        let mut commits = self.commits()?;
        commits.retain(|c| c.committed_at <= until);
        commits.reverse();
        Ok(commits)
    }
}

/// History provider backed by a local git repository.
pub struct GitHistory {
    repo: Repository,
}

impl GitHistory {
    pub fn open(path: &Path) -> Result<Self, FetchError> {
        Ok(Self { repo: Repository::open(path)? })
    }

    pub fn from_repository(repo: Repository) -> Self {
        Self { repo }
    }
}

impl HistoryProvider for GitHistory {
    fn commits(&self) -> Result<Vec<Commit>, FetchError> {
        let mut revwalk = self.repo.revwalk()?;
        match revwalk.push_head() {
            Ok(()) => {}
            // Freshly initialised repository, nothing committed yet
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                return Ok(Vec::new())
            }
            Err(e) => return Err(e.into()),
        }
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;

        let mut commits = Vec::new();
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            commits.push(to_commit(&commit)?);
        }
        commits.reverse(); // Walk from the first commit to the last
        Ok(commits)
    }

    fn tags(&self) -> Result<Vec<Tag>, FetchError> {
        let names = self.repo.tag_names(None)?;
        let names: BTreeSet<&str> = names.iter().flatten().collect();

        let mut tags = Vec::with_capacity(names.len());
        for name in names {
            let target = self
                .repo
                .revparse_single(&format!("refs/tags/{name}"))
                .and_then(|obj| obj.peel_to_commit());
            match target.map_err(FetchError::from).and_then(|commit| to_commit(&commit)) {
                Ok(commit) => tags.push(Tag {
                    name: name.to_string(),
                    commit,
                }),
                // Tags on trees or blobs, or commits with unreadable times
                Err(e) => tracing::debug!(tag = name, error = %e, "skipping tag without a usable commit"),
            }
        }
        Ok(tags)
    }

    fn files_with_suffix(&self, commit: &CommitId, suffix: &str) -> Result<Vec<TreeFile>, FetchError> {
        let commit = self.repo.find_commit(Oid::from_str(commit.as_str())?)?;
        let tree = commit.tree()?;
        let suffix = suffix.to_lowercase();

        let mut matches: Vec<(String, Oid)> = Vec::new();
        tree.walk(TreeWalkMode::PreOrder, |root, entry| {
            if entry.kind() == Some(ObjectType::Blob) {
                if let Some(name) = entry.name() {
                    if name.to_lowercase().ends_with(&suffix) {
                        matches.push((format!("{root}{name}"), entry.id()));
                    }
                }
            }
            TreeWalkResult::Ok
        })?;

        let mut files = Vec::with_capacity(matches.len());
        for (path, oid) in matches {
            let blob = self.repo.find_blob(oid)?;
            files.push(TreeFile {
                path,
                contents: String::from_utf8_lossy(blob.content()).into_owned(),
            });
        }
        Ok(files)
    }
}

fn to_commit(commit: &git2::Commit) -> Result<Commit, FetchError> {
    let time = commit.time();
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60)
        .unwrap_or_else(|| Utc.fix());
    let committed_at = Utc
        .timestamp_opt(time.seconds(), 0)
        .single()
        .ok_or_else(|| git2::Error::from_str("commit time out of range"))?
        .with_timezone(&offset);

    Ok(Commit {
        id: commit.id().into(),
        committed_at,
        author: commit.author().name().map(String::from),
    })
}
