//! Shared test utilities for integration tests
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use commit_sampler::error::FetchError;
use commit_sampler::hosting::HostingApi;
use commit_sampler::model::{Commit, GroupId, Milestone, ProjectId};
use git2::{Oid, Repository, Signature, Time};
use tempfile::TempDir;

/// First commit time used by [`RepoBuilder`]: 2023-11-14T22:13:20Z
pub const START_TIME: i64 = 1_700_000_000;
pub const DAY: i64 = 86_400;

/// Builds a real git repository in a temp directory, one commit per day
pub struct RepoBuilder {
    temp_dir: TempDir,
    repo: Repository,
    next_time: i64,
}

impl RepoBuilder {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let repo = Repository::init(temp_dir.path()).expect("Failed to init repository");
        Self {
            temp_dir,
            repo,
            next_time: START_TIME,
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    /// Writes `files` (path, contents) and commits them on top of HEAD
    pub fn commit(&mut self, files: &[(&str, &str)], message: &str) -> Oid {
        let time = self.next_time;
        self.next_time += DAY;
        self.commit_at(time, files, message)
    }

    /// Like [`RepoBuilder::commit`] with an explicit commit time in seconds
    pub fn commit_at(&mut self, time: i64, files: &[(&str, &str)], message: &str) -> Oid {
        let mut index = self.repo.index().expect("Failed to open index");
        for (path, contents) in files {
            let full = self.temp_dir.path().join(path);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent).expect("Failed to create dirs");
            }
            fs::write(&full, contents).expect("Failed to write file");
            index.add_path(Path::new(path)).expect("Failed to stage file");
        }
        index.write().expect("Failed to write index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let signature =
            Signature::new("Test Author", "test@example.com", &Time::new(time, 0)).expect("Failed to create signature");

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        self.repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .expect("Failed to commit")
    }

    /// `count` commits each touching `file`
    pub fn commits(&mut self, count: usize, file: &str) -> Vec<Oid> {
        (0..count)
            .map(|i| {
                let contents = format!("revision {i}");
                self.commit(&[(file, contents.as_str())], &format!("change {i}"))
            })
            .collect()
    }

    pub fn lightweight_tag(&self, name: &str, oid: Oid) {
        let object = self.repo.find_object(oid, None).expect("Failed to find object");
        self.repo.tag_lightweight(name, &object, false).expect("Failed to tag");
    }

    pub fn annotated_tag(&self, name: &str, oid: Oid) {
        let object = self.repo.find_object(oid, None).expect("Failed to find object");
        let tagger = Signature::now("Release Bot", "bot@example.com").expect("Failed to create signature");
        self.repo
            .tag(name, &object, &tagger, &format!("Release {name}"), false)
            .expect("Failed to tag");
    }
}

/// In-memory hosting API
#[derive(Default)]
pub struct FakeHosting {
    pub subgroups: HashMap<GroupId, Vec<GroupId>>,
    pub projects: HashMap<GroupId, Vec<ProjectId>>,
    pub milestones: HashMap<ProjectId, Vec<Milestone>>,
    pub commits: HashMap<ProjectId, Vec<Commit>>,
    /// Projects whose every request fails
    pub failing: HashSet<ProjectId>,
}

impl FakeHosting {
    fn check(&self, project: &ProjectId) -> Result<(), FetchError> {
        if self.failing.contains(project) {
            return Err(FetchError::Status {
                url: format!("projects/{project}"),
                status: 500,
            });
        }
        Ok(())
    }
}

impl HostingApi for FakeHosting {
    fn subgroups(&self, group: &GroupId) -> Result<Vec<GroupId>, FetchError> {
        Ok(self.subgroups.get(group).cloned().unwrap_or_default())
    }

    fn group_projects(&self, group: &GroupId, include_subgroups: bool) -> Result<Vec<ProjectId>, FetchError> {
        let mut projects = self.projects.get(group).cloned().unwrap_or_default();
        if include_subgroups {
            for subgroup in self.subgroups.get(group).into_iter().flatten() {
                projects.extend(self.group_projects(subgroup, true)?);
            }
        }
        Ok(projects)
    }

    fn milestones(&self, project: &ProjectId) -> Result<Vec<Milestone>, FetchError> {
        self.check(project)?;
        Ok(self.milestones.get(project).cloned().unwrap_or_default())
    }

    fn commits(
        &self,
        project: &ProjectId,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<Commit>, FetchError> {
        self.check(project)?;
        let mut commits: Vec<Commit> = self
            .commits
            .get(project)
            .into_iter()
            .flatten()
            .filter(|c| since.map_or(true, |s| c.committed_at >= s))
            .filter(|c| until.map_or(true, |u| c.committed_at <= u))
            .cloned()
            .collect();
        commits.sort_by(|a, b| b.committed_at.cmp(&a.committed_at));
        Ok(commits)
    }
}
