// src/model.rs

use crate::boundary::ManifestPredicate;
use crate::error::ConfigError;
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Content-addressed commit hash, stored as its hex form
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<git2::Oid> for CommitId {
    fn from(oid: git2::Oid) -> Self {
        Self(oid.to_string())
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Commit metadata. The file tree is reached through the history provider by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub id: CommitId,
    /// Keeps the author's UTC offset, so `day()` is the calendar day they saw
    pub committed_at: DateTime<FixedOffset>,
    pub author: Option<String>,
}

impl Commit {
    pub fn day(&self) -> NaiveDate {
        self.committed_at.date_naive()
    }
}

/// A named pointer to one commit; its date is the commit's timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub commit: Commit,
}

impl Tag {
    pub fn date(&self) -> DateTime<FixedOffset> {
        self.commit.committed_at
    }
}

/// Opaque key identifying one tracked project in every result document.
///
/// Construction rules:
/// - numeric hosting ids become their decimal form (`42` -> `"42"`)
/// - repository URLs become `owner_name` from the first two path segments,
///   with a trailing `.git` removed
/// - local checkouts use their directory name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn from_numeric(id: u64) -> Self {
        Self(id.to_string())
    }

    pub fn from_repo_url(url: &str) -> Option<Self> {
        let path = match url.split_once("://") {
            Some((_, rest)) => rest.split_once('/')?.1,
            // scp-like `git@host:owner/name.git`
            None => url.split_once(':')?.1,
        };
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let owner = segments.next()?;
        let name = segments.next()?;
        let name = name.strip_suffix(".git").unwrap_or(name);
        if name.is_empty() {
            return None;
        }
        Some(Self(format!("{owner}_{name}")))
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        Some(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hosting group path (or numeric id), e.g. `course-2024/team-a`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(group: impl Into<String>) -> Self {
        Self(group.into())
    }

    pub fn nested(group: &str, subgroup: Option<&str>) -> Self {
        match subgroup.filter(|s| !s.is_empty()) {
            Some(sub) => Self(format!("{group}/{sub}")),
            None => Self(group.to_string()),
        }
    }

    pub fn from_numeric(id: u64) -> Self {
        Self(id.to_string())
    }

    /// Form usable as a single URL path segment
    pub fn encoded(&self) -> String {
        self.0.replace('/', "%2F")
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A planning record from the issue tracker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Milestone {
    pub title: String,
    pub due_date: Option<NaiveDate>,
}

/// A milestone accepted by the resolver, with the keyword that matched it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestoneMatch {
    pub milestone: Milestone,
    pub keyword: String,
    pub score: u8,
}

impl MilestoneMatch {
    /// Always present: milestones without a due date never match
    pub fn due_date(&self) -> Option<NaiveDate> {
        self.milestone.due_date
    }
}

/// Number of sample points requested, always at least 2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleCount(usize);

impl SampleCount {
    pub fn get(self) -> usize {
        self.0
    }
}

impl TryFrom<usize> for SampleCount {
    type Error = ConfigError;

    fn try_from(count: usize) -> Result<Self, Self::Error> {
        if count < 2 {
            return Err(ConfigError::InvalidSampleCount(count));
        }
        Ok(Self(count))
    }
}

/// How interior sample points are placed
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Spacing {
    /// `i * floor(L / (N - 1))`; the final gap may be short
    #[default]
    FixedStride,
    /// `round(i * (L - 1) / (N - 1))`
    Uniform,
}

/// Everything needed to pick sample commits from one repository
#[derive(Debug, Clone)]
pub struct SampleRequest {
    pub count: SampleCount,
    /// Commits before the first one satisfying this are ignored
    pub boundary: Option<ManifestPredicate>,
    /// Leading commits to drop after the boundary
    pub skip: usize,
    /// Keep only this many trailing commits
    pub window: Option<usize>,
    pub spacing: Spacing,
}

impl SampleRequest {
    pub fn new(count: SampleCount) -> Self {
        Self {
            count,
            boundary: None,
            skip: 0,
            window: None,
            spacing: Spacing::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BurstStatus {
    #[serde(rename = "Confirmed Milestone")]
    ConfirmedMilestone,
    #[serde(rename = "No Milestone")]
    NoMilestone,
}

impl fmt::Display for BurstStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BurstStatus::ConfirmedMilestone => f.write_str("Confirmed Milestone"),
            BurstStatus::NoMilestone => f.write_str("No Milestone"),
        }
    }
}

/// Terminal states of one burst-pause detection run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstOutcome {
    NoBurst,
    PauseConfirmed,
    PauseNotConfirmed,
}

/// Result of one burst-pause detection over one project and week
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BurstResult {
    pub milestone_week: NaiveDate,
    pub burst_day: Option<NaiveDate>,
    pub commits_on_burst_day: usize,
    pub pause_detected: bool,
    pub status: BurstStatus,
    pub last_commit_of_burst: Option<CommitId>,
}

impl BurstResult {
    pub fn no_burst(milestone_week: NaiveDate) -> Self {
        Self {
            milestone_week,
            burst_day: None,
            commits_on_burst_day: 0,
            pause_detected: false,
            status: BurstStatus::NoMilestone,
            last_commit_of_burst: None,
        }
    }

    pub fn burst(
        milestone_week: NaiveDate,
        burst_day: NaiveDate,
        commits_on_burst_day: usize,
        last_commit_of_burst: CommitId,
        pause_detected: bool,
    ) -> Self {
        let status = if pause_detected {
            BurstStatus::ConfirmedMilestone
        } else {
            BurstStatus::NoMilestone
        };
        Self {
            milestone_week,
            burst_day: Some(burst_day),
            commits_on_burst_day,
            pause_detected,
            status,
            last_commit_of_burst: Some(last_commit_of_burst),
        }
    }

    pub fn outcome(&self) -> BurstOutcome {
        match (self.burst_day, self.pause_detected) {
            (None, _) => BurstOutcome::NoBurst,
            (Some(_), true) => BurstOutcome::PauseConfirmed,
            (Some(_), false) => BurstOutcome::PauseNotConfirmed,
        }
    }
}
