// src/report.rs

//! Result documents handed to the downstream analysis, keyed by project.

use crate::error::ReportError;
use crate::model::{BurstResult, Commit, CommitId, ProjectId};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// One commit picked for analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SamplePoint {
    pub commit_id: CommitId,
    pub committed_at: DateTime<FixedOffset>,
}

impl From<&Commit> for SamplePoint {
    fn from(commit: &Commit) -> Self {
        Self {
            commit_id: commit.id.clone(),
            committed_at: commit.committed_at,
        }
    }
}

/// `{project_id: {sample_index: {commit_id, committed_at}}}`
pub type SampleDocument = BTreeMap<ProjectId, BTreeMap<usize, SamplePoint>>;

/// Last commit of a project at its group's milestone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MilestoneCommit {
    pub project_id: ProjectId,
    pub milestone_date: NaiveDate,
    pub last_commit_id: Option<CommitId>,
}

/// `{project_id: {project_id, milestone_date, last_commit_id}}`
pub type MilestoneDocument = BTreeMap<ProjectId, MilestoneCommit>;

/// `{project_id: {milestone_week, burst_day, commits_on_burst_day, pause_detected, status, last_commit_of_burst}}`
pub type BurstDocument = BTreeMap<ProjectId, BurstResult>;

/// Numbers samples from 0 in the order given.
pub fn indexed<'a>(commits: impl IntoIterator<Item = &'a Commit>) -> BTreeMap<usize, SamplePoint> {
    commits.into_iter().map(SamplePoint::from).enumerate().collect()
}

/// Writes `document` as pretty-printed JSON, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, document: &T) -> Result<(), ReportError> {
    let io_error = |source: std::io::Error| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    let json = serde_json::to_string_pretty(document)?;
    fs::write(path, json).map_err(io_error)?;
    tracing::info!(path = %path.display(), "wrote report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn commit(id: &str, hour: u32) -> Commit {
        let offset = FixedOffset::east_opt(3600).unwrap();
        Commit {
            id: CommitId::new(id),
            committed_at: offset.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap(),
            author: None,
        }
    }

    #[test]
    fn sample_document_shape() {
        let commits = [commit("abc", 9), commit("def", 17)];
        let mut document = SampleDocument::new();
        document.insert(ProjectId::from_numeric(7), indexed(&commits));

        let value = serde_json::to_value(&document).unwrap();
        assert_eq!(
            value,
            json!({
                "7": {
                    "0": {"commit_id": "abc", "committed_at": "2024-05-01T09:00:00+01:00"},
                    "1": {"commit_id": "def", "committed_at": "2024-05-01T17:00:00+01:00"}
                }
            })
        );
    }

    #[test]
    fn milestone_document_shape() {
        let id = ProjectId::from_numeric(3);
        let mut document = MilestoneDocument::new();
        document.insert(
            id.clone(),
            MilestoneCommit {
                project_id: id,
                milestone_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                last_commit_id: None,
            },
        );
        let value = serde_json::to_value(&document).unwrap();
        assert_eq!(
            value,
            json!({"3": {"project_id": "3", "milestone_date": "2024-03-01", "last_commit_id": null}})
        );
    }

    #[test]
    fn write_json_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.json");
        write_json(&path, &json!({"ok": true})).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"ok\": true"));
    }
}
