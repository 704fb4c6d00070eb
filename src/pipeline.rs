// src/pipeline.rs

//! Batch drivers. Each repository or project is processed independently and
//! in parallel; a failure is logged and only drops that one item.

use crate::burst::{detect_for_project, BurstConfig};
use crate::error::FetchError;
use crate::history::HistoryProvider;
use crate::hosting::HostingApi;
use crate::milestone::{last_commit_before, resolve_across, MilestoneConfig};
use crate::model::{Commit, GroupId, ProjectId, SampleCount, SampleRequest, Tag};
use crate::report::{indexed, BurstDocument, MilestoneCommit, MilestoneDocument, SampleDocument, SamplePoint};
use crate::sampling::{sample_bounded, sample_tags};
use crate::workspace::{RepositoryEntry, Workspace};
use indicatif::{ParallelProgressIterator, ProgressBar};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap, HashSet};

fn progress(len: usize, message: &'static str) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    bar.set_message(message);
    bar
}

/// Spaced sample of one repository's history.
///
/// `Ok(None)` when the history is empty or no commit satisfies the
/// request's adoption boundary.
pub fn spaced_for_history<H: HistoryProvider + ?Sized>(
    history: &H,
    request: &SampleRequest,
) -> Result<Option<Vec<Commit>>, FetchError> {
    let commits = history.commits()?;
    if commits.is_empty() {
        return Ok(None);
    }

    let start = match &request.boundary {
        Some(predicate) => match predicate.find_in(history, &commits) {
            Some(index) => index,
            None => return Ok(None),
        },
        None => 0,
    };

    let picked = sample_bounded(&commits[start..], request);
    Ok((!picked.is_empty()).then_some(picked))
}

/// Tag-based sample of one repository.
///
/// With `names`, exactly those tags are used and keep their list position as
/// sample index; missing names are logged and leave a gap. Without, tags are
/// spread over the tag timeline. `Ok(None)` when nothing could be picked.
pub fn tags_for_history<H: HistoryProvider + ?Sized>(
    history: &H,
    names: &[String],
    count: SampleCount,
) -> Result<Option<BTreeMap<usize, SamplePoint>>, FetchError> {
    let tags = history.tags()?;

    if names.is_empty() {
        return Ok(sample_tags(tags, count).map(|commits| indexed(&commits)));
    }

    let by_name: HashMap<&str, &Tag> = tags.iter().map(|t| (t.name.as_str(), t)).collect();
    let mut points = BTreeMap::new();
    for (index, name) in names.iter().enumerate() {
        match by_name.get(name.as_str()) {
            Some(tag) => {
                points.insert(index, SamplePoint::from(&tag.commit));
            }
            None => tracing::warn!(tag = %name, "tag not found"),
        }
    }
    Ok((!points.is_empty()).then_some(points))
}

fn with_project<T>(entry: &RepositoryEntry, f: impl FnOnce(&ProjectId) -> Result<Option<T>, FetchError>) -> Option<(ProjectId, T)> {
    let Some(project) = entry.project_id() else {
        tracing::warn!(repo = %entry.repo, "cannot derive a project id, skipping");
        return None;
    };
    match f(&project) {
        Ok(Some(value)) => Some((project, value)),
        Ok(None) => {
            tracing::info!(project = %project, "nothing to sample, skipping");
            None
        }
        Err(e) => {
            tracing::warn!(project = %project, error = %e, "failed to sample repository");
            None
        }
    }
}

/// Spaced samples for every listed repository.
pub fn spaced_samples(entries: &[RepositoryEntry], workspace: &Workspace, request: &SampleRequest) -> SampleDocument {
    let bar = progress(entries.len(), "Sampling commits");
    let document = entries
        .par_iter()
        .progress_with(bar.clone())
        .filter_map(|entry| {
            with_project(entry, |project| {
                let history = workspace.open(entry, project)?;
                let picked = spaced_for_history(&history, request)?;
                Ok(picked.map(|commits| indexed(&commits)))
            })
        })
        .collect();
    bar.finish_with_message("Sampling complete");
    document
}

/// Tag samples for every listed repository.
pub fn tag_samples(entries: &[RepositoryEntry], workspace: &Workspace, count: SampleCount) -> SampleDocument {
    let bar = progress(entries.len(), "Sampling tags");
    let document = entries
        .par_iter()
        .progress_with(bar.clone())
        .filter_map(|entry| {
            with_project(entry, |project| {
                let history = workspace.open(entry, project)?;
                tags_for_history(&history, &entry.tags, count)
            })
        })
        .collect();
    bar.finish_with_message("Sampling complete");
    document
}

/// Projects of `group` plus those of its direct subgroups, without duplicates.
pub fn collect_projects<A: HostingApi + ?Sized>(api: &A, group: &GroupId) -> Result<Vec<ProjectId>, FetchError> {
    let mut projects = api.group_projects(group, false)?;
    match api.subgroups(group) {
        Ok(subgroups) => {
            for subgroup in subgroups {
                match api.group_projects(&subgroup, false) {
                    Ok(found) => projects.extend(found),
                    Err(e) => tracing::warn!(group = %subgroup, error = %e, "failed to list projects"),
                }
            }
        }
        Err(e) => tracing::warn!(group = %group, error = %e, "failed to list subgroups"),
    }

    let mut seen = HashSet::new();
    projects.retain(|p| seen.insert(p.clone()));
    Ok(projects)
}

/// Last commit at each subgroup's milestone, for every project under `root`.
///
/// Each direct subgroup of `root` (or `root` itself when it has none) gets
/// one milestone date, the best match across its projects. Subgroups without
/// an accepted match are skipped.
pub fn milestone_commits<A: HostingApi + Sync + ?Sized>(
    api: &A,
    root: &GroupId,
    config: &MilestoneConfig,
) -> Result<MilestoneDocument, FetchError> {
    let mut groups = api.subgroups(root)?;
    if groups.is_empty() {
        groups.push(root.clone());
    }

    let mut document = MilestoneDocument::new();
    for group in groups {
        tracing::info!(group = %group, keywords = ?config.keywords, "analyzing group");
        let projects = match collect_projects(api, &group) {
            Ok(projects) => projects,
            Err(e) => {
                tracing::warn!(group = %group, error = %e, "failed to list projects");
                continue;
            }
        };

        let Some(date) = resolve_across(api, &projects, config).and_then(|m| m.due_date()) else {
            tracing::info!(group = %group, "no milestone match");
            continue;
        };

        let bar = progress(projects.len(), "Finding milestone commits");
        let found: Vec<(ProjectId, MilestoneCommit)> = projects
            .par_iter()
            .progress_with(bar.clone())
            .filter_map(|project| match last_commit_before(api, project, date) {
                Ok(last_commit_id) => Some((
                    project.clone(),
                    MilestoneCommit {
                        project_id: project.clone(),
                        milestone_date: date,
                        last_commit_id,
                    },
                )),
                Err(e) => {
                    tracing::warn!(project = %project, error = %e, "failed to fetch commits");
                    None
                }
            })
            .collect();
        bar.finish_and_clear();
        document.extend(found);
    }

    Ok(document)
}

/// Burst-pause detection for each project.
pub fn bursts_for_projects<A: HostingApi + Sync + ?Sized>(
    api: &A,
    projects: &[ProjectId],
    config: &BurstConfig,
) -> BurstDocument {
    let bar = progress(projects.len(), "Detecting bursts");
    let document = projects
        .par_iter()
        .progress_with(bar.clone())
        .filter_map(|project| match detect_for_project(api, project, config) {
            Ok(result) => {
                tracing::info!(project = %project, status = %result.status, "analyzed project");
                Some((project.clone(), result))
            }
            Err(e) => {
                tracing::warn!(project = %project, error = %e, "failed to detect burst");
                None
            }
        })
        .collect();
    bar.finish_with_message("Detection complete");
    document
}
