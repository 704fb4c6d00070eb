// src/milestone.rs

//! Anchoring a point in time by fuzzy-matching milestone titles against
//! keywords, then finding the last commit at or before the milestone's due date.

use crate::error::FetchError;
use crate::hosting::HostingApi;
use crate::model::{CommitId, Milestone, MilestoneMatch, ProjectId};
use crate::similarity::partial_ratio;
use chrono::NaiveDate;

/// A match must score strictly above this to be accepted.
pub const DEFAULT_ACCEPTANCE_THRESHOLD: u8 = 70;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestoneConfig {
    pub keywords: Vec<String>,
    pub threshold: u8,
}

impl MilestoneConfig {
    pub fn new(keywords: Vec<String>) -> Self {
        Self {
            keywords,
            threshold: DEFAULT_ACCEPTANCE_THRESHOLD,
        }
    }
}

/// Best-scoring milestone for any of the keywords.
///
/// Milestones without a due date are skipped. A pair only replaces the
/// current best when its score is strictly greater than both the threshold
/// and the best so far, so on equal scores the pair evaluated first wins.
/// That makes the result depend on the order milestones were listed in.
pub fn resolve(milestones: &[Milestone], config: &MilestoneConfig) -> Option<MilestoneMatch> {
    let mut best: Option<MilestoneMatch> = None;

    for milestone in milestones.iter().filter(|m| m.due_date.is_some()) {
        for keyword in &config.keywords {
            let score = partial_ratio(&milestone.title, keyword);
            let best_score = best.as_ref().map_or(0, |b| b.score);
            if score > config.threshold && score > best_score {
                best = Some(MilestoneMatch {
                    milestone: milestone.clone(),
                    keyword: keyword.clone(),
                    score,
                });
            }
        }
    }

    best
}

/// Keeps the highest-scoring candidate; earlier candidates win ties.
pub fn best_match(candidates: impl IntoIterator<Item = MilestoneMatch>) -> Option<MilestoneMatch> {
    candidates.into_iter().fold(None, |best, candidate| match best {
        Some(best) if candidate.score <= best.score => Some(best),
        _ => Some(candidate),
    })
}

/// Resolves the milestone shared by a set of projects.
///
/// Projects whose milestones cannot be fetched are logged and ignored.
pub fn resolve_across<A: HostingApi + ?Sized>(
    api: &A,
    projects: &[ProjectId],
    config: &MilestoneConfig,
) -> Option<MilestoneMatch> {
    let candidates = projects.iter().filter_map(|project| match api.milestones(project) {
        Ok(milestones) => resolve(&milestones, config),
        Err(e) => {
            tracing::warn!(project = %project, error = %e, "failed to fetch milestones");
            None
        }
    });
    best_match(candidates)
}

/// Most recent commit of `project` on or before `date` (inclusive of the whole day).
///
/// `Ok(None)` when the project has no commits in that range.
pub fn last_commit_before<A: HostingApi + ?Sized>(
    api: &A,
    project: &ProjectId,
    date: NaiveDate,
) -> Result<Option<CommitId>, FetchError> {
    let until = date
        .succ_opt()
        .unwrap_or(date)
        .and_hms_opt(0, 0, 0)
        .map(|t| t.and_utc())
        .unwrap_or_default();

    let commits = api.commits(project, None, Some(until))?;
    Ok(commits
        .into_iter()
        .find(|c| c.committed_at < until)
        .map(|c| c.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn milestone(title: &str, due: Option<(i32, u32, u32)>) -> Milestone {
        Milestone {
            title: title.to_string(),
            due_date: due.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
        }
    }

    fn config(keywords: &[&str]) -> MilestoneConfig {
        MilestoneConfig::new(keywords.iter().map(|k| k.to_string()).collect())
    }

    #[test]
    fn picks_the_matching_milestone() {
        let milestones = [
            milestone("Sprint 1 Review", Some((2024, 3, 1))),
            milestone("Unrelated", Some((2024, 2, 1))),
        ];
        let found = resolve(&milestones, &config(&["sprint1"])).unwrap();
        assert_eq!(found.due_date(), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert!(found.score > DEFAULT_ACCEPTANCE_THRESHOLD);
    }

    #[test]
    fn equal_scores_keep_the_first_seen() {
        let milestones = [
            milestone("Sprint 1 Demo", Some((2024, 3, 8))),
            milestone("Sprint 1 Final", Some((2024, 3, 15))),
        ];
        let found = resolve(&milestones, &config(&["sprint1"])).unwrap();
        assert_eq!(found.milestone.title, "Sprint 1 Demo");
    }

    #[test]
    fn milestones_without_due_date_are_skipped() {
        let milestones = [
            milestone("sprint1", None),
            milestone("Sprint 1 Review", Some((2024, 3, 1))),
        ];
        let found = resolve(&milestones, &config(&["sprint1"])).unwrap();
        assert_eq!(found.milestone.title, "Sprint 1 Review");
    }

    #[test]
    fn nothing_above_threshold_is_absent() {
        let milestones = [milestone("Unrelated", Some((2024, 2, 1)))];
        assert!(resolve(&milestones, &config(&["sprint1"])).is_none());
        assert!(resolve(&[], &config(&["sprint1"])).is_none());
    }

    #[test]
    fn score_must_exceed_threshold_strictly() {
        let milestones = [milestone("Sprint 1 Review", Some((2024, 3, 1)))];
        let score = partial_ratio("Sprint 1 Review", "sprint1");
        let mut strict = config(&["sprint1"]);
        strict.threshold = score;
        assert!(resolve(&milestones, &strict).is_none());
    }

    #[test]
    fn later_better_keyword_replaces_earlier_match() {
        let milestones = [milestone("Sprint 2 Review", Some((2024, 4, 1)))];
        let found = resolve(&milestones, &config(&["sprint2", "sprint 2"])).unwrap();
        assert_eq!(found.keyword, "sprint 2");
        assert_eq!(found.score, 100);
    }

    #[test]
    fn best_match_prefers_strictly_higher_scores() {
        let a = MilestoneMatch {
            milestone: milestone("a", Some((2024, 1, 1))),
            keyword: "k".into(),
            score: 85,
        };
        let b = MilestoneMatch { score: 85, ..a.clone() };
        let b = MilestoneMatch {
            milestone: milestone("b", Some((2024, 1, 2))),
            ..b
        };
        let c = MilestoneMatch {
            milestone: milestone("c", Some((2024, 1, 3))),
            score: 90,
            ..a.clone()
        };
        assert_eq!(best_match([a.clone(), b.clone()]).unwrap().milestone.title, "a");
        assert_eq!(best_match([a, b, c]).unwrap().milestone.title, "c");
        assert!(best_match(Vec::new()).is_none());
    }
}
