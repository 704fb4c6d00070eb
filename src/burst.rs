// src/burst.rs

//! Burst-pause milestone detection over one calendar week.
//!
//! The detector moves through `Scanning -> BurstFound -> PauseConfirmed |
//! PauseNotConfirmed`, or ends in `NoBurst` when no day of the week reaches
//! the burst threshold. Only a burst followed by a quiet pause counts as a
//! milestone.

use crate::error::FetchError;
use crate::hosting::HostingApi;
use crate::model::{BurstResult, Commit, ProjectId};
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use std::collections::BTreeMap;

pub const DEFAULT_MIN_COMMITS: usize = 4;
pub const DEFAULT_PAUSE_DAYS: u64 = 2;
pub const WEEK_DAYS: u64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurstConfig {
    /// First day of the observed week
    pub week_start: NaiveDate,
    /// Commits in one day needed for a burst
    pub min_commits: usize,
    /// Whole days after the burst that must stay free of commits
    pub pause_days: u64,
}

impl BurstConfig {
    pub fn new(week_start: NaiveDate) -> Self {
        Self {
            week_start,
            min_commits: DEFAULT_MIN_COMMITS,
            pause_days: DEFAULT_PAUSE_DAYS,
        }
    }
}

/// The first qualifying day of the week
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Burst<'a> {
    pub day: NaiveDate,
    pub commits: Vec<&'a Commit>,
}

impl Burst<'_> {
    /// Latest commit of the burst day; the earliest listed wins equal timestamps.
    pub fn last_commit(&self) -> Option<&Commit> {
        self.commits.iter().copied().fold(None, |latest: Option<&Commit>, c| match latest {
            Some(l) if l.committed_at >= c.committed_at => Some(l),
            _ => Some(c),
        })
    }
}

/// UTC range to fetch for the local days `[first, first + days)`.
///
/// Commits are bucketed by their author's calendar day, which can be up to
/// 14 hours away from UTC, so the range is widened by one day on each side.
/// Callers filter the result by local day again.
fn fetch_span(first: NaiveDate, days: u64) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = first.pred_opt().unwrap_or(NaiveDate::MIN);
    let end = first.checked_add_days(Days::new(days + 1)).unwrap_or(NaiveDate::MAX);
    (midnight(start), midnight(end))
}

fn midnight(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

fn in_days(commit: &Commit, first: NaiveDate, days: u64) -> bool {
    let day = commit.day();
    let last = first.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX);
    day >= first && day < last
}

/// Earliest day of the week whose commit count reaches `min_commits`.
///
/// Commits outside the week are ignored. Scanning stops at the first
/// qualifying day even if a later day is busier.
pub fn find_burst<'a>(commits: &'a [Commit], config: &BurstConfig) -> Option<Burst<'a>> {
    let mut by_day: BTreeMap<NaiveDate, Vec<&Commit>> = BTreeMap::new();
    for commit in commits.iter().filter(|c| in_days(c, config.week_start, WEEK_DAYS)) {
        by_day.entry(commit.day()).or_default().push(commit);
    }

    by_day
        .into_iter()
        .find(|(_, day_commits)| day_commits.len() >= config.min_commits)
        .map(|(day, commits)| Burst { day, commits })
}

/// Runs one detection. `fetch(since, until)` returns the commits in that range.
///
/// A fetch failure aborts the run: an unreadable pause window must not be
/// mistaken for a quiet one.
pub fn detect<F>(config: &BurstConfig, mut fetch: F) -> Result<BurstResult, FetchError>
where
    F: FnMut(DateTime<Utc>, DateTime<Utc>) -> Result<Vec<Commit>, FetchError>,
{
    // Scanning
    let (since, until) = fetch_span(config.week_start, WEEK_DAYS);
    let week_commits = fetch(since, until)?;
    let Some(burst) = find_burst(&week_commits, config) else {
        return Ok(BurstResult::no_burst(config.week_start));
    };
    let Some(last) = burst.last_commit() else {
        return Ok(BurstResult::no_burst(config.week_start));
    };

    // BurstFound: check the pause window
    let pause_start = burst.day.succ_opt().unwrap_or(burst.day);
    let pause_detected = if config.pause_days == 0 {
        true
    } else {
        let (since, until) = fetch_span(pause_start, config.pause_days);
        let after = fetch(since, until)?;
        !after.iter().any(|c| in_days(c, pause_start, config.pause_days))
    };

    Ok(BurstResult::burst(
        config.week_start,
        burst.day,
        burst.commits.len(),
        last.id.clone(),
        pause_detected,
    ))
}

/// [`detect`] against a hosted project's commit list.
pub fn detect_for_project<A: HostingApi + ?Sized>(
    api: &A,
    project: &ProjectId,
    config: &BurstConfig,
) -> Result<BurstResult, FetchError> {
    detect(config, |since, until| api.commits(project, Some(since), Some(until)))
}
