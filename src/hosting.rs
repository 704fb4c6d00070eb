// src/hosting.rs

//! Hosting / issue-tracker collaborator.
//!
//! The GitLab implementation pages through REST endpoints with a private
//! token. Pages whose body is not a JSON array, and individual records that
//! do not parse, are treated as "no data" rather than failures.

use crate::error::FetchError;
use crate::model::{Commit, CommitId, GroupId, Milestone, ProjectId};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

const PER_PAGE: &str = "100";
const USER_AGENT: &str = "commit-sampler";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Upper bound on followed pages per listing
const MAX_PAGES: u32 = 500;

pub trait HostingApi {
    /// Direct subgroups of `group`.
    fn subgroups(&self, group: &GroupId) -> Result<Vec<GroupId>, FetchError>;

    fn group_projects(&self, group: &GroupId, include_subgroups: bool) -> Result<Vec<ProjectId>, FetchError>;

    fn milestones(&self, project: &ProjectId) -> Result<Vec<Milestone>, FetchError>;

    /// Commits in `[since, until]`, most recent first.
    fn commits(
        &self,
        project: &ProjectId,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<Commit>, FetchError>;
}

#[derive(Debug, Deserialize)]
struct IdRecord {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct MilestoneRecord {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    due_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitRecord {
    id: String,
    created_at: String,
    #[serde(default)]
    author_name: Option<String>,
}

/// GitLab REST v4 client, e.g. `https://gitlab.example.com/api/v4`.
pub struct GitLabClient {
    agent: ureq::Agent,
    base_url: String,
    token: String,
}

impl GitLabClient {
    pub fn new(base_url: &str, token: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    /// All items of a paginated listing, following `x-next-page`.
    fn get_pages(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<Value>, FetchError> {
        let url = format!("{}/{}", self.base_url, path);
        let mut items = Vec::new();
        let mut page: u32 = 1;

        loop {
            let mut request = self
                .agent
                .get(&url)
                .set("PRIVATE-TOKEN", &self.token)
                .query("per_page", PER_PAGE)
                .query("page", &page.to_string());
            for (key, value) in query {
                request = request.query(key, value);
            }

            let response = match request.call() {
                Ok(response) => response,
                Err(ureq::Error::Status(status, _)) => {
                    return Err(FetchError::Status { url, status });
                }
                Err(e) => {
                    return Err(FetchError::Http {
                        url,
                        message: e.to_string(),
                    });
                }
            };

            let next = next_page(page, response.header("x-next-page"));
            match page_items(response.into_json::<Value>()) {
                Some(page_items) => items.extend(page_items),
                None => {
                    tracing::debug!(%url, page, "page is not a JSON array, treating as empty");
                    break;
                }
            }

            match next {
                Some(n) => page = n,
                None => break,
            }
        }

        Ok(items)
    }
}

/// Items of one page body; `None` when the body is unreadable or not an array.
fn page_items<E: std::fmt::Display>(body: Result<Value, E>) -> Option<Vec<Value>> {
    match body {
        Ok(Value::Array(items)) => Some(items),
        Ok(other) => {
            tracing::debug!(kind = value_kind(&other), "expected a JSON array");
            None
        }
        Err(e) => {
            tracing::debug!(error = %e, "unreadable page body");
            None
        }
    }
}

/// Page to request after `current`, from the `x-next-page` header.
///
/// Paging stops on a missing or unparsable header, on a page that does not
/// move forward, and past [`MAX_PAGES`].
fn next_page(current: u32, header: Option<&str>) -> Option<u32> {
    let next = header?.trim().parse::<u32>().ok()?;
    (next > current && next <= MAX_PAGES).then_some(next)
}

impl HostingApi for GitLabClient {
    fn subgroups(&self, group: &GroupId) -> Result<Vec<GroupId>, FetchError> {
        let items = self.get_pages(&format!("groups/{}/subgroups", group.encoded()), &[])?;
        Ok(records::<IdRecord>(items)
            .into_iter()
            .map(|g| GroupId::from_numeric(g.id))
            .collect())
    }

    fn group_projects(&self, group: &GroupId, include_subgroups: bool) -> Result<Vec<ProjectId>, FetchError> {
        let mut query = Vec::new();
        if include_subgroups {
            query.push(("include_subgroups", "true".to_string()));
        }
        let items = self.get_pages(&format!("groups/{}/projects", group.encoded()), &query)?;
        Ok(records::<IdRecord>(items)
            .into_iter()
            .map(|p| ProjectId::from_numeric(p.id))
            .collect())
    }

    fn milestones(&self, project: &ProjectId) -> Result<Vec<Milestone>, FetchError> {
        let items = self.get_pages(&format!("projects/{project}/milestones"), &[])?;
        Ok(parse_milestones(items))
    }

    fn commits(
        &self,
        project: &ProjectId,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<Vec<Commit>, FetchError> {
        let mut query = Vec::new();
        if let Some(since) = since {
            query.push(("since", since.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        if let Some(until) = until {
            query.push(("until", until.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        let items = self.get_pages(&format!("projects/{project}/repository/commits"), &query)?;
        Ok(parse_commits(items))
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Deserializes each item, dropping the ones that do not fit `T`.
fn records<T: DeserializeOwned>(items: Vec<Value>) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed record");
                None
            }
        })
        .collect()
}

fn parse_milestones(items: Vec<Value>) -> Vec<Milestone> {
    records::<MilestoneRecord>(items)
        .into_iter()
        .map(|record| Milestone {
            title: record.title.unwrap_or_default(),
            due_date: record
                .due_date
                .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        })
        .collect()
}

fn parse_commit(record: CommitRecord) -> Result<Commit, FetchError> {
    let committed_at = DateTime::parse_from_rfc3339(&record.created_at).map_err(|source| FetchError::Timestamp {
        value: record.created_at.clone(),
        source,
    })?;
    Ok(Commit {
        id: CommitId::new(record.id),
        committed_at,
        author: record.author_name,
    })
}

/// Newest first, regardless of the order the server listed them in.
fn parse_commits(items: Vec<Value>) -> Vec<Commit> {
    let mut commits: Vec<Commit> = records::<CommitRecord>(items)
        .into_iter()
        .filter_map(|record| match parse_commit(record) {
            Ok(commit) => Some(commit),
            Err(e) => {
                tracing::debug!(error = %e, "skipping commit with unreadable timestamp");
                None
            }
        })
        .collect();
    commits.sort_by(|a, b| b.committed_at.cmp(&a.committed_at));
    commits
}
