// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// A collaborator call (history provider or hosting API) that failed.
///
/// These are transient, per-item faults: callers log them and move on to the
/// next commit, repository or project.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("invalid timestamp {value:?}: {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("sample count must be at least 2, got {0}")]
    InvalidSampleCount(usize),

    #[error("invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("missing setting: {0}")]
    MissingSetting(&'static str),

    #[error("invalid repository list {path:?}: {source}")]
    RepositoryList {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure while writing a result document.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Top-level error surfaced by the command-line driver.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

pub type Result<T> = std::result::Result<T, Error>;
