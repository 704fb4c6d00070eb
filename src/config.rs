// src/config.rs

//! TOML configuration file. Every section is optional; command-line flags
//! override what is read here.
//!
//! ```toml
//! [gitlab]
//! url = "https://gitlab.example.com/api/v4"
//! group = "course-2024"
//! subgroup = "team-a"
//!
//! [milestones]
//! keywords = [["sprint1", "sprint 1"], ["sprint2"]]
//!
//! [bursts]
//! week_start = "2024-03-25"
//! ```

use crate::boundary::{ManifestPredicate, DEFAULT_MANIFEST_SUFFIX, DEFAULT_MARKERS};
use crate::burst::{BurstConfig, DEFAULT_MIN_COMMITS, DEFAULT_PAUSE_DAYS};
use crate::error::ConfigError;
use crate::milestone::{MilestoneConfig, DEFAULT_ACCEPTANCE_THRESHOLD};
use crate::model::{GroupId, SampleCount, SampleRequest, Spacing};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "commit-sampler.toml";
pub const DEFAULT_SAMPLE_COUNT: usize = 5;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gitlab: GitLabSettings,
    pub milestones: MilestoneSettings,
    pub bursts: BurstSettings,
    pub sampling: SamplingSettings,
    pub workspace: WorkspaceSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GitLabSettings {
    pub url: Option<String>,
    pub token: Option<String>,
    pub group: Option<String>,
    pub subgroup: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MilestoneSettings {
    /// One keyword set per milestone to resolve
    pub keywords: Vec<Vec<String>>,
    pub threshold: u8,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BurstSettings {
    pub week_start: Option<String>,
    pub min_commits: usize,
    pub pause_days: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SamplingSettings {
    pub count: usize,
    pub skip: usize,
    pub window: Option<usize>,
    pub spacing: Spacing,
    /// Start sampling at the first commit whose manifests carry a marker
    pub adoption_boundary: bool,
    pub manifest_suffix: String,
    pub markers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkspaceSettings {
    pub repository_list: PathBuf,
    pub clone_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for MilestoneSettings {
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            threshold: DEFAULT_ACCEPTANCE_THRESHOLD,
        }
    }
}

impl Default for BurstSettings {
    fn default() -> Self {
        Self {
            week_start: None,
            min_commits: DEFAULT_MIN_COMMITS,
            pause_days: DEFAULT_PAUSE_DAYS,
        }
    }
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            count: DEFAULT_SAMPLE_COUNT,
            skip: 0,
            window: None,
            spacing: Spacing::default(),
            adoption_boundary: true,
            manifest_suffix: DEFAULT_MANIFEST_SUFFIX.to_string(),
            markers: DEFAULT_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            repository_list: PathBuf::from("repos.json"),
            clone_dir: PathBuf::from("repos"),
            output_dir: PathBuf::from("results"),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Read { source, .. }) if source.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

impl GitLabSettings {
    pub fn url(&self) -> Result<&str, ConfigError> {
        self.url.as_deref().ok_or(ConfigError::MissingSetting("gitlab.url"))
    }

    pub fn token(&self) -> Result<&str, ConfigError> {
        self.token.as_deref().ok_or(ConfigError::MissingSetting("gitlab.token"))
    }

    pub fn group_id(&self) -> Result<GroupId, ConfigError> {
        let group = self.group.as_deref().ok_or(ConfigError::MissingSetting("gitlab.group"))?;
        Ok(GroupId::nested(group, self.subgroup.as_deref()))
    }
}

impl MilestoneSettings {
    pub fn configs(&self) -> Vec<MilestoneConfig> {
        self.keywords
            .iter()
            .filter(|set| !set.is_empty())
            .map(|set| MilestoneConfig {
                keywords: set.clone(),
                threshold: self.threshold,
            })
            .collect()
    }
}

impl BurstSettings {
    pub fn config(&self) -> Result<BurstConfig, ConfigError> {
        let week = self
            .week_start
            .as_deref()
            .ok_or(ConfigError::MissingSetting("bursts.week_start"))?;
        Ok(BurstConfig {
            week_start: parse_date(week)?,
            min_commits: self.min_commits,
            pause_days: self.pause_days,
        })
    }
}

impl SamplingSettings {
    pub fn request(&self) -> Result<SampleRequest, ConfigError> {
        let mut request = SampleRequest::new(SampleCount::try_from(self.count)?);
        request.skip = self.skip;
        request.window = self.window;
        request.spacing = self.spacing;
        if self.adoption_boundary {
            request.boundary = Some(ManifestPredicate::new(&self.manifest_suffix, self.markers.iter().cloned()));
        }
        Ok(request)
    }
}

/// `YYYY-MM-DD`
pub fn parse_date(value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| ConfigError::InvalidDate(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.sampling.count, DEFAULT_SAMPLE_COUNT);
        assert_eq!(config.bursts.min_commits, 4);
        assert_eq!(config.bursts.pause_days, 2);
        assert_eq!(config.milestones.threshold, 70);
        assert!(config.sampling.adoption_boundary);
        assert_eq!(config.workspace.output_dir, PathBuf::from("results"));
    }

    #[test]
    fn full_file() {
        let config = Config::from_toml(
            r#"
            [gitlab]
            url = "https://gitlab.example.com/api/v4"
            token = "secret"
            group = "course-2024"
            subgroup = "team-a"

            [milestones]
            keywords = [["sprint1", "sprint 1"], [], ["sprint2"]]
            threshold = 80

            [bursts]
            week_start = "2024-03-25"
            min_commits = 6

            [sampling]
            count = 8
            skip = 3
            window = 200
            spacing = "uniform"
            markers = ["target-v2"]
            manifest_suffix = "manifest.toml"
            "#,
        )
        .unwrap();

        assert_eq!(config.gitlab.group_id().unwrap().encoded(), "course-2024%2Fteam-a");
        assert_eq!(config.gitlab.token().unwrap(), "secret");

        let milestones = config.milestones.configs();
        assert_eq!(milestones.len(), 2);
        assert_eq!(milestones[0].keywords, vec!["sprint1", "sprint 1"]);
        assert_eq!(milestones[1].threshold, 80);

        let bursts = config.bursts.config().unwrap();
        assert_eq!(bursts.week_start, NaiveDate::from_ymd_opt(2024, 3, 25).unwrap());
        assert_eq!(bursts.min_commits, 6);
        assert_eq!(bursts.pause_days, 2);

        let request = config.sampling.request().unwrap();
        assert_eq!(request.count.get(), 8);
        assert_eq!(request.skip, 3);
        assert_eq!(request.window, Some(200));
        assert_eq!(request.spacing, Spacing::Uniform);
        let boundary = request.boundary.unwrap();
        assert_eq!(boundary.suffix, "manifest.toml");
        assert_eq!(boundary.markers, vec!["target-v2"]);
    }

    #[test]
    fn missing_settings_are_reported() {
        let config = Config::default();
        assert!(matches!(config.gitlab.url(), Err(ConfigError::MissingSetting("gitlab.url"))));
        assert!(matches!(config.bursts.config(), Err(ConfigError::MissingSetting(_))));
    }

    #[test]
    fn degenerate_sample_count_is_rejected() {
        let config = Config::from_toml("[sampling]\ncount = 1").unwrap();
        assert!(matches!(config.sampling.request(), Err(ConfigError::InvalidSampleCount(1))));
    }

    #[test]
    fn bad_date_is_rejected() {
        assert!(parse_date("2024-13-01").is_err());
        assert_eq!(parse_date(" 2024-03-25 ").unwrap(), NaiveDate::from_ymd_opt(2024, 3, 25).unwrap());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.sampling.count, DEFAULT_SAMPLE_COUNT);
    }
}
