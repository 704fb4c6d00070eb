// src/cli.rs

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use commit_sampler::config::{
    parse_date, BurstSettings, GitLabSettings, MilestoneSettings, SamplingSettings, WorkspaceSettings,
    DEFAULT_CONFIG_FILE,
};
use commit_sampler::error::ConfigError;
use commit_sampler::model::Spacing;
use commit_sampler::workspace::{load_repository_list, RepositoryEntry};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Directory to save the result documents
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Pick evenly spaced commits from each repository's history
    Spaced(SpacedArgs),
    /// Pick the commits behind release tags
    Tags(TagsArgs),
    /// Find each project's last commit at its group's milestone
    Milestones(MilestoneArgs),
    /// Detect burst-then-pause milestones within one week
    Bursts(BurstArgs),
}

#[derive(clap::Args, Debug)]
pub struct RepositoryArgs {
    /// Repository URL or local checkout; repeatable. Defaults to the repository list
    #[arg(short, long = "repo")]
    pub repos: Vec<String>,

    /// JSON file listing repositories (and optionally their tags)
    #[arg(long)]
    pub repository_list: Option<PathBuf>,

    /// Directory remote repositories are cloned into
    #[arg(long)]
    pub clone_dir: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct SpacedArgs {
    #[command(flatten)]
    pub repos: RepositoryArgs,

    /// Number of commits to pick per repository (at least 2)
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Leading commits to drop after the adoption boundary
    #[arg(long)]
    pub skip: Option<usize>,

    /// Only sample the most recent commits
    #[arg(long)]
    pub window: Option<usize>,

    /// Interior sample placement
    #[arg(long, value_enum)]
    pub spacing: Option<Spacing>,

    /// Sample the whole history instead of starting at framework adoption
    #[arg(long)]
    pub no_boundary: bool,

    /// Marker text identifying the adopted framework; repeatable
    #[arg(long = "marker")]
    pub markers: Vec<String>,

    /// Manifest files to inspect, matched by path suffix
    #[arg(long)]
    pub manifest_suffix: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct TagsArgs {
    #[command(flatten)]
    pub repos: RepositoryArgs,

    /// Number of tags to pick per repository (at least 2)
    #[arg(short = 'n', long)]
    pub count: Option<usize>,
}

#[derive(clap::Args, Debug)]
pub struct GitLabArgs {
    /// GitLab API base URL, e.g. https://gitlab.example.com/api/v4
    #[arg(long)]
    pub url: Option<String>,

    /// Private access token with read_api scope
    #[arg(long, env = "GITLAB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Group path or id
    #[arg(long)]
    pub group: Option<String>,

    /// Subgroup below --group
    #[arg(long)]
    pub subgroup: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct MilestoneArgs {
    #[command(flatten)]
    pub gitlab: GitLabArgs,

    /// Comma-separated keywords for one milestone; repeat for several milestones
    #[arg(short, long = "keywords")]
    pub keyword_sets: Vec<String>,

    /// Similarity a title must exceed to match (0-100)
    #[arg(long)]
    pub threshold: Option<u8>,
}

#[derive(clap::Args, Debug)]
pub struct BurstArgs {
    #[command(flatten)]
    pub gitlab: GitLabArgs,

    /// First day of the milestone week (YYYY-MM-DD)
    #[arg(long, value_parser = parse_week)]
    pub week: Option<NaiveDate>,

    /// Commits in one day that count as a burst; repeat to sweep several thresholds
    #[arg(long = "min-commits")]
    pub min_commits: Vec<usize>,

    /// Days after the burst that must be free of commits
    #[arg(long)]
    pub pause_days: Option<u64>,
}

fn parse_week(value: &str) -> Result<NaiveDate, String> {
    parse_date(value).map_err(|e| e.to_string())
}

impl RepositoryArgs {
    pub fn apply(&self, settings: &mut WorkspaceSettings) {
        if let Some(list) = &self.repository_list {
            settings.repository_list = list.clone();
        }
        if let Some(dir) = &self.clone_dir {
            settings.clone_dir = dir.clone();
        }
    }

    pub fn entries(&self, settings: &WorkspaceSettings) -> Result<Vec<RepositoryEntry>, ConfigError> {
        if !self.repos.is_empty() {
            return Ok(self.repos.iter().map(RepositoryEntry::new).collect());
        }
        Ok(load_repository_list(&settings.repository_list)?.repos)
    }
}

impl SpacedArgs {
    pub fn apply(&self, settings: &mut SamplingSettings) {
        if let Some(count) = self.count {
            settings.count = count;
        }
        if let Some(skip) = self.skip {
            settings.skip = skip;
        }
        if self.window.is_some() {
            settings.window = self.window;
        }
        if let Some(spacing) = self.spacing {
            settings.spacing = spacing;
        }
        if self.no_boundary {
            settings.adoption_boundary = false;
        }
        if !self.markers.is_empty() {
            settings.markers = self.markers.clone();
        }
        if let Some(suffix) = &self.manifest_suffix {
            settings.manifest_suffix = suffix.clone();
        }
    }
}

impl GitLabArgs {
    pub fn apply(&self, settings: &mut GitLabSettings) {
        let overrides = [
            (&self.url, &mut settings.url),
            (&self.token, &mut settings.token),
            (&self.group, &mut settings.group),
            (&self.subgroup, &mut settings.subgroup),
        ];
        for (value, setting) in overrides {
            if value.is_some() {
                setting.clone_from(value);
            }
        }
    }
}

impl MilestoneArgs {
    pub fn apply(&self, settings: &mut MilestoneSettings) {
        if !self.keyword_sets.is_empty() {
            settings.keywords = self
                .keyword_sets
                .iter()
                .map(|set| {
                    set.split(',')
                        .map(str::trim)
                        .filter(|k| !k.is_empty())
                        .map(String::from)
                        .collect()
                })
                .collect();
        }
        if let Some(threshold) = self.threshold {
            settings.threshold = threshold;
        }
    }
}

impl BurstArgs {
    pub fn apply(&self, settings: &mut BurstSettings) {
        if let Some(week) = self.week {
            settings.week_start = Some(week.format("%Y-%m-%d").to_string());
        }
        if let Some(pause_days) = self.pause_days {
            settings.pause_days = pause_days;
        }
    }

    /// Thresholds to run, falling back to the configured one.
    pub fn thresholds(&self, settings: &BurstSettings) -> Vec<usize> {
        if self.min_commits.is_empty() {
            vec![settings.min_commits]
        } else {
            self.min_commits.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn keyword_sets_split_on_commas() {
        let args = Args::parse_from([
            "commit-sampler",
            "milestones",
            "--keywords",
            "sprint1, sprint 1",
            "--keywords",
            "sprint2",
        ]);
        let Command::Milestones(milestones) = args.command else {
            panic!("expected milestones command");
        };
        let mut settings = MilestoneSettings::default();
        milestones.apply(&mut settings);
        assert_eq!(settings.keywords, vec![vec!["sprint1", "sprint 1"], vec!["sprint2"]]);
    }

    #[test]
    fn burst_sweep_thresholds() {
        let args = Args::parse_from([
            "commit-sampler",
            "bursts",
            "--week",
            "2024-03-25",
            "--min-commits",
            "3",
            "--min-commits",
            "5",
        ]);
        let Command::Bursts(bursts) = args.command else {
            panic!("expected bursts command");
        };
        let mut settings = BurstSettings::default();
        bursts.apply(&mut settings);
        assert_eq!(settings.week_start.as_deref(), Some("2024-03-25"));
        assert_eq!(bursts.thresholds(&settings), vec![3, 5]);
    }

    #[test]
    fn spaced_flags_override_settings() {
        let args = Args::parse_from([
            "commit-sampler",
            "spaced",
            "--repo",
            "https://github.com/a/b",
            "-n",
            "7",
            "--spacing",
            "uniform",
            "--no-boundary",
        ]);
        let Command::Spaced(spaced) = args.command else {
            panic!("expected spaced command");
        };
        let mut settings = SamplingSettings::default();
        spaced.apply(&mut settings);
        assert_eq!(settings.count, 7);
        assert_eq!(settings.spacing, Spacing::Uniform);
        assert!(!settings.adoption_boundary);
        assert_eq!(spaced.repos.repos, vec!["https://github.com/a/b"]);
    }
}
