// src/main.rs

mod cli;

use clap::Parser;
use cli::{Args, BurstArgs, Command, MilestoneArgs, SpacedArgs, TagsArgs};
use commit_sampler::config::Config;
use commit_sampler::error::ConfigError;
use commit_sampler::hosting::{GitLabClient, HostingApi};
use commit_sampler::model::SampleCount;
use commit_sampler::report::write_json;
use commit_sampler::workspace::Workspace;
use commit_sampler::{logging, pipeline, Result};
use std::process::ExitCode;
use std::time::Instant;

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.json_logs);
    let start_time = Instant::now();

    let outcome = Config::load_or_default(&args.config)
        .map_err(commit_sampler::Error::from)
        .and_then(|mut config| {
            if let Some(output) = &args.output {
                config.workspace.output_dir = output.clone();
            }
            match &args.command {
                Command::Spaced(spaced) => run_spaced(spaced, config),
                Command::Tags(tags) => run_tags(tags, config),
                Command::Milestones(milestones) => run_milestones(milestones, config),
                Command::Bursts(bursts) => run_bursts(bursts, config),
            }
        });

    match outcome {
        Ok(()) => {
            tracing::info!(elapsed = ?start_time.elapsed(), "done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "run failed");
            ExitCode::FAILURE
        }
    }
}

fn run_spaced(args: &SpacedArgs, mut config: Config) -> Result<()> {
    args.repos.apply(&mut config.workspace);
    args.apply(&mut config.sampling);
    let request = config.sampling.request()?;
    let entries = args.repos.entries(&config.workspace)?;
    let workspace = Workspace::new(&config.workspace.clone_dir);

    tracing::info!(repositories = entries.len(), count = request.count.get(), "sampling commits");
    let document = pipeline::spaced_samples(&entries, &workspace, &request);
    println!("Sampled {} of {} repositories.", document.len(), entries.len());

    write_json(&config.workspace.output_dir.join("spaced_samples.json"), &document)?;
    Ok(())
}

fn run_tags(args: &TagsArgs, mut config: Config) -> Result<()> {
    args.repos.apply(&mut config.workspace);
    let count = SampleCount::try_from(args.count.unwrap_or(config.sampling.count))?;
    let entries = args.repos.entries(&config.workspace)?;
    let workspace = Workspace::new(&config.workspace.clone_dir);

    tracing::info!(repositories = entries.len(), count = count.get(), "sampling tags");
    let document = pipeline::tag_samples(&entries, &workspace, count);
    println!("Sampled tags of {} of {} repositories.", document.len(), entries.len());

    write_json(&config.workspace.output_dir.join("tag_samples.json"), &document)?;
    Ok(())
}

fn gitlab_client(config: &Config) -> Result<GitLabClient> {
    Ok(GitLabClient::new(config.gitlab.url()?, config.gitlab.token()?))
}

fn run_milestones(args: &MilestoneArgs, mut config: Config) -> Result<()> {
    args.gitlab.apply(&mut config.gitlab);
    args.apply(&mut config.milestones);
    let milestone_configs = config.milestones.configs();
    if milestone_configs.is_empty() {
        return Err(ConfigError::MissingSetting("milestones.keywords").into());
    }
    let client = gitlab_client(&config)?;
    let root = config.gitlab.group_id()?;

    for (index, milestone) in milestone_configs.iter().enumerate() {
        tracing::info!(keywords = ?milestone.keywords, "resolving milestone");
        let document = pipeline::milestone_commits(&client, &root, milestone)?;
        println!("Milestone {}: found commits for {} projects.", index + 1, document.len());

        let path = config.workspace.output_dir.join(format!("milestone_commits_{}.json", index + 1));
        write_json(&path, &document)?;
    }
    Ok(())
}

fn run_bursts(args: &BurstArgs, mut config: Config) -> Result<()> {
    args.gitlab.apply(&mut config.gitlab);
    args.apply(&mut config.bursts);
    let mut burst_config = config.bursts.config()?;
    let thresholds = args.thresholds(&config.bursts);
    let client = gitlab_client(&config)?;
    let group = config.gitlab.group_id()?;

    let projects = client.group_projects(&group, true)?;
    tracing::info!(group = %group, projects = projects.len(), week = %burst_config.week_start, "detecting bursts");

    for &threshold in &thresholds {
        burst_config.min_commits = threshold;
        let document = pipeline::bursts_for_projects(&client, &projects, &burst_config);
        let confirmed = document.values().filter(|r| r.pause_detected).count();
        println!(
            "Threshold {}: {} confirmed milestones in {} projects.",
            threshold,
            confirmed,
            document.len()
        );

        let name = if thresholds.len() == 1 {
            "burst_milestones.json".to_string()
        } else {
            format!("burst_milestones_{threshold}.json")
        };
        write_json(&config.workspace.output_dir.join(name), &document)?;
    }
    Ok(())
}
