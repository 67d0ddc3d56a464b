//! Pipeline execution

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::git::RepositoryHandle;
use crate::output;
use crate::pipeline::{DefectDataset, DefectPipeline, PipelineSettings};
use crate::tracker::UreqTransport;

use super::repository::resolve_repository_path;

/// Read the repository history, build the dataset and report it
pub fn run_pipeline(settings: PipelineSettings, show_tickets: bool) -> Result<DefectDataset> {
    let repo_path = resolve_repository_path(settings.repo_path.as_deref())?;
    let repository = RepositoryHandle::open(&repo_path)?;
    info!("Analysing {} against project {}", repository.path(), settings.project);
    if repository.is_bare() {
        debug!("Repository {} is bare; reading history without a working tree", repository.path());
    }

    let commits = repository.read_commit_log()
        .context("Failed to read the commit history")?;
    if commits.is_empty() {
        warn!("Repository {} has no commits; no fix versions can be inferred", repository.path());
    }

    let release_info = settings.release_info.clone();
    let pipeline = DefectPipeline::new(settings, UreqTransport::new())?;
    let dataset = pipeline.run(&commits)
        .with_context(|| format!("Failed to build the defect dataset from {}", pipeline.settings().tracker_url))?;

    if let Some(path) = release_info {
        output::write_release_csv(&dataset.timeline, &path)?;
    }

    output::display_pipeline_report(&dataset.report);
    if show_tickets {
        println!();
        println!("Tickets:");
        print!("{}", output::format_ticket_table(&dataset.tickets));
    }

    Ok(dataset)
}
