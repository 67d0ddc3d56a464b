//! Defect Dataset Pipeline
//!
//! Runs the stages in order: release timeline, ticket fetch, commit linkage,
//! opening versions, injected versions from affected versions, proportion
//! estimation. Each stage only fills fields that are still empty.

pub mod settings;

pub use settings::{PipelineSettings, SettingsError, StrategySelection};

use log::{info, warn};
use std::sync::Arc;
use thiserror::Error;

use crate::linker::{CommitTicketLinker, LinkReport, LinkerError};
use crate::model::{CommitInfo, Ticket};
use crate::proportion::{reset_estimated_injected, ProportionEstimator, ProportionReport};
use crate::resolver::{InjectedSummary, OpeningSummary, VersionResolver};
use crate::timeline::ReleaseTimeline;
use crate::tracker::{TrackerClient, TrackerError, TrackerTransport};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error(transparent)]
    Linker(#[from] LinkerError),
}

/// Counts and listings collected from every stage
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub releases: usize,
    pub releases_rejected: usize,
    pub tickets: usize,
    pub tickets_reported: usize,
    pub malformed_tickets: usize,
    /// Tickets in the reported total that paging never returned
    pub tickets_unreturned: usize,
    /// Tickets fetched without a declared fix version
    pub fix_unknown: Vec<String>,
    pub link: LinkReport,
    pub opening: OpeningSummary,
    pub injected: InjectedSummary,
    pub baseline: Option<String>,
    /// One entry per strategy run, in run order
    pub proportions: Vec<ProportionReport>,
}

/// Final timeline and tickets with their resolved versions
#[derive(Debug, Clone)]
pub struct DefectDataset {
    pub timeline: ReleaseTimeline,
    pub tickets: Vec<Ticket>,
    pub report: PipelineReport,
}

/// Builds the defect dataset of one project
pub struct DefectPipeline<T: TrackerTransport> {
    settings: PipelineSettings,
    client: TrackerClient<T>,
}

impl<T: TrackerTransport> DefectPipeline<T> {
    pub fn new(settings: PipelineSettings, transport: T) -> Result<Self, PipelineError> {
        settings.validate()?;
        let client = TrackerClient::new(transport, settings.tracker_url.clone(), settings.project.clone())
            .with_page_size(settings.page_size);
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Run every stage against the given commit history
    pub fn run(&self, commits: &[Arc<CommitInfo>]) -> Result<DefectDataset, PipelineError> {
        let linker = CommitTicketLinker::new(&self.settings.project)?;
        let mut report = PipelineReport::default();

        let timeline = self.client.fetch_releases(self.settings.release_percentage)?;
        report.releases = timeline.len();
        report.releases_rejected = timeline.rejected();
        if timeline.is_empty() {
            warn!("Project {} has no dated releases; no versions can be resolved", self.settings.project);
        }

        let fetch = self.client.fetch_tickets(&self.settings.filter, &timeline)?;
        report.tickets_reported = fetch.total_reported;
        report.malformed_tickets = fetch.malformed;
        report.tickets_unreturned = fetch.unreturned;
        report.fix_unknown = fetch.fix_unknown;
        let mut tickets = fetch.tickets;
        report.tickets = tickets.len();

        report.link = linker.link(&mut tickets, commits, &timeline);

        let resolver = VersionResolver::new(&timeline);
        report.opening = resolver.apply_opening_versions(&mut tickets);

        let estimator = ProportionEstimator::with_baseline_name(&timeline, self.settings.baseline_release.as_deref());
        report.baseline = estimator.baseline().map(|b| b.name.clone());
        report.injected = resolver.apply_injected_from_affected(&mut tickets, estimator.baseline());

        report.proportions = run_strategies(&estimator, &mut tickets, self.settings.strategy);

        info!(
            "Dataset complete: {} releases, {} tickets, {} commits",
            report.releases,
            report.tickets,
            commits.len()
        );

        Ok(DefectDataset {
            timeline,
            tickets,
            report,
        })
    }
}

/// Run the selected strategies, resetting estimates between runs
pub fn run_strategies(
    estimator: &ProportionEstimator<'_>,
    tickets: &mut [Ticket],
    selection: StrategySelection,
) -> Vec<ProportionReport> {
    let mut reports = Vec::new();
    for (run, strategy) in selection.strategies().into_iter().enumerate() {
        if run > 0 {
            reset_estimated_injected(tickets);
        }
        reports.push(estimator.estimate(tickets, strategy));
    }
    reports
}
