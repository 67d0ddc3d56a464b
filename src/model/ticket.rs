use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;

use super::{CommitInfo, Release, ResolutionType, TicketStatus, TicketType};

/// Where a ticket's Fix Version came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FixSource {
    /// Declared in the tracker's fix-version field
    Tracker,
    /// First release on or after the latest associated commit
    InferredFromCommits,
}

/// Where a ticket's Injected Version came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InjectedSource {
    /// Release immediately before the earliest affected version
    AffectedVersions,
    /// Forced to the baseline release by the `ForceBaselineIv` strategy
    ForcedBaseline,
    /// Imputed by the proportion estimator
    Estimated,
}

impl InjectedSource {
    /// True for values produced by a proportion run rather than observed data
    pub fn is_estimation_artifact(self) -> bool {
        matches!(self, InjectedSource::ForcedBaseline | InjectedSource::Estimated)
    }
}

/// A tracker ticket with the versions resolved for it.
///
/// `fixed`, `opening` and `injected` start unset and can each be assigned
/// once; the setters refuse to overwrite an existing value.
#[derive(Debug, Clone, Serialize)]
pub struct Ticket {
    pub id: String,
    pub key: String,
    pub issue_date: NaiveDate,
    pub closed_date: NaiveDate,
    pub ticket_type: TicketType,
    pub status: TicketStatus,
    pub assignee: String,
    pub resolution: Option<ResolutionType>,
    fixed: Option<Release>,
    fix_source: Option<FixSource>,
    opening: Option<Release>,
    injected: Option<Release>,
    injected_source: Option<InjectedSource>,
    affected_versions: Vec<Release>,
    #[serde(skip)]
    associated_commits: Vec<Arc<CommitInfo>>,
}

impl Ticket {
    pub fn new(
        id: impl Into<String>,
        key: impl Into<String>,
        issue_date: NaiveDate,
        closed_date: NaiveDate,
        ticket_type: TicketType,
        status: TicketStatus,
        assignee: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            issue_date,
            closed_date,
            ticket_type,
            status,
            assignee: assignee.into(),
            resolution: None,
            fixed: None,
            fix_source: None,
            opening: None,
            injected: None,
            injected_source: None,
            affected_versions: Vec::new(),
            associated_commits: Vec::new(),
        }
    }

    pub fn fixed(&self) -> Option<&Release> {
        self.fixed.as_ref()
    }

    pub fn fix_source(&self) -> Option<FixSource> {
        self.fix_source
    }

    pub fn opening(&self) -> Option<&Release> {
        self.opening.as_ref()
    }

    pub fn injected(&self) -> Option<&Release> {
        self.injected.as_ref()
    }

    pub fn injected_source(&self) -> Option<InjectedSource> {
        self.injected_source
    }

    pub fn affected_versions(&self) -> &[Release] {
        &self.affected_versions
    }

    pub fn associated_commits(&self) -> &[Arc<CommitInfo>] {
        &self.associated_commits
    }

    pub fn set_fixed(&mut self, release: Release, source: FixSource) -> bool {
        if self.fixed.is_some() {
            return false;
        }
        self.fixed = Some(release);
        self.fix_source = Some(source);
        true
    }

    pub fn set_opening(&mut self, release: Release) -> bool {
        if self.opening.is_some() {
            return false;
        }
        self.opening = Some(release);
        true
    }

    pub fn set_injected(&mut self, release: Release, source: InjectedSource) -> bool {
        if self.injected.is_some() {
            return false;
        }
        self.injected = Some(release);
        self.injected_source = Some(source);
        true
    }

    /// Clear an Injected Version left behind by a proportion run.
    ///
    /// Versions derived from affected versions are kept. Returns true when
    /// something was cleared.
    pub fn clear_estimated_injected(&mut self) -> bool {
        match self.injected_source {
            Some(source) if source.is_estimation_artifact() => {
                self.injected = None;
                self.injected_source = None;
                true
            }
            _ => false,
        }
    }

    /// Replace the affected versions, dropping repeated release ids
    pub fn set_affected_versions(&mut self, releases: Vec<Release>) {
        self.affected_versions.clear();
        for release in releases {
            if !self.affected_versions.iter().any(|r| r.same_as(&release)) {
                self.affected_versions.push(release);
            }
        }
    }

    /// Affected version with the earliest release date (first on ties)
    pub fn earliest_affected_version(&self) -> Option<&Release> {
        self.affected_versions
            .iter()
            .reduce(|best, r| if r.release_date < best.release_date { r } else { best })
    }

    /// Attach a commit unless one with the same id is already attached
    pub fn attach_commit(&mut self, commit: Arc<CommitInfo>) -> bool {
        if self
            .associated_commits
            .iter()
            .any(|c| c.commit_id == commit.commit_id)
        {
            return false;
        }
        self.associated_commits.push(commit);
        true
    }

    /// Date of the most recent associated commit
    pub fn latest_commit_date(&self) -> Option<NaiveDate> {
        self.associated_commits.iter().map(|c| c.commit_date).max()
    }
}
