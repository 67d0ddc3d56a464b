//! Version resolution over the release timeline
//!
//! Stateless lookups for the Opening, Fix and Injected versions of a ticket,
//! plus batch helpers that apply them to a ticket collection.

use chrono::NaiveDate;
use log::{debug, info, warn};

use crate::model::{InjectedSource, Release, Ticket};
use crate::timeline::ReleaseTimeline;

/// Outcome of assigning opening versions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpeningSummary {
    pub resolved: usize,
    /// Tickets filed before the earliest known release
    pub missing: Vec<String>,
}

/// Outcome of deriving injected versions from affected versions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InjectedSummary {
    pub derived: usize,
    /// Tickets with affected versions but no release before the earliest one
    pub not_derivable: Vec<String>,
    /// Subset of `not_derivable` whose earliest affected version is the baseline
    pub earliest_is_baseline: usize,
}

/// Resolves versions against a release timeline
pub struct VersionResolver<'a> {
    timeline: &'a ReleaseTimeline,
}

impl<'a> VersionResolver<'a> {
    pub fn new(timeline: &'a ReleaseTimeline) -> Self {
        Self { timeline }
    }

    /// Release current when a ticket was filed
    pub fn resolve_opening_version(&self, issue_date: NaiveDate) -> Option<&'a Release> {
        self.timeline.latest_on_or_before(issue_date)
    }

    /// First release shipped on or after the latest fixing commit
    pub fn resolve_fix_version(&self, latest_commit_date: NaiveDate) -> Option<&'a Release> {
        self.timeline.first_on_or_after(latest_commit_date)
    }

    /// Release immediately before the earliest affected version.
    ///
    /// Returns `None` when there are no affected versions or the earliest one
    /// is the first release of the timeline.
    pub fn resolve_injected_from_affected(&self, affected: &[Release]) -> Option<&'a Release> {
        let earliest = affected
            .iter()
            .reduce(|best, r| if r.release_date < best.release_date { r } else { best })?;
        self.timeline.latest_strictly_before(earliest.release_date)
    }

    /// Set the opening version of every ticket that does not have one yet
    pub fn apply_opening_versions(&self, tickets: &mut [Ticket]) -> OpeningSummary {
        let mut summary = OpeningSummary::default();

        for ticket in tickets.iter_mut().filter(|t| t.opening().is_none()) {
            match self.resolve_opening_version(ticket.issue_date) {
                Some(release) => {
                    ticket.set_opening(release.clone());
                    summary.resolved += 1;
                }
                None => {
                    warn!("Ticket {} has no opening version: no release on or before {}", ticket.key, ticket.issue_date);
                    summary.missing.push(ticket.key.clone());
                }
            }
        }

        info!("Opening versions resolved: {} (missing: {})", summary.resolved, summary.missing.len());
        summary
    }

    /// Derive injected versions from affected versions where possible
    pub fn apply_injected_from_affected(&self, tickets: &mut [Ticket], baseline: Option<&Release>) -> InjectedSummary {
        let mut summary = InjectedSummary::default();

        for ticket in tickets.iter_mut() {
            if ticket.affected_versions().is_empty() || ticket.injected().is_some() {
                continue;
            }

            match self.resolve_injected_from_affected(ticket.affected_versions()) {
                Some(release) => {
                    debug!("Ticket {} injected version {} derived from affected versions", ticket.key, release.name);
                    ticket.set_injected(release.clone(), InjectedSource::AffectedVersions);
                    summary.derived += 1;
                }
                None => {
                    let is_baseline = matches!(
                        (ticket.earliest_affected_version(), baseline),
                        (Some(earliest), Some(base)) if earliest.same_as(base)
                    );
                    if is_baseline {
                        summary.earliest_is_baseline += 1;
                    }
                    debug!("Ticket {} has no release before its earliest affected version", ticket.key);
                    summary.not_derivable.push(ticket.key.clone());
                }
            }
        }

        info!(
            "Injected versions from affected versions: {} derived, {} not derivable ({} at baseline)",
            summary.derived,
            summary.not_derivable.len(),
            summary.earliest_is_baseline
        );
        summary
    }
}
