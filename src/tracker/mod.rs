//! Ticket Repository
//!
//! Retrieves releases and tickets from a Jira-compatible REST API.

pub mod error;
pub mod query;
pub mod records;
pub mod transport;

pub use error::{TrackerError, TrackerResult};
pub use transport::{TrackerTransport, UreqTransport};

use log::{debug, info, warn};

use crate::model::{Ticket, TicketFilter};
use crate::timeline::{ReleaseRecord, ReleaseTimeline};

/// Results per search request
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Tickets retrieved by one fetch
#[derive(Debug, Clone, Default)]
pub struct TicketFetch {
    pub tickets: Vec<Ticket>,
    /// Keys of tickets without a resolvable fix version
    pub fix_unknown: Vec<String>,
    /// Records skipped because they could not be parsed
    pub malformed: usize,
    /// Last total reported by the tracker
    pub total_reported: usize,
    /// Tickets counted in the total but never returned before an empty page
    pub unreturned: usize,
}

/// Client for one tracker project
pub struct TrackerClient<T: TrackerTransport> {
    transport: T,
    base_url: String,
    project: String,
    page_size: usize,
}

impl<T: TrackerTransport> TrackerClient<T> {
    pub fn new(transport: T, base_url: impl Into<String>, project: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            transport,
            base_url,
            project: project.into(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Retrieve the project's releases.
    ///
    /// Only the first `ceil(n * percentage)` entries of the listing are
    /// considered; entries without a release date are dropped.
    pub fn fetch_releases(&self, percentage: f64) -> TrackerResult<ReleaseTimeline> {
        let url = query::versions_url(&self.base_url, &self.project);
        let body = self.transport.get_json(&url)?;
        let records: Vec<ReleaseRecord> =
            serde_json::from_value(body).map_err(|e| TrackerError::invalid_response(&url, e.to_string()))?;

        let considered = releases_to_consider(records.len(), percentage);
        debug!("Considering {} of {} listed releases", considered, records.len());

        let timeline = ReleaseTimeline::from_records(records.into_iter().take(considered));
        for release in timeline.all() {
            info!("Available release: {} ({})", release.name, release.release_date);
        }
        if timeline.rejected() > 0 {
            warn!("{} releases were ignored for lack of a release date", timeline.rejected());
        }

        Ok(timeline)
    }

    /// Retrieve every ticket matching `filter`, page by page.
    ///
    /// The reported total is re-read on each page. A transport failure aborts
    /// the fetch; malformed records are skipped and counted.
    pub fn fetch_tickets(&self, filter: &TicketFilter, timeline: &ReleaseTimeline) -> TrackerResult<TicketFetch> {
        if filter.is_unrestricted() {
            warn!("No ticket filter configured; fetching every ticket of {}", self.project);
        }
        let jql = query::build_jql(&self.project, filter);
        debug!("Ticket query: {}", jql);

        let mut fetch = TicketFetch::default();
        let mut start_at = 0;
        let mut last_total = None;

        loop {
            let url = query::search_url(&self.base_url, &jql, start_at, self.page_size);
            let body = self.transport.get_json(&url)?;
            let page: records::SearchPage =
                serde_json::from_value(body).map_err(|e| TrackerError::invalid_response(&url, e.to_string()))?;

            if last_total != Some(page.total) {
                info!("Total number of issues: {}", page.total);
                last_total = Some(page.total);
            }
            fetch.total_reported = page.total;

            if page.issues.is_empty() {
                if start_at < page.total {
                    warn!("Tracker returned an empty page at {} of {}; stopping", start_at, page.total);
                    fetch.unreturned = page.total - start_at;
                }
                break;
            }

            start_at += page.issues.len();
            for raw in page.issues {
                match records::parse_ticket(raw, timeline) {
                    Ok(ticket) => {
                        if ticket.fixed().is_none() {
                            fetch.fix_unknown.push(ticket.key.clone());
                        }
                        fetch.tickets.push(ticket);
                    }
                    Err(e) => {
                        warn!("Skipping ticket record: {}", e);
                        fetch.malformed += 1;
                    }
                }
            }

            if start_at >= page.total {
                break;
            }
        }

        info!("Number of valid tickets found: {}", fetch.tickets.len());
        if !fetch.fix_unknown.is_empty() {
            warn!("{} tickets have no fix version: {}", fetch.fix_unknown.len(), fetch.fix_unknown.join(", "));
        }

        Ok(fetch)
    }
}

/// Number of listing entries covered by `percentage` (rounded up)
pub fn releases_to_consider(listed: usize, percentage: f64) -> usize {
    if percentage.is_nan() || percentage <= 0.0 {
        return 0;
    }
    let wanted = (listed as f64 * percentage.min(1.0)).ceil() as usize;
    wanted.min(listed)
}
