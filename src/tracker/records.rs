//! Ticket records as returned by the tracker search endpoint

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;

use super::error::{TrackerError, TrackerResult};
use crate::model::{FixSource, Release, ResolutionType, Ticket, TicketStatus, TicketType};
use crate::timeline::ReleaseTimeline;

/// Timestamp layout used by the tracker, e.g. `2013-02-05T14:25:33.000+0000`
pub const TRACKER_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

/// One page of search results
#[derive(Debug, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub issues: Vec<serde_json::Value>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
struct IssueRecord {
    id: String,
    key: String,
    fields: IssueFields,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueFields {
    created: String,
    #[serde(default)]
    resolutiondate: Option<String>,
    #[serde(default)]
    updated: Option<String>,
    #[serde(default)]
    issuetype: Option<NamedValue>,
    #[serde(default)]
    status: Option<NamedValue>,
    #[serde(default)]
    assignee: Option<NamedValue>,
    #[serde(default)]
    resolution: Option<NamedValue>,
    #[serde(default)]
    versions: Option<Vec<IdRef>>,
    #[serde(default)]
    fix_versions: Option<Vec<IdRef>>,
}

#[derive(Debug, Deserialize)]
struct NamedValue {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdRef {
    #[serde(default)]
    id: Option<String>,
}

/// Parse a tracker timestamp, keeping the calendar date of its own offset
pub fn parse_tracker_date(value: &str) -> TrackerResult<NaiveDate> {
    DateTime::parse_from_str(value.trim(), TRACKER_DATE_FORMAT)
        .map(|dt| dt.date_naive())
        .map_err(|_| TrackerError::InvalidDate {
            value: value.to_string(),
        })
}

/// Pick the fix version among candidates: latest release date, first on ties
pub fn select_fix_version<'a, I>(candidates: I) -> Option<&'a Release>
where
    I: IntoIterator<Item = &'a Release>,
{
    candidates
        .into_iter()
        .reduce(|best, r| if r.release_date > best.release_date { r } else { best })
}

/// Turn a raw search result into a ticket resolved against the timeline
pub fn parse_ticket(raw: serde_json::Value, timeline: &ReleaseTimeline) -> TrackerResult<Ticket> {
    let record: IssueRecord = serde_json::from_value(raw).map_err(|e| TrackerError::malformed(e.to_string()))?;
    let fields = record.fields;

    let issue_date = parse_tracker_date(&fields.created)?;
    let closed_raw = fields
        .resolutiondate
        .as_deref()
        .or(fields.updated.as_deref())
        .ok_or_else(|| TrackerError::malformed(format!("{} has neither resolutiondate nor updated", record.key)))?;
    let closed_date = parse_tracker_date(closed_raw)?;

    let name_of = |value: &Option<NamedValue>| value.as_ref().and_then(|v| v.name.clone());

    let ticket_type = name_of(&fields.issuetype)
        .map(|n| TicketType::from_name(&n))
        .unwrap_or_else(|| TicketType::Other(String::new()));
    let status = name_of(&fields.status)
        .map(|n| TicketStatus::from_name(&n))
        .unwrap_or_else(|| TicketStatus::Other(String::new()));
    let assignee = name_of(&fields.assignee).unwrap_or_default();

    let mut ticket = Ticket::new(record.id, record.key, issue_date, closed_date, ticket_type, status, assignee);
    ticket.resolution = name_of(&fields.resolution).map(|n| ResolutionType::from_name(&n));

    let fix_candidates: Vec<&Release> = resolve_ids(fields.fix_versions.as_deref(), timeline);
    if let Some(fixed) = select_fix_version(fix_candidates) {
        ticket.set_fixed(fixed.clone(), FixSource::Tracker);
    }

    let affected = resolve_ids(fields.versions.as_deref(), timeline)
        .into_iter()
        .cloned()
        .collect();
    ticket.set_affected_versions(affected);

    Ok(ticket)
}

/// Releases of the timeline referenced by id, in reference order
fn resolve_ids<'a>(refs: Option<&[IdRef]>, timeline: &'a ReleaseTimeline) -> Vec<&'a Release> {
    refs.unwrap_or_default()
        .iter()
        .filter_map(|r| r.id.as_deref())
        .filter_map(|id| timeline.find_by_id(id))
        .collect()
}
