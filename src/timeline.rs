//! Release timeline
//!
//! Releases ordered by release date, with the three date lookups used by the
//! pipeline stages:
//! - `first_on_or_after` (inclusive-after): fix version inference
//! - `latest_on_or_before` (inclusive-before): opening version, estimation
//! - `latest_strictly_before` (exclusive-before): injected version from AV
//!
//! When several releases share the selected date, the one that was added
//! first is returned.

use chrono::NaiveDate;
use log::{debug, warn};
use serde::Deserialize;

use crate::model::Release;

/// Release entry as listed by the tracker's versions endpoint
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub released: Option<bool>,
}

/// Ordered collection of releases
#[derive(Debug, Clone, Default)]
pub struct ReleaseTimeline {
    releases: Vec<Release>,
    rejected: usize,
}

impl ReleaseTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a timeline from raw listing entries.
    ///
    /// Entries without a parseable release date are logged and dropped.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = ReleaseRecord>,
    {
        let mut timeline = Self::new();
        for record in records {
            timeline.ingest(record);
        }
        timeline
    }

    /// Add a raw entry, returning false when it was rejected
    pub fn ingest(&mut self, record: ReleaseRecord) -> bool {
        let id = record.id.unwrap_or_default();
        let name = record.name.unwrap_or_default();

        let parsed = record
            .release_date
            .as_deref()
            .map(|raw| NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d"));

        match parsed {
            Some(Ok(release_date)) => {
                self.add(Release::new(id, name, release_date, record.released.unwrap_or(false)));
                true
            }
            Some(Err(e)) => {
                warn!("Release {} ({}) has an unparseable release date: {}", name, id, e);
                self.rejected += 1;
                false
            }
            None => {
                warn!("Release {} ({}) has no release date", name, id);
                self.rejected += 1;
                false
            }
        }
    }

    /// Insert a release keeping date order; equal dates keep insertion order
    pub fn add(&mut self, release: Release) {
        let index = self
            .releases
            .partition_point(|r| r.release_date <= release.release_date);
        debug!("Adding release {} ({}) at position {}", release.name, release.release_date, index);
        self.releases.insert(index, release);
    }

    pub fn all(&self) -> &[Release] {
        &self.releases
    }

    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    /// Number of listing entries dropped for lack of a usable date
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    pub fn first(&self) -> Option<&Release> {
        self.releases.first()
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Release> {
        self.releases.iter().find(|r| r.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Release> {
        self.releases.iter().find(|r| r.name == name)
    }

    /// Earliest release dated on or after `date`
    pub fn first_on_or_after(&self, date: NaiveDate) -> Option<&Release> {
        let index = self.releases.partition_point(|r| r.release_date < date);
        self.releases.get(index)
    }

    /// Latest release dated on or before `date`
    pub fn latest_on_or_before(&self, date: NaiveDate) -> Option<&Release> {
        let end = self.releases.partition_point(|r| r.release_date <= date);
        self.first_of_date_group(end)
    }

    /// Latest release dated strictly before `date`
    pub fn latest_strictly_before(&self, date: NaiveDate) -> Option<&Release> {
        let end = self.releases.partition_point(|r| r.release_date < date);
        self.first_of_date_group(end)
    }

    /// First release sharing the date of the release just before `end`
    fn first_of_date_group(&self, end: usize) -> Option<&Release> {
        let last = self.releases[..end].last()?;
        let start = self.releases.partition_point(|r| r.release_date < last.release_date);
        self.releases.get(start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_timeline() -> ReleaseTimeline {
        let mut timeline = ReleaseTimeline::new();
        // Deliberately out of order
        timeline.add(Release::new("3", "R3", date(2021, 1, 1), true));
        timeline.add(Release::new("1", "R1", date(2020, 1, 1), true));
        timeline.add(Release::new("2", "R2", date(2020, 6, 1), true));
        timeline
    }

    fn record(id: &str, name: &str, release_date: Option<&str>) -> ReleaseRecord {
        ReleaseRecord {
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            release_date: release_date.map(str::to_string),
            released: Some(true),
        }
    }

    #[test]
    fn test_add_keeps_date_order() {
        let timeline = sample_timeline();
        let names: Vec<_> = timeline.all().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["R1", "R2", "R3"]);
    }

    #[test]
    fn test_equal_dates_keep_insertion_order() {
        let mut timeline = ReleaseTimeline::new();
        timeline.add(Release::new("a", "A", date(2020, 1, 1), true));
        timeline.add(Release::new("b", "B", date(2020, 1, 1), true));
        timeline.add(Release::new("z", "Z", date(2019, 1, 1), true));

        let names: Vec<_> = timeline.all().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Z", "A", "B"]);
        assert_eq!(timeline.latest_on_or_before(date(2020, 5, 1)).unwrap().name, "A");
        assert_eq!(timeline.first_on_or_after(date(2019, 6, 1)).unwrap().name, "A");
        assert_eq!(timeline.latest_strictly_before(date(2020, 5, 1)).unwrap().name, "A");
    }

    #[test]
    fn test_opening_version_scenario() {
        let timeline = sample_timeline();
        assert_eq!(timeline.latest_on_or_before(date(2020, 3, 1)).unwrap().name, "R1");
        assert_eq!(timeline.latest_on_or_before(date(2020, 6, 1)).unwrap().name, "R2");
        assert!(timeline.latest_on_or_before(date(2019, 12, 31)).is_none());
    }

    #[test]
    fn test_edge_policies_differ() {
        let timeline = sample_timeline();
        let on_r2 = date(2020, 6, 1);

        assert_eq!(timeline.first_on_or_after(on_r2).unwrap().name, "R2");
        assert_eq!(timeline.latest_on_or_before(on_r2).unwrap().name, "R2");
        assert_eq!(timeline.latest_strictly_before(on_r2).unwrap().name, "R1");

        assert!(timeline.first_on_or_after(date(2021, 1, 2)).is_none());
        assert!(timeline.latest_strictly_before(date(2020, 1, 1)).is_none());
    }

    #[test]
    fn test_records_without_date_are_rejected() {
        let timeline = ReleaseTimeline::from_records(vec![
            record("1", "1.0", Some("2020-01-01")),
            record("2", "2.0", None),
            record("3", "3.0", Some("not-a-date")),
            record("4", "4.0", Some("2019-05-01")),
        ]);

        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline.rejected(), 2);
        assert_eq!(timeline.first().unwrap().name, "4.0");
        assert!(timeline.find_by_id("2").is_none());
        assert_eq!(timeline.find_by_name("1.0").unwrap().id, "1");
    }

    #[test]
    fn test_record_deserialization() {
        let json = r#"[{"id":"10","name":"4.0.0","releaseDate":"2011-12-07","released":true},
                       {"id":"11","name":"4.1.0","released":false}]"#;
        let records: Vec<ReleaseRecord> = serde_json::from_str(json).unwrap();
        let timeline = ReleaseTimeline::from_records(records);

        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline.first().unwrap().release_date, date(2011, 12, 7));
        assert!(timeline.first().unwrap().released);
    }

    fn arb_timeline() -> impl Strategy<Value = ReleaseTimeline> {
        prop::collection::vec(0i64..2000, 1..20).prop_map(|offsets| {
            let base = date(2015, 1, 1);
            let mut timeline = ReleaseTimeline::new();
            for (i, offset) in offsets.into_iter().enumerate() {
                let day = base + chrono::Duration::days(offset);
                timeline.add(Release::new(i.to_string(), format!("r{}", i), day, true));
            }
            timeline
        })
    }

    proptest! {
        #[test]
        fn prop_lookups_agree_on_release_dates(timeline in arb_timeline()) {
            for release in timeline.all() {
                let after = timeline.first_on_or_after(release.release_date).unwrap();
                let before = timeline.latest_on_or_before(release.release_date).unwrap();
                prop_assert!(after.same_as(before));
            }
        }

        #[test]
        fn prop_strictly_before_is_strict(timeline in arb_timeline(), offset in 0i64..2100) {
            let query_date = date(2015, 1, 1) + chrono::Duration::days(offset);
            if let Some(found) = timeline.latest_strictly_before(query_date) {
                prop_assert!(found.release_date < query_date);
            }
            if let Some(found) = timeline.latest_on_or_before(query_date) {
                prop_assert!(found.release_date <= query_date);
                prop_assert!(timeline.all().iter().all(|r| r.release_date > query_date || r.release_date <= found.release_date));
            }
            if let Some(found) = timeline.first_on_or_after(query_date) {
                prop_assert!(found.release_date >= query_date);
            }
        }
    }
}
