use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A project release as listed by the issue tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub id: String,
    pub name: String,
    pub release_date: NaiveDate,
    pub released: bool,
}

impl Release {
    pub fn new(id: impl Into<String>, name: impl Into<String>, release_date: NaiveDate, released: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            release_date,
            released,
        }
    }

    /// Identity comparison. Never used for ordering.
    pub fn same_as(&self, other: &Release) -> bool {
        self.id == other.id
    }

    /// Whole days from this release to `later` (negative when `later` precedes it)
    pub fn days_until(&self, later: &Release) -> i64 {
        (later.release_date - self.release_date).num_days()
    }
}
