use chrono::NaiveDate;
use serde::Serialize;

/// Immutable view of a single VCS commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    pub commit_id: String,
    pub author_name: String,
    pub author_email: String,
    pub commit_date: NaiveDate,
    pub message: String,
}

impl CommitInfo {
    pub fn new(
        commit_id: impl Into<String>,
        author_name: impl Into<String>,
        author_email: impl Into<String>,
        commit_date: NaiveDate,
        message: impl Into<String>,
    ) -> Self {
        Self {
            commit_id: commit_id.into(),
            author_name: author_name.into(),
            author_email: author_email.into(),
            commit_date,
            message: message.into(),
        }
    }

    /// First line of the message, for log output
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}
