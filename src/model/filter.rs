//! Ticket filter and the tracker enumerations it is built from

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ticket workflow status as reported by the tracker
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketStatus {
    Open,
    InProgress,
    Reopened,
    Resolved,
    Closed,
    PatchAvailable,
    Other(String),
}

impl TicketStatus {
    /// Name used by the tracker, also used in JQL queries
    pub fn as_str(&self) -> &str {
        match self {
            TicketStatus::Open => "Open",
            TicketStatus::InProgress => "In Progress",
            TicketStatus::Reopened => "Reopened",
            TicketStatus::Resolved => "Resolved",
            TicketStatus::Closed => "Closed",
            TicketStatus::PatchAvailable => "Patch Available",
            TicketStatus::Other(name) => name,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match normalize(name).as_str() {
            "open" => TicketStatus::Open,
            "inprogress" => TicketStatus::InProgress,
            "reopened" => TicketStatus::Reopened,
            "resolved" => TicketStatus::Resolved,
            "closed" => TicketStatus::Closed,
            "patchavailable" => TicketStatus::PatchAvailable,
            _ => TicketStatus::Other(name.trim().to_string()),
        }
    }
}

/// Ticket issue type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketType {
    Bug,
    Improvement,
    NewFeature,
    Task,
    SubTask,
    Test,
    Wish,
    Other(String),
}

impl TicketType {
    pub fn as_str(&self) -> &str {
        match self {
            TicketType::Bug => "Bug",
            TicketType::Improvement => "Improvement",
            TicketType::NewFeature => "New Feature",
            TicketType::Task => "Task",
            TicketType::SubTask => "Sub-task",
            TicketType::Test => "Test",
            TicketType::Wish => "Wish",
            TicketType::Other(name) => name,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match normalize(name).as_str() {
            "bug" => TicketType::Bug,
            "improvement" => TicketType::Improvement,
            "newfeature" => TicketType::NewFeature,
            "task" => TicketType::Task,
            "subtask" => TicketType::SubTask,
            "test" => TicketType::Test,
            "wish" => TicketType::Wish,
            _ => TicketType::Other(name.trim().to_string()),
        }
    }
}

/// Ticket resolution
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionType {
    Solved,
    Fixed,
    WontFix,
    Other(String),
}

impl ResolutionType {
    pub fn as_str(&self) -> &str {
        match self {
            ResolutionType::Solved => "Solved",
            ResolutionType::Fixed => "Fixed",
            ResolutionType::WontFix => "Won't Fix",
            ResolutionType::Other(name) => name,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match normalize(name).as_str() {
            "solved" => ResolutionType::Solved,
            "fixed" => ResolutionType::Fixed,
            "wontfix" => ResolutionType::WontFix,
            _ => ResolutionType::Other(name.trim().to_string()),
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(TicketStatus, TicketType, ResolutionType);

/// Lowercase and drop separators so "Won't Fix", "wont-fix" and "WONT_FIX" agree
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Which tickets to retrieve from the tracker.
///
/// An empty list places no restriction on that dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFilter {
    pub statuses: Vec<TicketStatus>,
    pub types: Vec<TicketType>,
    pub resolutions: Vec<ResolutionType>,
}

impl TicketFilter {
    /// Closed or resolved bugs with a fixed resolution
    pub fn fixed_bugs() -> Self {
        Self {
            statuses: vec![TicketStatus::Closed, TicketStatus::Resolved],
            types: vec![TicketType::Bug],
            resolutions: vec![ResolutionType::Fixed],
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.statuses.is_empty() && self.types.is_empty() && self.resolutions.is_empty()
    }

    /// Parse a comma-separated list of names, as found in configuration files
    pub fn parse_list<T>(value: &str, from_name: fn(&str) -> T) -> Vec<T> {
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(from_name)
            .collect()
    }
}
