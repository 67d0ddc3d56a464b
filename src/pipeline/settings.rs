//! Pipeline Settings

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::model::TicketFilter;
use crate::proportion::Strategy;
use crate::tracker::DEFAULT_PAGE_SIZE;

/// Invalid or missing pipeline settings
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SettingsError {
    #[error("Missing required setting: {key}")]
    Missing { key: String },

    #[error("Invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

impl SettingsError {
    pub fn missing(key: impl Into<String>) -> Self {
        Self::Missing { key: key.into() }
    }

    pub fn invalid(key: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Which proportion runs the pipeline performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategySelection {
    Single(Strategy),
    /// ExcludeBaseline, then ForceBaselineIv after resetting estimates
    Compare,
}

impl StrategySelection {
    /// Strategies in the order they are run
    pub fn strategies(self) -> Vec<Strategy> {
        match self {
            StrategySelection::Single(strategy) => vec![strategy],
            StrategySelection::Compare => vec![Strategy::ExcludeBaseline, Strategy::ForceBaselineIv],
        }
    }
}

impl Default for StrategySelection {
    fn default() -> Self {
        StrategySelection::Single(Strategy::ExcludeBaseline)
    }
}

impl fmt::Display for StrategySelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategySelection::Single(strategy) => write!(f, "{}", strategy),
            StrategySelection::Compare => f.write_str("compare"),
        }
    }
}

impl FromStr for StrategySelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("compare") {
            return Ok(StrategySelection::Compare);
        }
        s.parse::<Strategy>()
            .map(StrategySelection::Single)
            .map_err(|_| format!(
                "Invalid proportion strategy: {}. Valid options: exclude-baseline, force-baseline-iv, compare",
                s
            ))
    }
}

/// Everything one pipeline run needs to know
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    /// Tracker project key, also the commit reference prefix
    pub project: String,
    /// REST API root, e.g. `https://issues.apache.org/jira/rest/api/2/`
    pub tracker_url: String,
    pub repo_path: Option<PathBuf>,
    pub filter: TicketFilter,
    pub page_size: usize,
    /// Fraction of the release listing analysed, `0 < p <= 1`
    pub release_percentage: f64,
    pub baseline_release: Option<String>,
    pub strategy: StrategySelection,
    /// Where the release CSV is written, if anywhere
    pub release_info: Option<PathBuf>,
}

impl PipelineSettings {
    pub fn new(project: impl Into<String>, tracker_url: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            tracker_url: tracker_url.into(),
            repo_path: None,
            filter: TicketFilter::fixed_bugs(),
            page_size: DEFAULT_PAGE_SIZE,
            release_percentage: 1.0,
            baseline_release: None,
            strategy: StrategySelection::default(),
            release_info: None,
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.project.trim().is_empty() {
            return Err(SettingsError::missing("project.name"));
        }
        if self.tracker_url.trim().is_empty() {
            return Err(SettingsError::missing("tracker.base-url"));
        }
        if self.page_size == 0 {
            return Err(SettingsError::invalid("tracker.page-size", "0", "must be at least 1"));
        }
        if !(self.release_percentage > 0.0 && self.release_percentage <= 1.0) {
            return Err(SettingsError::invalid(
                "releases.percentage",
                self.release_percentage.to_string(),
                "must be greater than 0 and at most 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = PipelineSettings::new("BOOKKEEPER", "https://issues.apache.org/jira/rest/api/2/");
        assert!(settings.validate().is_ok());
        assert_eq!(settings.filter, TicketFilter::fixed_bugs());
        assert_eq!(settings.strategy, StrategySelection::Single(Strategy::ExcludeBaseline));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut settings = PipelineSettings::new("", "http://tracker/");
        assert_eq!(settings.validate(), Err(SettingsError::missing("project.name")));

        settings.project = "P".to_string();
        settings.release_percentage = 0.0;
        assert!(matches!(settings.validate(), Err(SettingsError::Invalid { .. })));

        settings.release_percentage = f64::NAN;
        assert!(settings.validate().is_err());

        settings.release_percentage = 0.5;
        settings.page_size = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_strategy_selection_parsing() {
        assert_eq!("compare".parse::<StrategySelection>().unwrap(), StrategySelection::Compare);
        assert_eq!(
            "force-baseline-iv".parse::<StrategySelection>().unwrap(),
            StrategySelection::Single(Strategy::ForceBaselineIv)
        );
        assert!("median".parse::<StrategySelection>().is_err());
        assert_eq!(StrategySelection::Compare.strategies().len(), 2);
        assert_eq!(StrategySelection::Compare.to_string(), "compare");
    }
}
