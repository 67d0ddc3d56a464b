use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use toml::Value;
use log::{debug, info};

use crate::model::{ResolutionType, TicketFilter, TicketStatus, TicketType};
use crate::pipeline::{PipelineSettings, SettingsError};

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "DEFECTSET_CONFIG";

/// Configuration storage - section_name -> key -> value
pub type Configuration = HashMap<String, HashMap<String, String>>;

/// Configuration manager
pub struct ConfigManager {
    config: Configuration,
    config_file_path: Option<PathBuf>,
    selected_section: Option<String>,
}

impl ConfigManager {
    /// Create a new ConfigManager from a Configuration (primarily for testing)
    pub fn from_config(config: Configuration) -> Self {
        Self {
            config,
            config_file_path: None,
            selected_section: None,
        }
    }

    /// Load configuration using discovery hierarchy
    pub fn load() -> Result<Self> {
        debug!("Starting configuration discovery");

        for path in discover_config_files() {
            debug!("Attempting to load config from: {}", path.display());
            if path.exists() {
                info!("Loading configuration from: {}", path.display());
                return Self::load_from_file(path);
            }
        }

        info!("No configuration file found, using empty configuration");
        Ok(Self::from_config(Configuration::new()))
    }

    /// Load configuration from explicit file path
    pub fn load_from_file(path: PathBuf) -> Result<Self> {
        debug!("Loading configuration from file: {}", path.display());

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = parse_toml_config(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        info!("Successfully loaded configuration from: {}", path.display());
        Ok(Self {
            config,
            config_file_path: Some(path),
            selected_section: None,
        })
    }

    pub fn config_file_path(&self) -> Option<&Path> {
        self.config_file_path.as_deref()
    }

    /// Get value from configuration with section fallback
    pub fn get_value(&self, section: &str, key: &str) -> Option<&String> {
        // Priority: selected_section -> specified section -> base
        if let Some(selected) = &self.selected_section {
            if let Some(value) = self.config.get(selected).and_then(|s| s.get(key)) {
                return Some(value);
            }
        }

        if let Some(value) = self.config.get(section).and_then(|s| s.get(key)) {
            return Some(value);
        }

        self.config.get("base").and_then(|s| s.get(key))
    }

    /// Select configuration section for --config-name
    pub fn select_section(&mut self, section: String) {
        debug!("Selecting configuration section: {}", section);
        self.selected_section = Some(section);
    }

    /// Get log level value with type conversion
    pub fn get_log_level(&self, section: &str, key: &str) -> Result<Option<log::LevelFilter>> {
        match self.get_value(section, key) {
            Some(value) => Ok(Some(crate::logging::parse_log_level(value)?)),
            None => Ok(None),
        }
    }

    /// Get path value with type conversion
    pub fn get_path(&self, section: &str, key: &str) -> Option<PathBuf> {
        self.get_value(section, key).map(PathBuf::from)
    }

    /// Get an unsigned integer value
    pub fn get_usize(&self, section: &str, key: &str) -> Result<Option<usize>, SettingsError> {
        self.get_parsed(section, key, "expected a non-negative integer")
    }

    /// Get a floating point value
    pub fn get_f64(&self, section: &str, key: &str) -> Result<Option<f64>, SettingsError> {
        self.get_parsed(section, key, "expected a number")
    }

    /// Get a list value, written either as a comma-separated string or as a
    /// TOML array of strings
    pub fn get_list(&self, section: &str, key: &str) -> Option<Vec<String>> {
        self.get_value(section, key).map(|value| split_list(value))
    }

    fn get_parsed<T: std::str::FromStr>(&self, section: &str, key: &str, reason: &str) -> Result<Option<T>, SettingsError> {
        match self.get_value(section, key) {
            Some(value) => value
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|_| SettingsError::invalid(format!("{}.{}", section, key), value.clone(), reason)),
            None => Ok(None),
        }
    }

    /// Build pipeline settings from the configuration.
    ///
    /// Required values that are absent stay empty; they are reported when
    /// the settings are validated, after command line overrides.
    pub fn get_pipeline_settings(&self) -> Result<PipelineSettings, SettingsError> {
        let project = self.get_value("project", "name").cloned().unwrap_or_default();
        let tracker_url = self.get_value("tracker", "base-url").cloned().unwrap_or_default();
        let mut settings = PipelineSettings::new(project, tracker_url);

        settings.repo_path = self.get_path("project", "repo-path");
        settings.filter = self.get_ticket_filter();

        if let Some(page_size) = self.get_usize("tracker", "page-size")? {
            settings.page_size = page_size;
        }
        if let Some(percentage) = self.get_f64("releases", "percentage")? {
            settings.release_percentage = percentage;
        }
        if let Some(strategy) = self.get_value("proportion", "strategy") {
            settings.strategy = strategy
                .parse()
                .map_err(|reason: String| SettingsError::invalid("proportion.strategy", strategy.clone(), reason))?;
        }
        settings.baseline_release = self.get_value("proportion", "baseline-release").cloned();
        settings.release_info = self.get_path("output", "release-info");

        debug!("Pipeline settings from configuration: {:?}", settings);
        Ok(settings)
    }

    /// Ticket filter from `[tracker]`; lists that are not configured keep
    /// their fixed-bug defaults
    pub fn get_ticket_filter(&self) -> TicketFilter {
        let mut filter = TicketFilter::fixed_bugs();
        if let Some(statuses) = self.get_list("tracker", "statuses") {
            filter.statuses = TicketFilter::parse_list(&statuses.join(","), TicketStatus::from_name);
        }
        if let Some(types) = self.get_list("tracker", "types") {
            filter.types = TicketFilter::parse_list(&types.join(","), TicketType::from_name);
        }
        if let Some(resolutions) = self.get_list("tracker", "resolutions") {
            filter.resolutions = TicketFilter::parse_list(&resolutions.join(","), ResolutionType::from_name);
        }
        filter
    }
}

/// Discover configuration files in order of precedence
fn discover_config_files() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // 1. Environment variable
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        paths.push(PathBuf::from(env_path));
    }

    // 2. XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("defectset").join("config.toml"));
    }

    // 3. Home directory
    if let Some(home_dir) = dirs::home_dir() {
        paths.push(home_dir.join(".defectset.toml"));
    }

    // 4. Project local
    paths.push(PathBuf::from("./.defectset.toml"));

    debug!("Config discovery paths: {:?}", paths);
    paths
}

/// Parse TOML content to string-based configuration
fn parse_toml_config(content: &str) -> Result<Configuration> {
    let toml_value: Value = content.parse()
        .context("Failed to parse TOML content")?;

    let mut config = Configuration::new();

    if let Value::Table(table) = toml_value {
        flatten_toml_table(&table, String::new(), &mut config);
    }

    debug!("Parsed configuration: {:?}", config);
    Ok(config)
}

/// Recursively flatten TOML tables into section.subsection format
fn flatten_toml_table(table: &toml::Table, prefix: String, config: &mut Configuration) {
    for (key, value) in table {
        let section_name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            Value::Table(subtable) => {
                if subtable.values().all(|v| !matches!(v, Value::Table(_))) {
                    // Leaf table: a configuration section
                    let section_map = subtable
                        .iter()
                        .map(|(subkey, subvalue)| (subkey.clone(), toml_value_to_string(subvalue)))
                        .collect();
                    config.insert(section_name, section_map);
                } else {
                    flatten_toml_table(subtable, section_name, config);
                }
            }
            _ => {
                let mut section_map = HashMap::new();
                section_map.insert("value".to_string(), toml_value_to_string(value));
                config.insert(section_name, section_map);
            }
        }
    }
}

/// Convert TOML Value to string representation
fn toml_value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Datetime(d) => d.to_string(),
        Value::Array(_) | Value::Table(_) => value.to_string(),
    }
}

/// Split a comma-separated value or a rendered TOML array of strings
fn split_list(value: &str) -> Vec<String> {
    value
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|item| item.trim().trim_matches('"').trim_matches('\'').trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::StrategySelection;
    use crate::proportion::Strategy;
    use std::fs;
    use tempfile::NamedTempFile;

    fn manager_from(toml_content: &str) -> ConfigManager {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(&temp_file, toml_content).unwrap();
        ConfigManager::load_from_file(temp_file.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_toml_value_to_string_conversion() {
        assert_eq!(toml_value_to_string(&Value::String("test".to_string())), "test");
        assert_eq!(toml_value_to_string(&Value::Integer(42)), "42");
        assert_eq!(toml_value_to_string(&Value::Float(0.75)), "0.75");
        assert_eq!(toml_value_to_string(&Value::Boolean(true)), "true");
    }

    #[test]
    fn test_parse_toml_config() {
        let toml_content = r#"
[base]
log-format = "json"
log-file = "/tmp/defectset.log"

[project]
name = "BOOKKEEPER"

[profiles.nightly]
strategy = "compare"
"#;

        let config = parse_toml_config(toml_content).unwrap();

        assert_eq!(config.get("base").unwrap().get("log-format").unwrap(), "json");
        assert_eq!(config.get("base").unwrap().get("log-file").unwrap(), "/tmp/defectset.log");
        assert_eq!(config.get("project").unwrap().get("name").unwrap(), "BOOKKEEPER");
        assert_eq!(config.get("profiles.nightly").unwrap().get("strategy").unwrap(), "compare");
    }

    #[test]
    fn test_config_manager_value_retrieval() {
        let mut config = Configuration::new();

        let mut base_section = HashMap::new();
        base_section.insert("log-format".to_string(), "text".to_string());
        base_section.insert("console-level".to_string(), "info".to_string());
        config.insert("base".to_string(), base_section);

        let mut tracker_section = HashMap::new();
        tracker_section.insert("page-size".to_string(), "50".to_string());
        tracker_section.insert("log-format".to_string(), "json".to_string());
        config.insert("tracker".to_string(), tracker_section);

        let manager = ConfigManager::from_config(config);

        assert_eq!(manager.get_value("tracker", "console-level").unwrap(), "info");
        assert_eq!(manager.get_value("tracker", "log-format").unwrap(), "json");
        assert_eq!(manager.get_value("tracker", "page-size").unwrap(), "50");
        assert!(manager.get_value("tracker", "missing").is_none());
    }

    #[test]
    fn test_config_manager_section_selection() {
        let mut manager = manager_from(
            r#"
[proportion]
strategy = "exclude-baseline"

[nightly]
strategy = "compare"
"#,
        );

        assert_eq!(manager.get_value("proportion", "strategy").unwrap(), "exclude-baseline");

        manager.select_section("nightly".to_string());
        assert_eq!(manager.get_value("proportion", "strategy").unwrap(), "compare");
    }

    #[test]
    fn test_config_manager_type_conversion() {
        let manager = manager_from(
            r#"
[base]
log-level = "info"
invalid-level = "invalid"
path = "/tmp/test"
count = 12
ratio = 0.25
"#,
        );

        assert_eq!(manager.get_log_level("base", "log-level").unwrap(), Some(log::LevelFilter::Info));
        assert!(manager.get_log_level("base", "invalid-level").is_err());

        assert_eq!(manager.get_path("base", "path").unwrap(), PathBuf::from("/tmp/test"));
        assert_eq!(manager.get_usize("base", "count").unwrap(), Some(12));
        assert!(manager.get_usize("base", "path").is_err());
        assert_eq!(manager.get_f64("base", "ratio").unwrap(), Some(0.25));
    }

    #[test]
    fn test_get_list_accepts_strings_and_arrays() {
        let manager = manager_from(
            r#"
[tracker]
statuses = "Closed, Resolved"
types = ["Bug", "Improvement"]
"#,
        );

        assert_eq!(manager.get_list("tracker", "statuses").unwrap(), vec!["Closed", "Resolved"]);
        assert_eq!(manager.get_list("tracker", "types").unwrap(), vec!["Bug", "Improvement"]);
        assert!(manager.get_list("tracker", "resolutions").is_none());
    }

    #[test]
    fn test_config_file_loading() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(&temp_file, "[project]\nname = \"ZOOKEEPER\"\n").unwrap();

        let manager = ConfigManager::load_from_file(temp_file.path().to_path_buf()).unwrap();

        assert_eq!(manager.get_value("project", "name").unwrap(), "ZOOKEEPER");
        assert_eq!(manager.config_file_path().unwrap(), temp_file.path());
    }

    #[test]
    fn test_config_file_with_invalid_toml() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(&temp_file, "[project\nname = ").unwrap();
        assert!(ConfigManager::load_from_file(temp_file.path().to_path_buf()).is_err());
    }

    #[test]
    fn test_pipeline_settings_defaults() {
        let manager = ConfigManager::from_config(Configuration::new());
        let settings = manager.get_pipeline_settings().unwrap();

        assert!(settings.project.is_empty());
        assert_eq!(settings.filter, TicketFilter::fixed_bugs());
        assert_eq!(settings.release_percentage, 1.0);
        assert!(settings.release_info.is_none());
    }

    #[test]
    fn test_pipeline_settings_from_toml() {
        let manager = manager_from(
            r#"
[project]
name = "BOOKKEEPER"
repo-path = "/src/bookkeeper"

[tracker]
base-url = "https://issues.apache.org/jira/rest/api/2/"
page-size = 500
statuses = "Closed"
resolutions = ["Fixed", "Won't Fix"]

[releases]
percentage = 0.5

[proportion]
strategy = "force-baseline-iv"
baseline-release = "4.0.0"

[output]
release-info = "releases.csv"
"#,
        );

        let settings = manager.get_pipeline_settings().unwrap();

        assert_eq!(settings.project, "BOOKKEEPER");
        assert_eq!(settings.repo_path, Some(PathBuf::from("/src/bookkeeper")));
        assert_eq!(settings.tracker_url, "https://issues.apache.org/jira/rest/api/2/");
        assert_eq!(settings.page_size, 500);
        assert_eq!(settings.filter.statuses, vec![TicketStatus::Closed]);
        assert_eq!(settings.filter.types, vec![TicketType::Bug]);
        assert_eq!(settings.filter.resolutions, vec![ResolutionType::Fixed, ResolutionType::WontFix]);
        assert_eq!(settings.release_percentage, 0.5);
        assert_eq!(settings.strategy, StrategySelection::Single(Strategy::ForceBaselineIv));
        assert_eq!(settings.baseline_release.as_deref(), Some("4.0.0"));
        assert_eq!(settings.release_info, Some(PathBuf::from("releases.csv")));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_pipeline_settings_invalid_values() {
        let manager = manager_from("[tracker]\npage-size = \"lots\"\n");
        assert!(matches!(manager.get_pipeline_settings(), Err(SettingsError::Invalid { .. })));

        let manager = manager_from("[proportion]\nstrategy = \"median\"\n");
        assert!(matches!(manager.get_pipeline_settings(), Err(SettingsError::Invalid { .. })));
    }
}
