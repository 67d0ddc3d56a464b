use clap::Parser;
use anyhow::Result;
use std::path::PathBuf;
use log::{debug, info};

use crate::pipeline::{PipelineSettings, StrategySelection};

/// Defect dataset builder
#[derive(Parser, Debug)]
#[command(name = "defectset")]
#[command(about = "Builds a defect dataset from a git history and its issue tracker, estimating missing injected versions by proportion")]
#[command(version)]
pub struct Args {
    /// Path to git repository (defaults to the configured repo-path, then the current directory)
    #[arg(short = 'r', long = "repo", alias = "repository", value_name = "PATH")]
    pub repository: Option<String>,

    /// Tracker project key, e.g. BOOKKEEPER
    #[arg(short = 'p', long = "project", value_name = "KEY")]
    pub project: Option<String>,

    /// Tracker REST API root, e.g. https://issues.apache.org/jira/rest/api/2/
    #[arg(long = "tracker-url", value_name = "URL")]
    pub tracker_url: Option<String>,

    /// Proportion strategy: exclude-baseline, force-baseline-iv or compare
    #[arg(long, value_name = "STRATEGY")]
    pub strategy: Option<String>,

    /// Name of the baseline release (defaults to the earliest release)
    #[arg(long, value_name = "RELEASE")]
    pub baseline: Option<String>,

    /// Fraction of the release listing to analyse (0 < p <= 1)
    #[arg(long = "release-percentage", value_name = "FRACTION")]
    pub release_percentage: Option<f64>,

    /// Tickets requested per tracker page
    #[arg(long = "page-size", value_name = "N")]
    pub page_size: Option<usize>,

    /// Write the release timeline as CSV to this file
    #[arg(long = "release-info", value_name = "FILE")]
    pub release_info: Option<PathBuf>,

    /// Print the resolved versions of every ticket
    #[arg(long = "show-tickets")]
    pub show_tickets: bool,

    /// Verbose output (debug level logging)
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet output (error level logging only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Debug output (trace level logging)
    #[arg(long)]
    pub debug: bool,

    /// Log format: text or json
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log file path for file output
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level for file output (independent of console level)
    #[arg(long, value_name = "LEVEL")]
    pub log_file_level: Option<String>,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Configuration section name
    #[arg(long, value_name = "SECTION")]
    pub config_name: Option<String>,
}

impl Args {
    /// Override configured pipeline settings with the flags given on the command line
    pub fn apply_to_settings(&self, settings: &mut PipelineSettings) -> Result<()> {
        if let Some(project) = &self.project {
            settings.project = project.clone();
        }
        if let Some(url) = &self.tracker_url {
            settings.tracker_url = url.clone();
        }
        if let Some(repository) = &self.repository {
            settings.repo_path = Some(PathBuf::from(repository));
        }
        if let Some(strategy) = &self.strategy {
            settings.strategy = strategy.parse::<StrategySelection>().map_err(anyhow::Error::msg)?;
        }
        if let Some(baseline) = &self.baseline {
            settings.baseline_release = Some(baseline.clone());
        }
        if let Some(percentage) = self.release_percentage {
            settings.release_percentage = percentage;
        }
        if let Some(page_size) = self.page_size {
            settings.page_size = page_size;
        }
        if let Some(path) = &self.release_info {
            settings.release_info = Some(path.clone());
        }
        Ok(())
    }
}

/// Parse command line arguments
pub fn parse_args() -> Args {
    debug!("Parsing command line arguments");
    let args = Args::parse();
    debug!("Parsed CLI arguments: {:?}", args);
    args
}

/// Validate CLI argument combinations
pub fn validate_args(args: &Args) -> Result<()> {
    debug!("Validating CLI argument combinations");

    let log_flags_count = [args.verbose, args.quiet, args.debug]
        .iter()
        .filter(|&&flag| flag)
        .count();

    if log_flags_count > 1 {
        return Err(anyhow::anyhow!(
            "Conflicting log level flags: only one of --verbose, --quiet, or --debug may be specified"
        ));
    }

    match args.log_format.to_lowercase().as_str() {
        "text" | "json" => {},
        _ => return Err(anyhow::anyhow!(
            "Invalid log format '{}'. Valid options: text, json", args.log_format
        )),
    }

    if let Some(ref level) = args.log_file_level {
        match level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {},
            _ => return Err(anyhow::anyhow!(
                "Invalid log file level '{}'. Valid levels: error, warn, info, debug, trace", level
            )),
        }
    }

    if args.log_file_level.is_some() && args.log_file.is_none() {
        return Err(anyhow::anyhow!(
            "--log-file-level requires --log-file to be specified"
        ));
    }

    if let Some(ref strategy) = args.strategy {
        strategy.parse::<StrategySelection>().map_err(anyhow::Error::msg)?;
    }

    if let Some(percentage) = args.release_percentage {
        if !(percentage > 0.0 && percentage <= 1.0) {
            return Err(anyhow::anyhow!(
                "Invalid release percentage {}. Expected a fraction greater than 0 and at most 1", percentage
            ));
        }
    }

    if args.page_size == Some(0) {
        return Err(anyhow::anyhow!("--page-size must be at least 1"));
    }

    info!("CLI arguments validated successfully");
    Ok(())
}
