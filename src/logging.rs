//! Logging for defectset
//!
//! A `log::Log` implementation writing one line per record to stderr, a file,
//! or both, with independent console and file levels. Each line carries the
//! pipeline stage that emitted it, taken from the record target
//! (`defectset::tracker` is logged as `tracker`).

use anyhow::{Context, Result};
use chrono::Local;
use log::{Level, LevelFilter, Metadata, Record};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}. Valid options: text, json", s)),
        }
    }
}

/// Log destination options
#[derive(Debug, Clone, PartialEq)]
pub enum LogDestination {
    Console,
    File(PathBuf),
    Both(PathBuf),
}

impl LogDestination {
    fn file_path(&self) -> Option<&PathBuf> {
        match self {
            LogDestination::Console => None,
            LogDestination::File(path) | LogDestination::Both(path) => Some(path),
        }
    }

    fn writes_console(&self) -> bool {
        !matches!(self, LogDestination::File(_))
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub console_level: LevelFilter,
    pub file_level: Option<LevelFilter>,
    pub format: LogFormat,
    pub destination: LogDestination,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            console_level: LevelFilter::Info,
            file_level: None,
            format: LogFormat::Text,
            destination: LogDestination::Console,
        }
    }
}

/// One JSON log line
#[derive(Debug, Serialize)]
struct JsonLine<'a> {
    timestamp: &'a str,
    level: &'a str,
    stage: &'a str,
    message: &'a str,
}

/// Pipeline stage name of a record target
fn stage_of(target: &str) -> &str {
    let module = target.strip_prefix("defectset::").unwrap_or(target);
    module.split("::").next().unwrap_or(module)
}

pub struct DefectsetLogger {
    config: LogConfig,
    file: Option<Mutex<File>>,
}

impl DefectsetLogger {
    /// Create the logger, opening the log file once in append mode
    pub fn new(config: LogConfig) -> Result<Self> {
        let file = match config.destination.file_path() {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("Failed to open log file: {}", path.display()))?;
                Some(Mutex::new(file))
            }
            None => None,
        };
        Ok(Self { config, file })
    }

    fn format_line(&self, level: Level, target: &str, message: &str) -> String {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let level = level.as_str();
        let stage = stage_of(target);

        match self.config.format {
            LogFormat::Text => format!("{} [{}] {}: {}", timestamp, level, stage, message),
            LogFormat::Json => {
                let line = JsonLine { timestamp: &timestamp, level, stage, message };
                serde_json::to_string(&line)
                    .unwrap_or_else(|_| format!("{} [{}] {}: {}", timestamp, level, stage, message))
            }
        }
    }

    fn console_accepts(&self, level: Level) -> bool {
        self.config.destination.writes_console() && level <= self.config.console_level
    }

    fn file_accepts(&self, level: Level) -> bool {
        self.file.is_some() && self.config.file_level.map_or(false, |file_level| level <= file_level)
    }

    fn write_file(&self, line: &str) -> io::Result<()> {
        match &self.file {
            Some(file) => {
                let mut file = file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                writeln!(file, "{}", line)
            }
            None => Ok(()),
        }
    }
}

impl log::Log for DefectsetLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.console_accepts(metadata.level()) || self.file_accepts(metadata.level())
    }

    fn log(&self, record: &Record) {
        let level = record.level();
        let to_console = self.console_accepts(level);
        let to_file = self.file_accepts(level);
        if !to_console && !to_file {
            return;
        }

        let line = self.format_line(level, record.target(), &record.args().to_string());

        if to_file {
            if let Err(e) = self.write_file(&line) {
                eprintln!("File logging error: {}", e);
            }
        }
        if to_console {
            let _ = writeln!(io::stderr(), "{}", line);
        }
    }

    fn flush(&self) {
        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                let _ = file.flush();
            }
        }
        let _ = io::stderr().flush();
    }
}

/// Install the logger as the global `log` backend
pub fn init_logger(config: LogConfig) -> Result<()> {
    let max_level = effective_max_level(&config);
    let logger = DefectsetLogger::new(config)?;

    log::set_boxed_logger(Box::new(logger)).context("Failed to set global logger")?;
    log::set_max_level(max_level);

    Ok(())
}

/// Most verbose level any destination accepts
fn effective_max_level(config: &LogConfig) -> LevelFilter {
    match config.file_level {
        Some(file_level) => file_level.max(config.console_level),
        None => config.console_level,
    }
}

/// Parse a level name such as `debug` or `WARN`
pub fn parse_log_level(level_str: &str) -> Result<LevelFilter> {
    LevelFilter::from_str(level_str.trim()).map_err(|_| {
        anyhow::anyhow!(
            "Invalid log level: {}. Valid levels: error, warn, info, debug, trace, off",
            level_str
        )
    })
}
