//! Core configuration types.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::{SOURCE_FILENAME_MAX_LENGTH_DEFAULT, TARGET_FILENAME_MAX_LENGTH_DEFAULT};
use crate::naming::TargetNameTemplate;
use crate::sieve::Sieve;

/// How much diagnostic output goes to the console and the log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    #[default]
    Normal,
    Info,
    /// Debug/trace
    Debug,
}

impl LogLevel {
    /// Case-insensitive parse of the usual spellings.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Whether per-file accept/reject events are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    #[default]
    Normal,
    High,
}

impl Verbosity {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" | "low" => Some(Verbosity::Normal),
            "high" => Some(Verbosity::High),
            _ => None,
        }
    }

    pub fn is_high(self) -> bool {
        self == Verbosity::High
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verbosity::Normal => "normal",
            Verbosity::High => "high",
        })
    }
}

/// Runtime configuration of one run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory walked by the selection
    pub source_path: PathBuf,
    /// Archive directory holding the copies and the catalog
    pub target_path: PathBuf,
    pub target_name_template: TargetNameTemplate,
    /// Sieves in document order, numbered from 1
    pub sieves: Vec<Sieve>,
    pub verbosity: Verbosity,
    pub log_level: LogLevel,
    pub use_log_file: bool,
    pub log_file: Option<PathBuf>,
    /// Truncate the log file at start instead of appending
    pub log_overwrite: bool,
    pub target_filename_max_length: usize,
    pub source_filename_max_length: usize,
}

impl Config {
    /// Config with the required fields set and defaults elsewhere. No sieve.
    pub fn new(
        source_path: impl Into<PathBuf>,
        target_path: impl Into<PathBuf>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            target_path: target_path.into(),
            target_name_template: TargetNameTemplate::new(template),
            sieves: Vec::new(),
            verbosity: Verbosity::Normal,
            log_level: LogLevel::Normal,
            use_log_file: false,
            log_file: None,
            log_overwrite: false,
            target_filename_max_length: TARGET_FILENAME_MAX_LENGTH_DEFAULT,
            source_filename_max_length: SOURCE_FILENAME_MAX_LENGTH_DEFAULT,
        }
    }

    /// Log file to write to, if file logging is on.
    pub fn effective_log_file(&self) -> Option<&PathBuf> {
        if self.use_log_file {
            self.log_file.as_ref()
        } else {
            None
        }
    }
}
