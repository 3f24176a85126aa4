//! CLI definition and parsing.
//!
//! Notes:
//! - --debug is a shorthand for --log-level debug.
//! - --quiet only silences the console; the log file keeps its level.

use clap::{Parser, ValueHint};
use std::path::PathBuf;

use crate::config::types::{Config, LogLevel};

/// Select files from a source directory and archive the new content into a
/// target directory, renamed by a template and tracked in a catalog.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about = "File selection, dedup and archive tool")]
pub struct Args {
    /// Config file (overrides KATAL_CONFIG and the default location).
    #[arg(long, short = 'c', value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Override source/path from the config file.
    #[arg(long, value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub source_path: Option<PathBuf>,

    /// Override target/path from the config file.
    #[arg(long, value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub target_path: Option<PathBuf>,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// No console output except errors, and no question asked.
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Emit logs in structured JSON.
    #[arg(long)]
    pub json: bool,

    /// Show the content of the source directory and of the catalog.
    #[arg(long)]
    pub infos: bool,

    /// Select files and show what would be archived; ask before adding them.
    #[arg(long, conflicts_with = "add")]
    pub select: bool,

    /// Select files and add them to the target directory without asking.
    #[arg(long)]
    pub add: bool,

    /// Answer yes to the question asked by --select.
    #[arg(short = 'y', long, requires = "select")]
    pub yes: bool,

    /// Print the config file location that would be used, then exit.
    #[arg(long)]
    pub print_config: bool,
}

impl Args {
    /// Effective log level derived from flags.
    /// Precedence: --debug > --log-level value > None (use config value).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.as_deref().and_then(LogLevel::parse)
    }

    /// Apply CLI overrides to a loaded Config (in-place). No-ops for unset flags.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(p) = &self.source_path {
            cfg.source_path = p.clone();
        }
        if let Some(p) = &self.target_path {
            cfg.target_path = p.clone();
        }
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
    }

    /// True when some action touching the directories was requested.
    pub fn has_action(&self) -> bool {
        self.infos || self.select || self.add
    }
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_and_add_conflict() {
        assert!(Args::try_parse_from(["katal", "--select", "--add"]).is_err());
        assert!(Args::try_parse_from(["katal", "--select", "--infos"]).is_ok());
    }

    #[test]
    fn yes_needs_select() {
        assert!(Args::try_parse_from(["katal", "--yes"]).is_err());
        assert!(Args::try_parse_from(["katal", "--select", "-y"]).is_ok());
    }

    #[test]
    fn debug_beats_log_level() {
        let a = Args::try_parse_from(["katal", "--log-level", "quiet", "-d"]).unwrap();
        assert_eq!(a.effective_log_level(), Some(LogLevel::Debug));
        let a = Args::try_parse_from(["katal", "--log-level", "info"]).unwrap();
        assert_eq!(a.effective_log_level(), Some(LogLevel::Info));
        let a = Args::try_parse_from(["katal", "--log-level", "bogus"]).unwrap();
        assert_eq!(a.effective_log_level(), None);
    }

    #[test]
    fn overrides_replace_paths() {
        let a = Args::try_parse_from([
            "katal",
            "--source-path",
            "/new/src",
            "--target-path",
            "/new/dst",
        ])
        .unwrap();
        let mut cfg = Config::new("/s", "/t", "HASHID");
        a.apply_overrides(&mut cfg);
        assert_eq!(cfg.source_path, PathBuf::from("/new/src"));
        assert_eq!(cfg.target_path, PathBuf::from("/new/dst"));
        assert_eq!(cfg.log_level, LogLevel::Normal);
    }
}
