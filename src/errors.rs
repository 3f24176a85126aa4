//! Typed error definitions for katal.
//! Separates configuration errors, precondition failures and per-file I/O
//! failures so callers can decide what aborts a run and what is absorbed.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, KatalError>;

#[derive(Debug, Error)]
pub enum KatalError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required configuration field: {0}")]
    MissingField(&'static str),

    #[error("Invalid {field} in sieve #{index}: '{value}' ({reason})")]
    InvalidSieve {
        index: usize,
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Insufficient disk space for destination {dest}: need {required} bytes, have {available} bytes")]
    InsufficientSpace {
        required: u64,
        available: u64,
        dest: PathBuf,
    },

    #[error("I/O error on {path}: {source}")]
    FileIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Target name '{name}' would escape the target directory")]
    UnsafeTargetName { name: String },

    #[error("Target name '{name}' is produced twice or already exists in the target directory")]
    TargetNameCollision { name: String },

    #[error("Copy of '{source_path}' to '{target}' failed after {copied}/{total} file(s) were copied; catalog left unchanged: {reason}")]
    CopyFailed {
        source_path: PathBuf,
        target: PathBuf,
        copied: usize,
        total: usize,
        reason: String,
    },

    #[error("Catalog error on {path}: {source}")]
    Catalog {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
}

impl KatalError {
    /// Stable numeric code for structured logs and exit diagnostics.
    pub fn code(&self) -> u8 {
        match self {
            KatalError::Config(_) => 10,
            KatalError::MissingField(_) => 11,
            KatalError::InvalidSieve { .. } => 12,
            KatalError::InsufficientSpace { .. } => 20,
            KatalError::FileIo { .. } => 30,
            KatalError::UnsafeTargetName { .. } => 40,
            KatalError::CopyFailed { .. } => 41,
            KatalError::TargetNameCollision { .. } => 42,
            KatalError::Catalog { .. } => 50,
        }
    }

    /// Short machine-friendly name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            KatalError::Config(_) => "config",
            KatalError::MissingField(_) => "missing_field",
            KatalError::InvalidSieve { .. } => "invalid_sieve",
            KatalError::InsufficientSpace { .. } => "insufficient_space",
            KatalError::FileIo { .. } => "file_io",
            KatalError::UnsafeTargetName { .. } => "unsafe_target_name",
            KatalError::CopyFailed { .. } => "copy_failed",
            KatalError::TargetNameCollision { .. } => "target_name_collision",
            KatalError::Catalog { .. } => "catalog",
        }
    }

    /// True for errors raised by configuration loading or validation.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            KatalError::Config(_) | KatalError::MissingField(_) | KatalError::InvalidSieve { .. }
        )
    }

    pub(crate) fn file_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        KatalError::FileIo {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn catalog(path: impl Into<PathBuf>, source: rusqlite::Error) -> Self {
        KatalError::Catalog {
            path: path.into(),
            source,
        }
    }
}
