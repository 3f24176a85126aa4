//! Core library for `katal`.
//!
//! Selects files from a source tree through sieves, drops content already
//! archived (by SHA-256), copies the rest into a target directory under
//! template-generated names and records every copy in a SQLite catalog.
//!
//! Modules:
//! - sieve / candidate / hash: per-file filtering and identity
//! - select: Selection Engine
//! - naming: target name templates
//! - commit: free-space gate, copies, catalog append
//! - catalog: the `katal.db` ledger
//! - run: explicit per-run state tying the engines together
//! - infos: read-only summaries
//! - config / cli / output / report: the surface around the engines
//! - platform / fs_ops: OS helpers and safe copies

pub mod candidate;
pub mod catalog;
pub mod cli;
pub mod commit;
pub mod config;
pub mod errors;
pub mod fs_ops;
pub mod hash;
pub mod infos;
pub mod naming;
pub mod output;
pub mod platform;
pub mod report;
pub mod run;
pub mod select;
pub mod sieve;

pub use candidate::SourceCandidate;
pub use catalog::{Catalog, CatalogEntry, DATABASE_NAME};
pub use commit::{CommitReport, commit, commit_with_free_space};
pub use config::{
    Config, ConfigLocation, ConfigOrigin, LogLevel, Verbosity, default_config_path,
    default_log_path, path_has_symlink_ancestor, resolve_config_path,
};
pub use errors::{KatalError, Result};
pub use hash::{ContentHash, hash_file};
pub use naming::{TargetNameTemplate, sanitize, synthesize_name};
pub use report::{MemoryReporter, NullReporter, Reporter, TracingReporter};
pub use run::RunContext;
pub use select::{Selection, SelectionOutcome, select};
pub use sieve::{Sieve, SizeOp, SizePredicate, candidate_is_accepted};
