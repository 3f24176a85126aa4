//! Selection engine.
//!
//! Walks the source tree, filters every regular file through the sieves,
//! hashes only the survivors and drops content already archived in the
//! catalog or already selected earlier in the same walk.
//!
//! Symlinked directories are not descended into. A symlink to a regular file
//! is a candidate like the file itself; a dangling one is an unreadable file.

use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

use crate::candidate::SourceCandidate;
use crate::errors::{KatalError, Result};
use crate::hash::{ContentHash, hash_file};
use crate::report::Reporter;
use crate::sieve::{Sieve, candidate_is_accepted};

/// Insertion-ordered set of selected files keyed by content hash.
#[derive(Debug, Default, Clone)]
pub struct Selection {
    entries: Vec<(ContentHash, SourceCandidate)>,
    keys: HashSet<ContentHash>,
    total_size: u64,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the hash is already present. Returns true on insert.
    pub fn insert(&mut self, hash: ContentHash, candidate: SourceCandidate) -> bool {
        if self.keys.contains(&hash) {
            return false;
        }
        self.total_size = self.total_size.saturating_add(candidate.size_bytes);
        self.keys.insert(hash.clone());
        self.entries.push((hash, candidate));
        true
    }

    pub fn contains(&self, hash: &ContentHash) -> bool {
        self.keys.contains(hash)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of the sizes of the selected files.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Recompute the size sum from the entries and compare with the running total.
    pub fn verify_total(&self) -> bool {
        let sum: u64 = self.entries.iter().map(|(_, c)| c.size_bytes).sum();
        sum == self.total_size
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ContentHash, &SourceCandidate)> {
        self.entries.iter().map(|(h, c)| (h, c))
    }

    pub fn get(&self, hash: &ContentHash) -> Option<&SourceCandidate> {
        self.entries.iter().find(|(h, _)| h == hash).map(|(_, c)| c)
    }
}

/// Result of one selection pass.
#[derive(Debug, Default, Clone)]
pub struct SelectionOutcome {
    pub selection: Selection,
    /// Files discarded by the sieves, as duplicates, or because they could not be read.
    pub rejected: usize,
}

/// Why a readable file did not make it into the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Discard {
    Sieves,
    Duplicate,
}

/// Run the selection over `source_root`.
///
/// Per-file I/O failures are counted as rejected and reported; only a
/// missing or unreadable root aborts the walk.
pub fn select(
    source_root: &Path,
    sieves: &[Sieve],
    catalog_hashes: &HashSet<ContentHash>,
    verbose: bool,
    reporter: &mut dyn Reporter,
) -> Result<SelectionOutcome> {
    let root_meta = std::fs::metadata(source_root).map_err(|e| KatalError::file_io(source_root, e))?;
    if !root_meta.is_dir() {
        return Err(KatalError::Config(format!(
            "source path '{}' is not a directory",
            source_root.display()
        )));
    }

    let mut outcome = SelectionOutcome::default();

    for entry in WalkDir::new(source_root)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                let where_ = e
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| source_root.display().to_string());
                reject_unreadable(&mut outcome, reporter, &where_, &e);
                continue;
            }
        };
        let file_type = entry.file_type();
        if file_type.is_symlink() {
            match std::fs::metadata(entry.path()) {
                Ok(meta) if meta.is_file() => {}
                Ok(_) => {
                    trace!(path = %entry.path().display(), "Symlink to a non-regular file; skipped");
                    continue;
                }
                Err(e) => {
                    let where_ = entry.path().display().to_string();
                    reject_unreadable(&mut outcome, reporter, &where_, &e);
                    continue;
                }
            }
        } else if !file_type.is_file() {
            trace!(path = %entry.path().display(), "Not a regular file; skipped");
            continue;
        }

        match consider(entry.path(), sieves, catalog_hashes, &mut outcome.selection) {
            Ok(None) => {
                if verbose {
                    reporter.report(&format!(
                        "    + selected {} ({} file(s) selected)",
                        entry.path().display(),
                        outcome.selection.len()
                    ));
                }
            }
            Ok(Some(reason)) => {
                outcome.rejected += 1;
                if verbose {
                    let why = match reason {
                        Discard::Sieves => "(sieves described in the config file)",
                        Discard::Duplicate => "(similar hashid)",
                    };
                    reporter.report(&format!(
                        "    - {why} discarded \"{}\"",
                        entry.path().display()
                    ));
                }
            }
            Err(e) => {
                let where_ = entry.path().display().to_string();
                reject_unreadable(&mut outcome, reporter, &where_, &e);
            }
        }
    }

    debug!(
        selected = outcome.selection.len(),
        rejected = outcome.rejected,
        bytes = outcome.selection.total_size(),
        "Selection finished"
    );
    Ok(outcome)
}

/// Count an unreadable entry as rejected. Reported whatever the verbosity.
fn reject_unreadable(
    outcome: &mut SelectionOutcome,
    reporter: &mut dyn Reporter,
    path: &str,
    error: &dyn std::fmt::Display,
) {
    outcome.rejected += 1;
    warn!(path = %path, error = %error, "Skipping unreadable file");
    reporter.report(&format!("    ! can't read \"{path}\" : {error}"));
}

/// Filter, hash and dedup a single file. `Ok(None)` means it was selected.
fn consider(
    path: &Path,
    sieves: &[Sieve],
    catalog_hashes: &HashSet<ContentHash>,
    selection: &mut Selection,
) -> Result<Option<Discard>> {
    let candidate = SourceCandidate::from_path(path)?;
    consider_candidate(candidate, sieves, catalog_hashes, selection)
}

/// Second half of [`consider`]: sieves, then hash, then dedup.
/// Hashing failures propagate so the caller reports them.
fn consider_candidate(
    candidate: SourceCandidate,
    sieves: &[Sieve],
    catalog_hashes: &HashSet<ContentHash>,
    selection: &mut Selection,
) -> Result<Option<Discard>> {
    if !candidate_is_accepted(&candidate, sieves) {
        return Ok(Some(Discard::Sieves));
    }

    let hash = hash_file(&candidate.absolute_path)?;

    if catalog_hashes.contains(&hash) || selection.contains(&hash) {
        return Ok(Some(Discard::Duplicate));
    }

    selection.insert(hash, candidate);
    Ok(None)
}
