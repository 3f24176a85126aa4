//! Config validation: directory existence, readability/writability and
//! disjoint source/target paths. Runs before anything touches the target.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::types::Config;
use crate::errors::{KatalError, Result};

impl Config {
    /// Check both directories and replace them with their canonical forms.
    /// The target is created when missing.
    pub fn validate_and_normalize(&mut self) -> Result<()> {
        ensure_dir_exists_and_is_dir(&self.source_path, "source/path")?;
        ensure_readable(&self.source_path, "source/path")?;

        // disjointness is checked before the target is created
        let source = canonical(&self.source_path)?;
        let planned_target = canonical_lenient(&self.target_path)?;
        ensure_disjoint(&source, &planned_target)?;

        ensure_dir_is_or_create(&self.target_path, "target/path")?;
        ensure_writable(&self.target_path, "target/path")?;
        let target = canonical(&self.target_path)?;
        ensure_disjoint(&source, &target)?;

        self.source_path = source;
        self.target_path = target;
        info!(
            source = %self.source_path.display(),
            target = %self.target_path.display(),
            sieves = self.sieves.len(),
            "Config validated"
        );
        Ok(())
    }
}

fn canonical(path: &Path) -> Result<PathBuf> {
    dunce::canonicalize(path).map_err(|e| KatalError::file_io(path, e))
}

/// Canonical form of a path that may not exist yet: the deepest existing
/// ancestor is canonicalized and the missing tail appended.
fn canonical_lenient(path: &Path) -> Result<PathBuf> {
    let mut existing = path;
    let mut tail = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                existing = if parent.as_os_str().is_empty() {
                    Path::new(".")
                } else {
                    parent
                };
            }
            _ => return Ok(path.to_path_buf()),
        }
    }
    let mut out = canonical(existing)?;
    for part in tail.iter().rev() {
        out.push(part);
    }
    Ok(out)
}

fn ensure_disjoint(source: &Path, target: &Path) -> Result<()> {
    if source == target {
        return Err(KatalError::Config(format!(
            "source and target resolve to the same path: '{}'",
            source.display()
        )));
    }
    if source.starts_with(target) {
        return Err(KatalError::Config(format!(
            "source '{}' must not be inside target '{}'",
            source.display(),
            target.display()
        )));
    }
    if target.starts_with(source) {
        return Err(KatalError::Config(format!(
            "target '{}' must not be inside source '{}'",
            target.display(),
            source.display()
        )));
    }
    Ok(())
}

fn ensure_dir_exists_and_is_dir(path: &Path, name: &str) -> Result<()> {
    if !path.exists() {
        return Err(KatalError::Config(format!(
            "{name} does not exist: {}",
            path.display()
        )));
    }
    if !path.is_dir() {
        return Err(KatalError::Config(format!(
            "{name} is not a directory: {}",
            path.display()
        )));
    }
    Ok(())
}

fn ensure_readable(path: &Path, name: &str) -> Result<()> {
    fs::read_dir(path).map_err(|e| {
        KatalError::Config(format!(
            "cannot read {name} directory '{}': {e}",
            path.display()
        ))
    })?;
    debug!("{name} readable: {}", path.display());
    Ok(())
}

fn ensure_dir_is_or_create(path: &Path, name: &str) -> Result<()> {
    if path.exists() {
        if !path.is_dir() {
            return Err(KatalError::Config(format!(
                "{name} exists but isn't a directory: {}",
                path.display()
            )));
        }
    } else {
        fs::create_dir_all(path).map_err(|e| KatalError::file_io(path, e))?;
        info!("Created {name} directory: {}", path.display());
    }
    Ok(())
}

/// Non-destructive probe: create and remove a hidden file.
fn ensure_writable(path: &Path, name: &str) -> Result<()> {
    let probe = path.join(format!(".katal_probe_{}.tmp", std::process::id()));
    fs::OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(&probe)
        .map_err(|e| {
            KatalError::Config(format!(
                "cannot write to {name} '{}': {e}",
                path.display()
            ))
        })?;
    let _ = fs::remove_file(&probe);
    debug!("{name} writable: {}", path.display());
    Ok(())
}
