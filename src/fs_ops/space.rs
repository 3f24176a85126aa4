//! Free-space gate for a commit and human-readable byte counts.

use std::path::Path;

use crate::errors::{KatalError, Result};

/// Extra room kept for the catalog file on top of the payload.
pub const CATALOG_MARGIN: u64 = 100_000;

/// Payload plus catalog margin. The free space must be strictly above this.
pub fn required_space(total_size: u64) -> u64 {
    total_size.saturating_add(CATALOG_MARGIN)
}

/// True when `available` bytes exceed the payload plus margin.
pub fn has_room_for(total_size: u64, available: u64) -> bool {
    available > required_space(total_size)
}

/// Fail with `InsufficientSpace` unless `available` exceeds the payload plus margin.
pub fn ensure_space_for_commit(target_dir: &Path, total_size: u64, available: u64) -> Result<()> {
    let required = required_space(total_size);
    if !has_room_for(total_size, available) {
        return Err(KatalError::InsufficientSpace {
            required,
            available,
            dest: target_dir.to_path_buf(),
        });
    }
    Ok(())
}

pub fn format_bytes(n: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;
    const TB: f64 = GB * 1024.0;
    let f = n as f64;
    if f >= TB {
        format!("{:.1} TiB", f / TB)
    } else if f >= GB {
        format!("{:.1} GiB", f / GB)
    } else if f >= MB {
        format!("{:.1} MiB", f / MB)
    } else if f >= KB {
        format!("{:.1} KiB", f / KB)
    } else {
        format!("{} B", n)
    }
}
