//! Publishing a finished temp file under its final name, never replacing an
//! existing file.
//!
//! On Unix the temp file is hard-linked to the destination (`link(2)` fails
//! when the name is taken) and then unlinked. Filesystems without hard links,
//! and Windows, fall back to an existence check followed by a rename.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;
use tracing::debug;

pub(super) fn rename_no_clobber(src: &Path, dst: &Path) -> Result<()> {
    #[cfg(unix)]
    match fs::hard_link(src, dst) {
        Ok(()) => {
            if let Err(e) = fs::remove_file(src) {
                tracing::warn!(temp = %src.display(), error = %e, "Temporary file left behind");
            }
            sync_parent(dst);
            return Ok(());
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            bail!("destination already exists: {}", dst.display());
        }
        Err(e) => {
            debug!(error = %e, "Hard link unavailable; falling back to rename");
        }
    }

    if dst.symlink_metadata().is_ok() {
        bail!("destination already exists: {}", dst.display());
    }
    fs::rename(src, dst)
        .with_context(|| format!("rename '{}' -> '{}'", src.display(), dst.display()))?;
    sync_parent(dst);
    Ok(())
}

fn sync_parent(dst: &Path) {
    if let Some(parent) = dst.parent()
        && let Err(e) = super::util::fsync_dir(parent)
    {
        debug!(dir = %parent.display(), error = %e, "Directory fsync failed");
    }
}
