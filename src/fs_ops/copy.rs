//! Safe copy-and-rename:
//! - copies to a temp file in the destination directory (fsynced),
//! - publishes temp -> dest without replacing an existing file,
//! so the destination name never holds a half-written file.

use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::Path;

use super::atomic::rename_no_clobber;
use super::helpers::io_error_with_help;
use super::{io_copy, util};

/// Copy `src` to `dest`, creating the destination directory when needed.
/// Returns the number of bytes copied.
pub fn safe_copy_and_rename(src: &Path, dest: &Path) -> Result<u64> {
    let dest_dir = dest
        .parent()
        .ok_or_else(|| anyhow!("destination has no parent: {}", dest.display()))?;

    fs::create_dir_all(dest_dir)
        .map_err(io_error_with_help("create destination directory", dest_dir))?;

    let tmp_path = util::unique_temp_path(dest_dir);

    let bytes = match io_copy::copy_streaming(src, &tmp_path) {
        Ok(n) => n,
        Err(e) => {
            let _ = fs::remove_file(&tmp_path);
            return Err(io_error_with_help("copy to temporary file", &tmp_path)(e));
        }
    };

    if let Err(e) = rename_no_clobber(&tmp_path, dest) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e).with_context(|| {
            format!(
                "rename temporary file '{}' -> '{}'",
                tmp_path.display(),
                dest.display()
            )
        });
    }

    Ok(bytes)
}
