//! Adapters that turn an `io::Error` into a message naming the failed
//! operation, the path, and a hint for the most common OS errors.
//!
//!   fs::create_dir_all(dir).map_err(io_error_with_help("create dir", dir))?;

use anyhow::anyhow;
use std::io;
use std::path::Path;

fn hint_for(e: &io::Error) -> Option<&'static str> {
    #[cfg(unix)]
    if let Some(code) = e.raw_os_error() {
        let hint = match code {
            libc::EACCES | libc::EPERM => Some("permission denied; check ownership and write permissions"),
            libc::ENOENT => Some("path not found; verify it exists"),
            libc::EEXIST => Some("already exists; a previous run may have left this name"),
            libc::ENOSPC => Some("no space left on the target device"),
            libc::EROFS => Some("read-only filesystem; the target must be writable"),
            libc::ENAMETOOLONG => Some("name too long; shorten name_of_target_files"),
            libc::EMFILE | libc::ENFILE => Some("too many open files"),
            _ => None,
        };
        if hint.is_some() {
            return hint;
        }
    }
    #[cfg(windows)]
    if let Some(code) = e.raw_os_error() {
        // Win32 error codes
        let hint = match code {
            5 => Some("access denied; check permissions"),
            2 | 3 => Some("path not found; verify it exists"),
            80 => Some("already exists; a previous run may have left this name"),
            112 => Some("no space left on the target device"),
            206 => Some("name too long; shorten name_of_target_files"),
            32 => Some("sharing violation; the file is in use"),
            _ => None,
        };
        if hint.is_some() {
            return hint;
        }
    }
    match e.kind() {
        io::ErrorKind::PermissionDenied => Some("permission denied; check ownership and write permissions"),
        io::ErrorKind::NotFound => Some("path not found; verify it exists"),
        io::ErrorKind::AlreadyExists => Some("already exists; a previous run may have left this name"),
        _ => None,
    }
}

fn build_message(op: &str, path: &Path, e: &io::Error) -> String {
    let mut msg = format!("{} '{}': {}", op, path.display(), e);
    if let Some(hint) = hint_for(e) {
        msg.push_str(" (");
        msg.push_str(hint);
        msg.push(')');
    }
    if let Some(code) = e.raw_os_error() {
        msg.push_str(&format!(" [os code: {code}]"));
    }
    msg
}

/// For `anyhow::Result` code paths.
pub fn io_error_with_help<'a>(
    op: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> anyhow::Error + 'a {
    move |e: io::Error| anyhow!(build_message(op, path, &e))
}

/// For `io::Result` code paths; the original `ErrorKind` is kept.
pub fn io_error_with_help_io<'a>(
    op: &'a str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> io::Error + 'a {
    move |e: io::Error| io::Error::new(e.kind(), build_message(op, path, &e))
}
