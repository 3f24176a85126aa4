//! Source candidates: immutable snapshots of a file's name, size and mtime.

use chrono::{DateTime, Local, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{KatalError, Result};

/// A regular file found under the source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCandidate {
    /// Full path of the file as found by the walk.
    pub absolute_path: PathBuf,
    /// Directory holding the file.
    pub containing_dir: PathBuf,
    /// File name without its last extension.
    pub base_name_without_extension: String,
    /// Last extension, without the leading dot (empty when absent).
    pub extension: String,
    pub size_bytes: u64,
    /// Modification time in local time.
    pub modified: NaiveDateTime,
}

impl SourceCandidate {
    /// Build a candidate from filesystem metadata.
    pub fn from_path(path: &Path) -> Result<Self> {
        let meta = fs::metadata(path).map_err(|e| KatalError::file_io(path, e))?;
        let modified = meta
            .modified()
            .map_err(|e| KatalError::file_io(path, e))?;
        let modified: DateTime<Local> = modified.into();
        Ok(Self::new(path, meta.len(), modified.naive_local()))
    }

    /// Build a candidate from already known values.
    pub fn new(path: &Path, size_bytes: u64, modified: NaiveDateTime) -> Self {
        let file_name = file_name_lossy(path);
        let (base, ext) = split_extension(&file_name);
        Self {
            absolute_path: path.to_path_buf(),
            containing_dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            base_name_without_extension: base.to_string(),
            extension: ext.to_string(),
            size_bytes,
            modified,
        }
    }

    /// Base file name including its extension; what name sieves match against.
    pub fn file_name(&self) -> String {
        if self.extension.is_empty() {
            self.base_name_without_extension.clone()
        } else {
            format!("{}.{}", self.base_name_without_extension, self.extension)
        }
    }
}

fn file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Split on the last dot; a leading dot (".env") belongs to the name.
fn split_extension(name: &str) -> (&str, &str) {
    let trimmed = name.trim_start_matches('.');
    let leading = name.len() - trimmed.len();
    match trimmed.rfind('.') {
        Some(pos) => {
            let split = leading + pos;
            (&name[..split], &name[split + 1..])
        }
        None => (name, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(8, 7, 6)
            .unwrap()
    }

    #[test]
    fn splits_last_extension() {
        let c = SourceCandidate::new(Path::new("/a/b/archive.tar.gz"), 10, ts());
        assert_eq!(c.base_name_without_extension, "archive.tar");
        assert_eq!(c.extension, "gz");
        assert_eq!(c.containing_dir, PathBuf::from("/a/b"));
        assert_eq!(c.file_name(), "archive.tar.gz");
    }

    #[test]
    fn dotfile_has_no_extension() {
        let c = SourceCandidate::new(Path::new("/a/.env"), 1, ts());
        assert_eq!(c.base_name_without_extension, ".env");
        assert_eq!(c.extension, "");
        assert_eq!(c.file_name(), ".env");
    }

    #[test]
    fn no_extension() {
        let c = SourceCandidate::new(Path::new("README"), 1, ts());
        assert_eq!(c.base_name_without_extension, "README");
        assert_eq!(c.extension, "");
    }

    #[test]
    fn from_path_reads_size() {
        let td = tempfile::tempdir().unwrap();
        let p = td.path().join("pic.jpg");
        std::fs::write(&p, b"12345").unwrap();
        let c = SourceCandidate::from_path(&p).unwrap();
        assert_eq!(c.size_bytes, 5);
        assert_eq!(c.extension, "jpg");
    }

    #[test]
    fn from_path_missing_file_is_file_io() {
        let td = tempfile::tempdir().unwrap();
        let err = SourceCandidate::from_path(&td.path().join("gone")).unwrap_err();
        assert!(matches!(err, KatalError::FileIo { .. }));
    }
}
