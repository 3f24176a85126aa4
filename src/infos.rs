//! Read-only summaries of the source and target directories.

use std::collections::BTreeSet;
use std::path::Path;
use tracing::warn;
use walkdir::WalkDir;

use crate::catalog::Catalog;
use crate::errors::{KatalError, Result};
use crate::fs_ops::format_bytes;
use crate::report::Reporter;

const ELLIPSIS: &str = "[...]";

/// Aggregate view of a directory tree.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SourceSummary {
    pub files: usize,
    pub total_size: u64,
    /// Distinct extensions with their leading dot; files without one add `""`.
    pub extensions: BTreeSet<String>,
}

/// Count the regular files below `root` (symlinks to files included, as the
/// selection sees them), their total size and extensions.
pub fn summarize_source(root: &Path) -> Result<SourceSummary> {
    let meta = std::fs::metadata(root).map_err(|e| KatalError::file_io(root, e))?;
    if !meta.is_dir() {
        return Err(KatalError::Config(format!(
            "source path '{}' is not a directory",
            root.display()
        )));
    }
    let mut summary = SourceSummary::default();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        let file_type = entry.file_type();
        if !file_type.is_file() && !file_type.is_symlink() {
            continue;
        }
        // follows symlinks
        let size = match std::fs::metadata(entry.path()) {
            Ok(m) if m.is_file() => m.len(),
            Ok(_) => continue,
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "Skipping file");
                continue;
            }
        };
        summary.files += 1;
        summary.total_size += size;
        let ext = entry
            .path()
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        summary.extensions.insert(ext);
    }
    Ok(summary)
}

/// Keep the end of `s`, prefixed by `[...]`, when it has more than `max`
/// characters. The result never exceeds `max` characters; widths too small
/// for the marker plus one character keep the bare tail.
pub fn truncate_left(s: &str, max: usize) -> String {
    let len = s.chars().count();
    if len <= max {
        return s.to_string();
    }
    let marker = ELLIPSIS.chars().count();
    if max <= marker {
        return s.chars().skip(len - max).collect();
    }
    let tail: String = s.chars().skip(len - (max - marker)).collect();
    format!("{ELLIPSIS}{tail}")
}

/// Report the source summary.
pub fn report_source(root: &Path, reporter: &mut dyn Reporter) -> Result<SourceSummary> {
    let summary = summarize_source(root)?;
    reporter.report(&format!(
        "  = informations about the \"{}\" (source) directory =",
        root.display()
    ));
    reporter.report(&format!("    o files number : {}", summary.files));
    reporter.report(&format!(
        "    o total size : {}",
        format_bytes(summary.total_size)
    ));
    let exts: Vec<&str> = summary
        .extensions
        .iter()
        .map(|e| if e.is_empty() { "(none)" } else { e.as_str() })
        .collect();
    reporter.report(&format!(
        "    o list of all extensions : {}",
        exts.join(", ")
    ));
    Ok(summary)
}

/// Report the catalog rows of `target_dir`, or the lack of a catalog.
/// Never creates a catalog.
pub fn report_target(
    target_dir: &Path,
    target_max: usize,
    source_max: usize,
    reporter: &mut dyn Reporter,
) -> Result<usize> {
    reporter.report(&format!(
        "  = informations about the \"{}\" (target) directory =",
        target_dir.display()
    ));
    if !Catalog::path_for(target_dir).exists() {
        reporter.report("    o no database in the target directory o");
        return Ok(0);
    }
    let catalog = Catalog::open(target_dir)?;
    let rows = catalog.entries()?;
    reporter.report(&format!(
        "      {:<43} : {:<target_max$} : (source) source name",
        "hashid", "(target) file name"
    ));
    reporter.report(&format!("      {}", "-".repeat(target_max + source_max + 50)));
    for row in &rows {
        reporter.report(&format!(
            "      {} : {:<target_max$} : {}",
            row.hash,
            truncate_left(&row.stored_target_name, target_max),
            truncate_left(&row.original_source_path, source_max),
        ));
    }
    if rows.is_empty() {
        reporter.report("    ! (empty database)");
    }
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use crate::hash::ContentHash;
    use crate::report::MemoryReporter;
    use std::fs;

    #[test]
    fn truncation_keeps_the_end() {
        assert_eq!(truncate_left("short", 20), "short");
        assert_eq!(truncate_left("abcdefghijkl", 10), "[...]hijkl");
        assert_eq!(truncate_left("abcdefghijkl", 10).chars().count(), 10);
        assert_eq!(truncate_left("éééééééééé", 7), "[...]éé");
    }

    #[test]
    fn truncation_never_exceeds_the_width() {
        let s = "abcdefghijkl";
        for max in 0..=s.len() {
            let out = truncate_left(s, max);
            assert!(out.chars().count() <= max, "max {max}: {out}");
            assert!(s.ends_with(out.trim_start_matches(ELLIPSIS)));
        }
        assert_eq!(truncate_left("abcdef", 3), "def");
        assert_eq!(truncate_left("abcdef", 5), "bcdef");
        assert_eq!(truncate_left("abcdef", 0), "");
        assert_eq!(truncate_left("abcdefg", 6), "[...]g");
    }

    #[cfg(unix)]
    #[test]
    fn summary_counts_symlinked_files() {
        let td = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("real.png"), vec![0u8; 7]).unwrap();
        std::os::unix::fs::symlink(outside.path().join("real.png"), td.path().join("link.png"))
            .unwrap();
        std::os::unix::fs::symlink(td.path().join("nowhere"), td.path().join("broken")).unwrap();
        let s = summarize_source(td.path()).unwrap();
        assert_eq!(s.files, 1);
        assert_eq!(s.total_size, 7);
    }

    #[test]
    fn source_summary_counts_everything() {
        let td = tempfile::tempdir().unwrap();
        fs::create_dir(td.path().join("sub")).unwrap();
        fs::write(td.path().join("a.jpg"), vec![0u8; 10]).unwrap();
        fs::write(td.path().join("sub/b.JPG"), vec![0u8; 5]).unwrap();
        fs::write(td.path().join("README"), b"r").unwrap();
        let s = summarize_source(td.path()).unwrap();
        assert_eq!(s.files, 3);
        assert_eq!(s.total_size, 16);
        let exts: Vec<_> = s.extensions.iter().cloned().collect();
        assert_eq!(exts, ["", ".JPG", ".jpg"]);

        let mut rep = MemoryReporter::new();
        report_source(td.path(), &mut rep).unwrap();
        assert!(rep.contains("files number : 3"));
        assert!(rep.contains("(none), .JPG, .jpg"));
    }

    #[test]
    fn target_without_catalog() {
        let td = tempfile::tempdir().unwrap();
        let mut rep = MemoryReporter::new();
        assert_eq!(report_target(td.path(), 20, 40, &mut rep).unwrap(), 0);
        assert!(rep.contains("no database in the target directory"));
        assert!(!Catalog::path_for(td.path()).exists());
    }

    #[test]
    fn target_with_empty_and_filled_catalog() {
        let td = tempfile::tempdir().unwrap();
        let mut cat = Catalog::open(td.path()).unwrap();
        let mut rep = MemoryReporter::new();
        report_target(td.path(), 20, 40, &mut rep).unwrap();
        assert!(rep.contains("(empty database)"));

        cat.append(&[CatalogEntry {
            hash: ContentHash::from_encoded("hash1"),
            stored_target_name: "a-very-long-target-name-that-overflows.jpg".into(),
            original_source_path: "/src/a.jpg".into(),
        }])
        .unwrap();
        let mut rep = MemoryReporter::new();
        assert_eq!(report_target(td.path(), 20, 40, &mut rep).unwrap(), 1);
        assert!(rep.contains("hash1 : [...]t-overflows.jpg"));
        assert!(rep.contains("/src/a.jpg"));
        assert!(!rep.contains("(empty database)"));
    }
}
