//! Commit engine: copies a selection into the target directory and extends
//! the catalog.
//!
//! Order of a commit:
//! 1. free-space gate (payload + catalog margin),
//! 2. every target name is planned and checked before the first copy,
//! 3. files are copied one by one in selection order,
//! 4. the catalog is extended with the whole batch in one transaction.
//!
//! A failing copy stops the batch and leaves the catalog untouched. Files
//! copied before the failure stay on disk and are not tracked.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, error, info};

use crate::catalog::{Catalog, CatalogEntry, DATABASE_NAME};
use crate::errors::{KatalError, Result};
use crate::fs_ops::{ensure_space_for_commit, safe_copy_and_rename};
use crate::naming::TargetNameTemplate;
use crate::platform;
use crate::report::Reporter;
use crate::select::Selection;

/// What a successful commit did.
#[derive(Debug, Default, Clone)]
pub struct CommitReport {
    /// `(source path, target name)` in copy order.
    pub copied: Vec<(PathBuf, String)>,
    pub bytes: u64,
}

impl CommitReport {
    pub fn len(&self) -> usize {
        self.copied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.copied.is_empty()
    }
}

struct PlannedCopy<'a> {
    source: &'a Path,
    target_name: String,
    entry: CatalogEntry,
}

/// Commit `selection` into `target_dir`, querying the free space of the target volume.
pub fn commit(
    selection: &Selection,
    target_dir: &Path,
    catalog: &mut Catalog,
    template: &TargetNameTemplate,
    reporter: &mut dyn Reporter,
) -> Result<CommitReport> {
    let available =
        platform::free_space_bytes(target_dir).map_err(|e| KatalError::file_io(target_dir, e))?;
    commit_with_free_space(selection, target_dir, catalog, template, available, reporter)
}

/// Commit with a caller-supplied free-space figure.
pub fn commit_with_free_space(
    selection: &Selection,
    target_dir: &Path,
    catalog: &mut Catalog,
    template: &TargetNameTemplate,
    available: u64,
    reporter: &mut dyn Reporter,
) -> Result<CommitReport> {
    ensure_space_for_commit(target_dir, selection.total_size(), available)?;

    let base_index = catalog.len()?;
    let plan = plan_copies(selection, target_dir, template, base_index)?;
    let total = plan.len();
    debug!(files = total, bytes = selection.total_size(), "Commit planned");

    let mut report = CommitReport::default();
    let mut staged = Vec::with_capacity(total);
    for (i, planned) in plan.into_iter().enumerate() {
        let target = target_dir.join(&planned.target_name);
        reporter.report(&format!(
            "    ... ({}/{}) copying \"{}\" to \"{}\" .",
            i + 1,
            total,
            planned.source.display(),
            target.display()
        ));
        match safe_copy_and_rename(planned.source, &target) {
            Ok(bytes) => {
                report.bytes += bytes;
                report
                    .copied
                    .push((planned.source.to_path_buf(), planned.target_name));
                staged.push(planned.entry);
            }
            Err(e) => {
                error!(
                    source = %planned.source.display(),
                    target = %target.display(),
                    copied = i,
                    total,
                    error = %e,
                    "Copy failed; catalog left unchanged"
                );
                return Err(KatalError::CopyFailed {
                    source_path: planned.source.to_path_buf(),
                    target,
                    copied: i,
                    total,
                    reason: format!("{e:#}"),
                });
            }
        }
    }

    catalog.append(&staged)?;
    info!(
        files = report.len(),
        bytes = report.bytes,
        target = %target_dir.display(),
        "Commit finished"
    );
    Ok(report)
}

fn plan_copies<'a>(
    selection: &'a Selection,
    target_dir: &Path,
    template: &TargetNameTemplate,
    base_index: usize,
) -> Result<Vec<PlannedCopy<'a>>> {
    let mut seen = HashSet::new();
    let mut plan = Vec::with_capacity(selection.len());
    for (i, (hash, candidate)) in selection.iter().enumerate() {
        let target_name = template.synthesize(candidate, hash, base_index + i);
        check_target_name(&target_name)?;
        if target_name == DATABASE_NAME
            || !seen.insert(target_name.clone())
            || target_dir.join(&target_name).symlink_metadata().is_ok()
        {
            return Err(KatalError::TargetNameCollision { name: target_name });
        }
        plan.push(PlannedCopy {
            source: &candidate.absolute_path,
            target_name: target_name.clone(),
            entry: CatalogEntry {
                hash: hash.clone(),
                stored_target_name: target_name,
                original_source_path: candidate.absolute_path.display().to_string(),
            },
        });
    }
    Ok(plan)
}

/// A target name must stay below the target directory.
fn check_target_name(name: &str) -> Result<()> {
    let path = Path::new(name);
    let mut normal = 0;
    for component in path.components() {
        match component {
            Component::Normal(_) => normal += 1,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(KatalError::UnsafeTargetName {
                    name: name.to_string(),
                });
            }
        }
    }
    if normal == 0 {
        return Err(KatalError::UnsafeTargetName {
            name: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::SourceCandidate;
    use crate::fs_ops::required_space;
    use crate::hash::hash_file;
    use crate::report::MemoryReporter;
    use std::fs;

    fn selection_of(paths: &[&Path]) -> Selection {
        let mut sel = Selection::new();
        for p in paths {
            sel.insert(hash_file(p).unwrap(), SourceCandidate::from_path(p).unwrap());
        }
        sel
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn unsafe_names_rejected() {
        assert!(check_target_name("a/b.jpg").is_ok());
        assert!(check_target_name("./a.jpg").is_ok());
        assert!(check_target_name("../a.jpg").is_err());
        assert!(check_target_name("x/../../a").is_err());
        assert!(check_target_name("/etc/passwd").is_err());
        assert!(check_target_name("").is_err());
        assert!(check_target_name(".").is_err());
    }

    #[test]
    fn copies_and_extends_catalog() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let a = src.path().join("a.txt");
        let b = src.path().join("b.bin");
        fs::write(&a, b"alpha").unwrap();
        fs::write(&b, b"bravo!").unwrap();
        let sel = selection_of(&[&a, &b]);
        let mut cat = Catalog::open_in_memory().unwrap();
        let mut rep = MemoryReporter::new();
        let template = TargetNameTemplate::new("DATABASE_INDEX.SOURCE_EXTENSION2");

        let report =
            commit_with_free_space(&sel, dst.path(), &mut cat, &template, u64::MAX, &mut rep)
                .unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(report.bytes, 11);
        assert_eq!(files_in(dst.path()), ["0.txt", "1.bin"]);
        assert_eq!(fs::read(dst.path().join("1.bin")).unwrap(), b"bravo!");
        assert_eq!(cat.len().unwrap(), 2);
        assert!(rep.contains("(1/2) copying"));
        assert!(rep.contains("(2/2) copying"));
    }

    #[test]
    fn insufficient_space_writes_nothing() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let a = src.path().join("a");
        fs::write(&a, vec![7u8; 2000]).unwrap();
        let sel = selection_of(&[&a]);
        let mut cat = Catalog::open_in_memory().unwrap();
        let required = required_space(sel.total_size());

        let err = commit_with_free_space(
            &sel,
            dst.path(),
            &mut cat,
            &TargetNameTemplate::new("HASHID"),
            required - 1,
            &mut MemoryReporter::new(),
        )
        .unwrap_err();

        assert!(matches!(err, KatalError::InsufficientSpace { .. }));
        assert!(files_in(dst.path()).is_empty());
        assert!(cat.is_empty().unwrap());
    }

    #[test]
    fn copy_failure_leaves_catalog_unchanged() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let a = src.path().join("a");
        let b = src.path().join("b");
        fs::write(&a, b"first").unwrap();
        fs::write(&b, b"second").unwrap();
        let sel = selection_of(&[&a, &b]);
        // vanishes between selection and commit
        fs::remove_file(&b).unwrap();
        let mut cat = Catalog::open_in_memory().unwrap();

        let err = commit_with_free_space(
            &sel,
            dst.path(),
            &mut cat,
            &TargetNameTemplate::new("HASHID"),
            u64::MAX,
            &mut MemoryReporter::new(),
        )
        .unwrap_err();

        match err {
            KatalError::CopyFailed { copied, total, source_path, .. } => {
                assert_eq!(copied, 1);
                assert_eq!(total, 2);
                assert_eq!(source_path, b);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(cat.is_empty().unwrap());
        // the first copy is left behind, untracked
        assert_eq!(files_in(dst.path()).len(), 1);
    }

    #[test]
    fn escaping_template_fails_before_any_copy() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let a = src.path().join("a.txt");
        fs::write(&a, b"x").unwrap();
        let sel = selection_of(&[&a]);
        let mut cat = Catalog::open_in_memory().unwrap();

        let err = commit_with_free_space(
            &sel,
            dst.path(),
            &mut cat,
            &TargetNameTemplate::new("SOURCE_PATH/SOURCENAME_WITHOUT_EXTENSION"),
            u64::MAX,
            &mut MemoryReporter::new(),
        )
        .unwrap_err();
        assert!(matches!(err, KatalError::UnsafeTargetName { .. }));
        assert!(files_in(dst.path()).is_empty());
    }

    #[test]
    fn colliding_names_fail_before_any_copy() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let a = src.path().join("a.txt");
        let b = src.path().join("b.txt");
        fs::write(&a, b"one").unwrap();
        fs::write(&b, b"two").unwrap();
        let sel = selection_of(&[&a, &b]);
        let mut cat = Catalog::open_in_memory().unwrap();

        let err = commit_with_free_space(
            &sel,
            dst.path(),
            &mut cat,
            &TargetNameTemplate::new("same.SOURCE_EXTENSION"),
            u64::MAX,
            &mut MemoryReporter::new(),
        )
        .unwrap_err();
        assert!(matches!(err, KatalError::TargetNameCollision { .. }));
        assert!(files_in(dst.path()).is_empty());

        fs::write(dst.path().join("a.txt"), b"already here").unwrap();
        let single = selection_of(&[&a]);
        let err = commit_with_free_space(
            &single,
            dst.path(),
            &mut cat,
            &TargetNameTemplate::new("SOURCENAME_WITHOUT_EXTENSION.SOURCE_EXTENSION"),
            u64::MAX,
            &mut MemoryReporter::new(),
        )
        .unwrap_err();
        assert!(matches!(err, KatalError::TargetNameCollision { .. }));
        assert_eq!(fs::read(dst.path().join("a.txt")).unwrap(), b"already here");
    }

    #[test]
    fn names_with_separators_create_subdirectories() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        let a = src.path().join("a.txt");
        fs::write(&a, b"nested").unwrap();
        let sel = selection_of(&[&a]);
        let mut cat = Catalog::open_in_memory().unwrap();
        commit_with_free_space(
            &sel,
            dst.path(),
            &mut cat,
            &TargetNameTemplate::new("SOURCE_EXTENSION/HASHID"),
            u64::MAX,
            &mut MemoryReporter::new(),
        )
        .unwrap();
        let sub = dst.path().join("txt");
        assert!(sub.is_dir());
        assert_eq!(files_in(&sub).len(), 1);
        assert_eq!(cat.entries().unwrap()[0].stored_target_name.split('/').next(), Some("txt"));
    }

    #[test]
    fn empty_selection_is_a_no_op() {
        let dst = tempfile::tempdir().unwrap();
        let mut cat = Catalog::open_in_memory().unwrap();
        let report = commit_with_free_space(
            &Selection::new(),
            dst.path(),
            &mut cat,
            &TargetNameTemplate::new("HASHID"),
            u64::MAX,
            &mut MemoryReporter::new(),
        )
        .unwrap();
        assert!(report.is_empty());
        assert!(cat.is_empty().unwrap());
    }
}
