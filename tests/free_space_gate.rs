use std::fs;
use tempfile::tempdir;

use katal::fs_ops::required_space;
use katal::{
    Catalog, KatalError, NullReporter, Selection, SourceCandidate, TargetNameTemplate,
    commit_with_free_space, hash_file,
};

fn selection_with(dir: &std::path::Path, files: &[(&str, usize)]) -> Selection {
    let mut sel = Selection::new();
    for (name, size) in files {
        let p = dir.join(name);
        fs::write(&p, format!("{name}{}", "k".repeat(*size - name.len()))).unwrap();
        sel.insert(hash_file(&p).unwrap(), SourceCandidate::from_path(&p).unwrap());
    }
    sel
}

#[test]
fn one_byte_short_writes_nothing() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    let sel = selection_with(src.path(), &[("a.bin", 2000), ("b.bin", 3000)]);
    assert_eq!(sel.total_size(), 5000);
    let mut catalog = Catalog::open(dst.path()).unwrap();
    let rows_before = catalog.len().unwrap();
    let required = required_space(sel.total_size());

    let err = commit_with_free_space(
        &sel,
        dst.path(),
        &mut catalog,
        &TargetNameTemplate::new("HASHID"),
        required - 1,
        &mut NullReporter,
    )
    .unwrap_err();

    match err {
        KatalError::InsufficientSpace { required: r, available, .. } => {
            assert_eq!(r, required);
            assert_eq!(available, required - 1);
        }
        other => panic!("unexpected error {other:?}"),
    }
    let names: Vec<_> = fs::read_dir(dst.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, [katal::DATABASE_NAME]);
    assert_eq!(catalog.len().unwrap(), rows_before);
}

#[test]
fn exact_requirement_is_not_enough() {
    let src = tempdir().unwrap();
    let dst = tempdir().unwrap();
    let sel = selection_with(src.path(), &[("a.bin", 2000)]);
    let mut catalog = Catalog::open(dst.path()).unwrap();
    let required = required_space(sel.total_size());

    let err = commit_with_free_space(
        &sel,
        dst.path(),
        &mut catalog,
        &TargetNameTemplate::new("HASHID"),
        required,
        &mut NullReporter,
    )
    .unwrap_err();
    assert!(matches!(err, KatalError::InsufficientSpace { .. }));
    assert_eq!(catalog.len().unwrap(), 0);

    let report = commit_with_free_space(
        &sel,
        dst.path(),
        &mut catalog,
        &TargetNameTemplate::new("HASHID"),
        required + 1,
        &mut NullReporter,
    )
    .unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(catalog.len().unwrap(), 1);
}
