===== tests/boundary_errors.rs =====
mod common;

use bgen_reader::{BgenError, BgenReader};
use common::{build_bgen_fixture, sample_variants};

#[test]
fn negative_threshold_is_rejected_at_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = build_bgen_fixture(dir.path(), "example", &["s1", "s2", "s3"], &sample_variants(8));

    let err = BgenReader::open(&path, -0.1, false).unwrap_err();
    assert!(matches!(err, BgenError::InvalidHeader { .. }));
}

#[test]
fn truncated_file_is_reported_not_panicked() {
    let dir = tempfile::tempdir().unwrap();
    let path = build_bgen_fixture(dir.path(), "example", &["s1", "s2", "s3"], &sample_variants(8));

    let full = std::fs::read(&path).unwrap();
    let truncated_path = dir.path().join("truncated.bgen");
    std::fs::write(&truncated_path, &full[..full.len() - 5]).unwrap();
    std::fs::copy(
        format!("{}.bgi", path.display()),
        dir.path().join("truncated.bgen.bgi"),
    )
    .unwrap();

    let mut bgen = BgenReader::open(&truncated_path, 0.0, false).unwrap();
    let last = bgen.iter_variants().unwrap().last().unwrap();
    assert!(matches!(last, Err(BgenError::TruncatedFile { .. })));
}

#[test]
fn nonexistent_file_is_an_io_error() {
    let err = BgenReader::open("/nonexistent/path/does-not-exist.bgen", 0.9, false).unwrap_err();
    assert!(matches!(err, BgenError::Io { .. }));
}

#[test]
fn close_is_idempotent_and_blocks_further_index_use() {
    let dir = tempfile::tempdir().unwrap();
    let path = build_bgen_fixture(dir.path(), "example", &["s1", "s2", "s3"], &sample_variants(8));

    let mut bgen = BgenReader::open(&path, 0.0, false).unwrap();
    bgen.close();
    bgen.close();
    let err = bgen.get_variant("RSID_1").unwrap_err();
    assert!(matches!(err, BgenError::MissingIndex(_)));
}


