===== tests/parallel_reads.rs =====
mod common;

use std::collections::HashSet;

use bgen_reader::{BgenReader, ParallelBgenReader};
use common::{build_bgen_fixture, sample_variants};

#[test]
fn parallel_iteration_visits_the_same_variants_as_sequential() {
    let dir = tempfile::tempdir().unwrap();
    let path = build_bgen_fixture(dir.path(), "example", &["s1", "s2", "s3"], &sample_variants(16));

    let mut sequential = BgenReader::open(&path, 0.0, false).unwrap();
    let expected: HashSet<String> = sequential
        .iter_variants()
        .unwrap()
        .map(|r| r.unwrap().0.name)
        .collect();

    let parallel = ParallelBgenReader::open(&path, 0.0, 4, false).unwrap();
    let got: HashSet<String> = parallel
        .iter_variants()
        .unwrap()
        .map(|r| r.unwrap().0.name)
        .collect();

    assert_eq!(expected, got);
    assert_eq!(got.len(), 3);
}

#[test]
fn parallel_reader_reports_the_same_header_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = build_bgen_fixture(dir.path(), "example", &["s1", "s2", "s3"], &sample_variants(8));

    let parallel = ParallelBgenReader::open(&path, 0.0, 2, false).unwrap();
    assert_eq!(parallel.nb_variants(), 3);
    assert_eq!(parallel.nb_samples(), 3);
    assert_eq!(parallel.samples().unwrap(), &["s1", "s2", "s3"]);
}

#[test]
fn dropping_a_partially_consumed_parallel_iterator_does_not_hang() {
    let dir = tempfile::tempdir().unwrap();
    let path = build_bgen_fixture(dir.path(), "example", &["s1", "s2", "s3"], &sample_variants(8));

    let parallel = ParallelBgenReader::open_with_capacity(&path, 0.0, 4, false, 1).unwrap();
    {
        let mut iter = parallel.iter_variants().unwrap();
        let _ = iter.next();
    }
    // Reaching this point without the test hanging demonstrates the iterator's
    // `Drop` joins its worker threads rather than deadlocking.
}


