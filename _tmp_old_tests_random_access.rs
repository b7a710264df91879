===== tests/random_access.rs =====
mod common;

use bgen_reader::BgenError;
use bgen_reader::BgenReader;
use common::{build_bgen_fixture, sample_variants};

#[test]
fn get_variant_by_name_matches_sequential_result() {
    let dir = tempfile::tempdir().unwrap();
    let path = build_bgen_fixture(dir.path(), "example", &["s1", "s2", "s3"], &sample_variants(8));

    let mut bgen = BgenReader::open(&path, 0.0, false).unwrap();
    let sequential: Vec<_> = bgen
        .iter_variants()
        .unwrap()
        .collect::<bgen_reader::Result<Vec<_>>>()
        .unwrap();
    let expected = sequential.into_iter().find(|(v, _)| v.name == "RSID_2").unwrap();

    let mut results = bgen.get_variant("RSID_2").unwrap();
    assert_eq!(results.len(), 1);
    let got = results.remove(0);
    assert_eq!(got.0, expected.0);
    assert_eq!(got.1, expected.1);
}

#[test]
fn unknown_rsid_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = build_bgen_fixture(dir.path(), "example", &["s1", "s2", "s3"], &sample_variants(8));

    let mut bgen = BgenReader::open(&path, 0.0, false).unwrap();
    let err = bgen.get_variant("NOT_A_RSID").unwrap_err();
    assert!(matches!(err, BgenError::UnknownVariant(name) if name == "NOT_A_RSID"));
}

#[test]
fn region_query_restricts_to_chromosome_and_position_range() {
    let dir = tempfile::tempdir().unwrap();
    let path = build_bgen_fixture(dir.path(), "example", &["s1", "s2", "s3"], &sample_variants(8));

    let mut bgen = BgenReader::open(&path, 0.0, false).unwrap();
    let names: Vec<String> = bgen
        .iter_variants_in_region("01", 0, 1500)
        .unwrap()
        .map(|r| r.unwrap().0.name)
        .collect();
    assert_eq!(names, vec!["RSID_1"]);
}

#[test]
fn iter_variants_by_names_resolves_a_set() {
    let dir = tempfile::tempdir().unwrap();
    let path = build_bgen_fixture(dir.path(), "example", &["s1", "s2", "s3"], &sample_variants(8));

    let mut bgen = BgenReader::open(&path, 0.0, false).unwrap();
    let mut names: Vec<String> = bgen
        .iter_variants_by_names(&["RSID_1", "RSID_3"])
        .unwrap()
        .map(|r| r.unwrap().0.name)
        .collect();
    names.sort();
    assert_eq!(names, vec!["RSID_1", "RSID_3"]);
}

#[test]
fn iter_variant_info_reads_metadata_without_decoding_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = build_bgen_fixture(dir.path(), "example", &["s1", "s2", "s3"], &sample_variants(8));

    let bgen = BgenReader::open(&path, 0.0, false).unwrap();
    let metas: Vec<_> = bgen
        .iter_variant_info()
        .unwrap()
        .collect::<bgen_reader::Result<Vec<_>>>()
        .unwrap();
    assert_eq!(metas.len(), 3);
    assert_eq!(metas[1].name, "RSID_2");
}

#[test]
fn missing_sidecar_index_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = build_bgen_fixture(dir.path(), "example", &["s1", "s2", "s3"], &sample_variants(8));
    std::fs::remove_file(format!("{}.bgi", path.display())).unwrap();

    let err = BgenReader::open(&path, 0.0, false).unwrap_err();
    assert!(matches!(err, BgenError::MissingIndex(_)));
}


