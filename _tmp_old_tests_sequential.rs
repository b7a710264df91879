===== tests/sequential.rs =====
mod common;

use bgen_reader::{BgenReader, VariantData};
use common::{build_bgen_fixture, sample_variants};

#[test]
fn opens_and_reports_header_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = build_bgen_fixture(dir.path(), "example", &["s1", "s2", "s3"], &sample_variants(8));

    let bgen = BgenReader::open(&path, 0.9, false).unwrap();
    assert_eq!(bgen.nb_variants(), 3);
    assert_eq!(bgen.nb_samples(), 3);
    assert_eq!(bgen.samples().unwrap(), &["s1", "s2", "s3"]);
}

#[test]
fn sequential_iteration_visits_every_variant_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = build_bgen_fixture(dir.path(), "example", &["s1", "s2", "s3"], &sample_variants(8));

    let mut bgen = BgenReader::open(&path, 0.0, false).unwrap();
    let records: Vec<_> = bgen
        .iter_variants()
        .unwrap()
        .collect::<bgen_reader::Result<Vec<_>>>()
        .unwrap();

    assert_eq!(records.len(), 3);
    let names: Vec<&str> = records.iter().map(|(v, _)| v.name.as_str()).collect();
    assert_eq!(names, vec!["RSID_1", "RSID_2", "RSID_3"]);

    match &records[0].1 {
        VariantData::Dosage(d) => {
            assert!((d.0[0] - 0.0).abs() < 1e-6);
            assert!((d.0[1] - 1.0).abs() < 1e-6);
            assert!((d.0[2] - 2.0).abs() < 1e-6);
        }
        _ => panic!("expected dosage"),
    }

    match &records[1].1 {
        VariantData::Dosage(d) => {
            assert!(d.0[1].is_nan(), "missing sample must decode as NaN");
        }
        _ => panic!("expected dosage"),
    }
}

#[test]
fn iterating_twice_restarts_from_the_first_variant() {
    let dir = tempfile::tempdir().unwrap();
    let path = build_bgen_fixture(dir.path(), "example", &["s1", "s2", "s3"], &sample_variants(16));

    let mut bgen = BgenReader::open(&path, 0.0, false).unwrap();
    let first_pass: Vec<String> = bgen
        .iter_variants()
        .unwrap()
        .map(|r| r.unwrap().0.name)
        .collect();
    let second_pass: Vec<String> = bgen
        .iter_variants()
        .unwrap()
        .map(|r| r.unwrap().0.name)
        .collect();
    assert_eq!(first_pass, second_pass);
}

#[test]
fn probabilities_mode_returns_full_matrix() {
    let dir = tempfile::tempdir().unwrap();
    let path = build_bgen_fixture(dir.path(), "example", &["s1", "s2", "s3"], &sample_variants(8));

    let mut bgen = BgenReader::open(&path, 0.9, true).unwrap();
    let (_, data) = bgen.iter_variants().unwrap().next().unwrap().unwrap();
    match data {
        VariantData::Probabilities(p) => {
            assert_eq!(p.n_samples(), 3);
            let row0 = p.row(0);
            assert!((row0[0] - 1.0).abs() < 1e-6);
        }
        _ => panic!("expected probabilities"),
    }
}

#[test]
fn arbitrary_bit_widths_decode_consistently() {
    let dir = tempfile::tempdir().unwrap();
    for bit_width in [1u8, 3, 9, 16, 24, 32] {
        let variants = sample_variants(bit_width);
        let path = build_bgen_fixture(
            dir.path(),
            &format!("bw{bit_width}"),
            &["s1", "s2", "s3"],
            &variants,
        );
        let mut bgen = BgenReader::open(&path, 0.0, false).unwrap();
        let records: Vec<_> = bgen
            .iter_variants()
            .unwrap()
            .collect::<bgen_reader::Result<Vec<_>>>()
            .unwrap();
        assert_eq!(records.len(), 3);
    }
}

