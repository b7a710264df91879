===== src/codec.rs =====
//! The variant block codec: parses a variant's identity and decodes its
//! compressed, bit-packed probability payload into either a probability
//! matrix or a dosage vector.

use std::io::{Read, Seek};
use std::path::Path;

use crate::bitpack::{unpack_bits, value_to_probability};
use crate::byte_reader::ByteReader;
use crate::compression::Compression;
use crate::error::{BgenError, Result};
use crate::header::Layout;
use crate::variant::{DosageVector, ProbabilityMatrix, Variant, VariantData};

/// Whether the reader returns full probability triples or a derived dosage
/// per sample; selected once at open time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnMode {
    Probabilities,
    Dosage,
}

/// Reads the variant identity fields at the current file position (spec
/// §4.6 "Identity parsing").
pub fn read_variant_identity<R: Read + Seek>(
    reader: &mut ByteReader<R>,
    layout: Layout,
    nb_samples: u32,
) -> Result<Variant> {
    let path = reader.path().to_path_buf();

    if layout == Layout::V11 {
        let n = reader.read_u32()?;
        if n != nb_samples {
            return Err(BgenError::InvalidBlock {
                path,
                reason: format!(
                    "variant block declares {n} samples, header declares {nb_samples}"
                ),
            });
        }
    }

    let _id = reader.read_length_prefixed_string(2)?;
    let rsid = reader.read_length_prefixed_string(2)?;
    let chromosome = reader.read_length_prefixed_string(2)?;
    let position = reader.read_u32()?;

    let nb_alleles = match layout {
        Layout::V11 => 2,
        Layout::V12 => reader.read_u16()?,
    };
    if nb_alleles != 2 {
        return Err(BgenError::UnsupportedVariant {
            path,
            reason: format!("only biallelic variants are supported, got {nb_alleles} alleles"),
        });
    }

    let allele1 = reader.read_length_prefixed_string(4)?;
    let allele2 = reader.read_length_prefixed_string(4)?;

    Ok(Variant {
        name: rsid,
        chromosome,
        position,
        allele1,
        allele2,
    })
}

/// Reads and decodes the current variant's probability payload, returning
/// either the full probability matrix or a dosage vector per `return_mode`.
pub fn read_variant_data<R: Read + Seek>(
    reader: &mut ByteReader<R>,
    layout: Layout,
    compression: Compression,
    nb_samples: u32,
    prob_threshold: f64,
    return_mode: ReturnMode,
) -> Result<VariantData> {
    match layout {
        Layout::V11 => {
            let probs = decode_layout1(reader, compression, nb_samples)?;
            Ok(match return_mode {
                ReturnMode::Probabilities => VariantData::Probabilities(probs),
                ReturnMode::Dosage => {
                    VariantData::Dosage(layout1_dosage(&probs, prob_threshold))
                }
            })
        }
        Layout::V12 => {
            let (probs, missing) = decode_layout2(reader, compression, nb_samples)?;
            Ok(match return_mode {
                ReturnMode::Probabilities => VariantData::Probabilities(probs),
                ReturnMode::Dosage => {
                    VariantData::Dosage(layout2_dosage(&probs, &missing, prob_threshold))
                }
            })
        }
    }
}

fn decode_layout1<R: Read + Seek>(
    reader: &mut ByteReader<R>,
    compression: Compression,
    nb_samples: u32,
) -> Result<ProbabilityMatrix> {
    let path = reader.path().to_path_buf();
    let n = nb_samples as usize;
    let expected_len = 6 * n;

    let raw = if compression.is_compressed() {
        let c = reader.read_u32()?;
        let compressed = reader.read_exact(c as usize)?;
        compression.decode(&compressed, Some(expected_len), &path)?
    } else {
        reader.read_exact(expected_len)?
    };

    let mut rows = Vec::with_capacity(n);
    for i in 0..n {
        let base = i * 6;
        let p0 = u16::from_le_bytes([raw[base], raw[base + 1]]) as f64 / 32768.0;
        let p1 = u16::from_le_bytes([raw[base + 2], raw[base + 3]]) as f64 / 32768.0;
        let p2 = u16::from_le_bytes([raw[base + 4], raw[base + 5]]) as f64 / 32768.0;
        rows.push([p0, p1, p2]);
    }

    Ok(ProbabilityMatrix::from_rows(rows))
}

fn layout1_dosage(probs: &ProbabilityMatrix, threshold: f64) -> DosageVector {
    let values = probs
        .rows()
        .map(|row| {
            let dosage = 2.0 * row[2] + row[1];
            if threshold > 0.0 && row.iter().cloned().fold(f64::MIN, f64::max) < threshold {
                f64::NAN
            } else {
                dosage
            }
        })
        .collect();
    DosageVector(values)
}

/// Decodes a layout-2 payload, returning the `(N,3)` probability matrix
/// (homalt already resolved as `1 - homref - het`) and a per-sample
/// missingness flag.
fn decode_layout2<R: Read + Seek>(
    reader: &mut ByteReader<R>,
    compression: Compression,
    nb_samples: u32,
) -> Result<(ProbabilityMatrix, Vec<bool>)> {
    let path = reader.path().to_path_buf();

    let c = reader.read_u32()?;
    let (to_read, d) = if compression.is_compressed() {
        let d = reader.read_u32()?;
        (c - 4, d)
    } else {
        (c, c)
    };

    let compressed_or_raw = reader.read_exact(to_read as usize)?;
    let data = compression.decode(&compressed_or_raw, Some(d as usize), &path)?;

    let mut pos = 0usize;
    let n = read_u32_at(&data, &mut pos, &path)?;
    if n != nb_samples {
        return Err(BgenError::InvalidBlock {
            path,
            reason: format!(
                "variant block declares {n} samples, header declares {nb_samples}"
            ),
        });
    }

    let nb_alleles = read_u16_at(&data, &mut pos, &path)?;
    if nb_alleles != 2 {
        return Err(BgenError::UnsupportedVariant {
            path,
            reason: format!("only biallelic variants are supported, got {nb_alleles} alleles"),
        });
    }

    let min_ploidy = read_u8_at(&data, &mut pos, &path)?;
    let max_ploidy = read_u8_at(&data, &mut pos, &path)?;
    if min_ploidy != 2 || max_ploidy != 2 {
        return Err(BgenError::UnsupportedVariant {
            path,
            reason: format!(
                "only diploid variants are supported, got min_ploidy={min_ploidy} max_ploidy={max_ploidy}"
            ),
        });
    }

    let n_usize = nb_samples as usize;
    let ploidy_bytes = data
        .get(pos..pos + n_usize)
        .ok_or_else(|| BgenError::TruncatedFile {
            path: path.clone(),
            expected: pos + n_usize,
            actual: data.len(),
        })?;
    let missing: Vec<bool> = ploidy_bytes.iter().map(|&b| (b & 0b1000_0000) != 0).collect();
    pos += n_usize;

    let phased = read_u8_at(&data, &mut pos, &path)?;
    if phased != 0 {
        return Err(BgenError::UnsupportedVariant {
            path,
            reason: "phased data is not supported".to_string(),
        });
    }

    let bit_width = read_u8_at(&data, &mut pos, &path)? as u32;
    if !(1..=32).contains(&bit_width) {
        return Err(BgenError::InvalidBlock {
            path,
            reason: format!("bit width must be in 1..=32, got {bit_width}"),
        });
    }

    let remaining = &data[pos..];
    let raw_values = unpack_bits(remaining, bit_width, 2 * n_usize);

    let mut rows = Vec::with_capacity(n_usize);
    for i in 0..n_usize {
        if missing[i] {
            rows.push([f64::NAN, f64::NAN, f64::NAN]);
            continue;
        }
        let p_homref = value_to_probability(raw_values[2 * i], bit_width);
        let p_het = value_to_probability(raw_values[2 * i + 1], bit_width);
        let p_homalt = 1.0 - p_homref - p_het;
        rows.push([p_homref, p_het, p_homalt]);
    }

    Ok((ProbabilityMatrix::from_rows(rows), missing))
}

fn layout2_dosage(probs: &ProbabilityMatrix, missing: &[bool], threshold: f64) -> DosageVector {
    let values = probs
        .rows()
        .enumerate()
        .map(|(i, row)| {
            if missing[i] {
                return f64::NAN;
            }
            let dosage = 2.0 * row[2] + row[1];
            if threshold > 0.0 {
                let best = row.iter().cloned().fold(f64::MIN, f64::max);
                if best < threshold {
                    return f64::NAN;
                }
            }
            dosage
        })
        .collect();
    DosageVector(values)
}

fn read_u32_at(data: &[u8], pos: &mut usize, path: &Path) -> Result<u32> {
    let slice = data
        .get(*pos..*pos + 4)
        .ok_or_else(|| BgenError::TruncatedFile {
            path: path.to_path_buf(),
            expected: *pos + 4,
            actual: data.len(),
        })?;
    *pos += 4;
    Ok(u32::from_le_bytes([slice[0], slice[1], slice[2], slice[3]]))
}

fn read_u16_at(data: &[u8], pos: &mut usize, path: &Path) -> Result<u16> {
    let slice = data
        .get(*pos..*pos + 2)
        .ok_or_else(|| BgenError::TruncatedFile {
            path: path.to_path_buf(),
            expected: *pos + 2,
            actual: data.len(),
        })?;
    *pos += 2;
    Ok(u16::from_le_bytes([slice[0], slice[1]]))
}

fn read_u8_at(data: &[u8], pos: &mut usize, path: &Path) -> Result<u8> {
    let byte = *data.get(*pos).ok_or_else(|| BgenError::TruncatedFile {
        path: path.to_path_buf(),
        expected: *pos + 1,
        actual: data.len(),
    })?;
    *pos += 1;
    Ok(byte)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(bytes: Vec<u8>) -> ByteReader<Cursor<Vec<u8>>> {
        ByteReader::new(Cursor::new(bytes), "t.bgen")
    }

    #[test]
    fn identity_layout1() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&3u32.to_le_bytes()); // n samples
        for s in ["id1", "RSID_1", "01"] {
            bytes.extend_from_slice(&(s.len() as u16).to_le_bytes());
            bytes.extend_from_slice(s.as_bytes());
        }
        bytes.extend_from_slice(&1000u32.to_le_bytes());
        for a in ["A", "G"] {
            bytes.extend_from_slice(&(a.len() as u32).to_le_bytes());
            bytes.extend_from_slice(a.as_bytes());
        }
        let mut r = reader(bytes);
        let v = read_variant_identity(&mut r, Layout::V11, 3).unwrap();
        assert_eq!(v.name, "RSID_1");
        assert_eq!(v.chromosome, "01");
        assert_eq!(v.position, 1000);
        assert_eq!(v.allele1, "A");
        assert_eq!(v.allele2, "G");
    }

    #[test]
    fn identity_rejects_non_biallelic_layout2() {
        let mut bytes = Vec::new();
        for s in ["id1", "RSID_1", "01"] {
            bytes.extend_from_slice(&(s.len() as u16).to_le_bytes());
            bytes.extend_from_slice(s.as_bytes());
        }
        bytes.extend_from_slice(&1000u32.to_le_bytes());
        bytes.extend_from_slice(&3u16.to_le_bytes()); // nb_alleles = 3
        let mut r = reader(bytes);
        let err = read_variant_identity(&mut r, Layout::V12, 3).unwrap_err();
        assert!(matches!(err, BgenError::UnsupportedVariant { .. }));
    }

    #[test]
    fn layout1_uncompressed_roundtrip() {
        let n = 2u32;
        let mut bytes = Vec::new();
        // sample0: homref=1.0 (32768), het=0, homalt=0
        bytes.extend_from_slice(&32768u16.to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes());
        // sample1: homref=0, het=32768 (1.0), homalt=0
        bytes.extend_from_slice(&0u16.to_le_bytes());
        bytes.extend_from_slice(&32768u16.to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes());

        let mut r = reader(bytes);
        let data = read_variant_data(
            &mut r,
            Layout::V11,
            Compression::None,
            n,
            0.0,
            ReturnMode::Probabilities,
        )
        .unwrap();
        match data {
            VariantData::Probabilities(p) => {
                assert_eq!(p.row(0), [1.0, 0.0, 0.0]);
                assert_eq!(p.row(1), [0.0, 1.0, 0.0]);
            }
            _ => panic!("expected probabilities"),
        }
    }

    #[test]
    fn layout1_dosage_mode() {
        let n = 1u32;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0u16.to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes());
        bytes.extend_from_slice(&32768u16.to_le_bytes()); // homalt = 1.0
        let mut r = reader(bytes);
        let data = read_variant_data(
            &mut r,
            Layout::V11,
            Compression::None,
            n,
            0.0,
            ReturnMode::Dosage,
        )
        .unwrap();
        match data {
            VariantData::Dosage(d) => assert_eq!(d.0[0], 2.0),
            _ => panic!("expected dosage"),
        }
    }

    fn build_layout2_block(
        n_samples: u32,
        bit_width: u8,
        missing: &[bool],
        per_sample_values: &[(u32, u32)],
    ) -> Vec<u8> {
        let mut inner = Vec::new();
        inner.extend_from_slice(&n_samples.to_le_bytes());
        inner.extend_from_slice(&2u16.to_le_bytes()); // nb_alleles
        inner.push(2); // min_ploidy
        inner.push(2); // max_ploidy
        for &m in missing {
            inner.push(if m { 0b1000_0010 } else { 0b0000_0010 });
        }
        inner.push(0); // phased
        inner.push(bit_width);

        let mut acc: u128 = 0;
        let mut shift = 0u32;
        for &(a, b) in per_sample_values {
            acc |= (a as u128) << shift;
            shift += bit_width as u32;
            acc |= (b as u128) << shift;
            shift += bit_width as u32;
        }
        let needed_bytes = ((bit_width as usize) * 2 * per_sample_values.len()).div_ceil(8);
        let bytes = acc.to_le_bytes();
        inner.extend_from_slice(&bytes[..needed_bytes.max(1).min(16)]);

        let d = inner.len() as u32;
        let mut block = Vec::new();
        block.extend_from_slice(&d.to_le_bytes()); // c == d (uncompressed)
        block.extend_from_slice(&inner);
        block
    }

    #[test]
    fn layout2_uncompressed_probabilities() {
        let bit_width = 8u8;
        let max = (1u32 << bit_width) - 1;
        let bytes = build_layout2_block(2, bit_width, &[false, false], &[(max, 0), (0, max)]);
        let mut r = reader(bytes);
        let data = read_variant_data(
            &mut r,
            Layout::V12,
            Compression::None,
            2,
            0.0,
            ReturnMode::Probabilities,
        )
        .unwrap();
        match data {
            VariantData::Probabilities(p) => {
                let row0 = p.row(0);
                assert!((row0[0] - 1.0).abs() < 1e-9);
                assert!((row0[1] - 0.0).abs() < 1e-9);
                assert!((row0[2] - 0.0).abs() < 1e-9);

                let row1 = p.row(1);
                assert!((row1[0] - 0.0).abs() < 1e-9);
                assert!((row1[1] - 1.0).abs() < 1e-9);
                assert!((row1[2] - 0.0).abs() < 1e-9);
            }
            _ => panic!("expected probabilities"),
        }
    }

    #[test]
    fn layout2_missing_sample_is_nan() {
        let bit_width = 8u8;
        let max = (1u32 << bit_width) - 1;
        let bytes = build_layout2_block(2, bit_width, &[false, true], &[(max, 0), (0, 0)]);
        let mut r = reader(bytes);
        let data = read_variant_data(
            &mut r,
            Layout::V12,
            Compression::None,
            2,
            0.0,
            ReturnMode::Dosage,
        )
        .unwrap();
        match data {
            VariantData::Dosage(d) => {
                assert!(d.0[0].is_finite());
                assert!(d.0[1].is_nan());
            }
            _ => panic!("expected dosage"),
        }
    }

    #[test]
    fn layout2_rejects_non_diploid() {
        let mut inner = Vec::new();
        inner.extend_from_slice(&1u32.to_le_bytes());
        inner.extend_from_slice(&2u16.to_le_bytes());
        inner.push(1); // min_ploidy != 2
        inner.push(2);
        let d = inner.len() as u32;
        let mut block = Vec::new();
        block.extend_from_slice(&d.to_le_bytes());
        block.extend_from_slice(&inner);

        let mut r = reader(block);
        let err = read_variant_data(
            &mut r,
            Layout::V12,
            Compression::None,
            1,
            0.0,
            ReturnMode::Probabilities,
        )
        .unwrap_err();
        assert!(matches!(err, BgenError::UnsupportedVariant { .. }));
    }

    #[test]
    fn threshold_zero_disables_filtering() {
        let bit_width = 8u8;
        // Low-confidence calls: homref=0.5-ish
        let half = 128u32;
        let bytes = build_layout2_block(1, bit_width, &[false], &[(half, 0)]);
        let mut r = reader(bytes);
        let data = read_variant_data(
            &mut r,
            Layout::V12,
            Compression::None,
            1,
            0.0,
            ReturnMode::Dosage,
        )
        .unwrap();
        match data {
            VariantData::Dosage(d) => assert!(d.0[0].is_finite()),
            _ => panic!("expected dosage"),
        }
    }

    #[test]
    fn threshold_one_makes_non_exact_calls_nan() {
        let bit_width = 8u8;
        let half = 128u32;
        let bytes = build_layout2_block(1, bit_width, &[false], &[(half, 0)]);
        let mut r = reader(bytes);
        let data = read_variant_data(
            &mut r,
            Layout::V12,
            Compression::None,
            1,
            1.0,
            ReturnMode::Dosage,
        )
        .unwrap();
        match data {
            VariantData::Dosage(d) => assert!(d.0[0].is_nan()),
            _ => panic!("expected dosage"),
        }
    }
}


