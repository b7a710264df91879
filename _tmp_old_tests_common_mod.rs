===== tests/common/mod.rs =====
//! Synthetic fixture builder: writes a minimal, valid layout-2, uncompressed
//! `.bgen` file plus its `.bgi` sidecar index to a temp directory, so
//! integration tests exercise the real on-disk format without checking in
//! binary fixtures.

use std::path::PathBuf;

use rusqlite::Connection;

pub struct VariantFixture {
    pub chromosome: &'static str,
    pub position: u32,
    pub rsid: &'static str,
    pub allele1: &'static str,
    pub allele2: &'static str,
    pub bit_width: u8,
    /// One `(homref_raw, het_raw)` pair per sample, in the variant's bit width.
    pub values: Vec<(u32, u32)>,
    pub missing: Vec<bool>,
}

fn length_prefixed(s: &str) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(s.len() as u16).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
    out
}

fn length_prefixed4(s: &str) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(s.len() as u32).to_le_bytes());
    out.extend_from_slice(s.as_bytes());
    out
}

/// Rolling little-endian bit writer, the inverse of the reader's
/// `unpack_bits` accumulator, sized for widths beyond what a single `u128`
/// shift can hold once many samples are packed together.
struct BitWriter {
    bytes: Vec<u8>,
    acc: u64,
    acc_bits: u32,
}

impl BitWriter {
    fn new() -> Self {
        BitWriter {
            bytes: Vec::new(),
            acc: 0,
            acc_bits: 0,
        }
    }

    fn push(&mut self, value: u64, bit_width: u32) {
        self.acc |= value << self.acc_bits;
        self.acc_bits += bit_width;
        while self.acc_bits >= 8 {
            self.bytes.push((self.acc & 0xFF) as u8);
            self.acc >>= 8;
            self.acc_bits -= 8;
        }
    }

    fn into_bytes(mut self) -> Vec<u8> {
        if self.acc_bits > 0 {
            self.bytes.push((self.acc & 0xFF) as u8);
        }
        self.bytes
    }
}

fn encode_variant_block(v: &VariantFixture, n_samples: u32) -> Vec<u8> {
    let mut block = Vec::new();
    block.extend_from_slice(&length_prefixed("")); // variant id, unused
    block.extend_from_slice(&length_prefixed(v.rsid));
    block.extend_from_slice(&length_prefixed(v.chromosome));
    block.extend_from_slice(&v.position.to_le_bytes());
    block.extend_from_slice(&2u16.to_le_bytes()); // nb_alleles
    block.extend_from_slice(&length_prefixed4(v.allele1));
    block.extend_from_slice(&length_prefixed4(v.allele2));

    let mut inner = Vec::new();
    inner.extend_from_slice(&n_samples.to_le_bytes());
    inner.extend_from_slice(&2u16.to_le_bytes());
    inner.push(2); // min_ploidy
    inner.push(2); // max_ploidy
    for &m in &v.missing {
        inner.push(if m { 0b1000_0010 } else { 0b0000_0010 });
    }
    inner.push(0); // phased
    inner.push(v.bit_width);

    let mut writer = BitWriter::new();
    for &(a, b) in &v.values {
        writer.push(a as u64, v.bit_width as u32);
        writer.push(b as u64, v.bit_width as u32);
    }
    inner.extend_from_slice(&writer.into_bytes());

    let d = inner.len() as u32;
    block.extend_from_slice(&d.to_le_bytes()); // c == d, uncompressed
    block.extend_from_slice(&inner);
    block
}

/// Builds `<dir>/<name>.bgen` and `<dir>/<name>.bgen.bgi`, returning the bgen
/// path. Layout 2, no compression, with an embedded sample identifier block.
pub fn build_bgen_fixture(
    dir: &std::path::Path,
    name: &str,
    samples: &[&str],
    variants: &[VariantFixture],
) -> PathBuf {
    let nb_samples = samples.len() as u32;
    let nb_variants = variants.len() as u32;

    let header_size: u32 = 20;
    let mut sample_block = Vec::new();
    {
        let inner_len = 4 + samples.iter().map(|s| 2 + s.len() as u32).sum::<u32>();
        sample_block.extend_from_slice(&inner_len.to_le_bytes());
        sample_block.extend_from_slice(&nb_samples.to_le_bytes());
        for s in samples {
            sample_block.extend_from_slice(&length_prefixed(s));
        }
    }

    let offset = header_size + sample_block.len() as u32;

    let mut flags: u32 = 0;
    flags |= 0; // compression = none
    flags |= 2 << 2; // layout 2
    flags |= 1 << 31; // has samples

    let mut bytes = Vec::new();
    bytes.extend_from_slice(&offset.to_le_bytes());
    bytes.extend_from_slice(&header_size.to_le_bytes());
    bytes.extend_from_slice(&nb_variants.to_le_bytes());
    bytes.extend_from_slice(&nb_samples.to_le_bytes());
    bytes.extend_from_slice(b"bgen");
    bytes.extend_from_slice(&flags.to_le_bytes());
    bytes.extend_from_slice(&sample_block);

    assert_eq!(bytes.len() as u32, offset + 4);

    let mut offsets = Vec::with_capacity(variants.len());
    for v in variants {
        offsets.push(bytes.len() as u64);
        bytes.extend_from_slice(&encode_variant_block(v, nb_samples));
    }

    let bgen_path = dir.join(format!("{name}.bgen"));
    std::fs::write(&bgen_path, &bytes).unwrap();

    let index_path = dir.join(format!("{name}.bgen.bgi"));
    let conn = Connection::open(&index_path).unwrap();
    conn.execute(
        "CREATE TABLE Variant (
            chromosome TEXT,
            position INTEGER,
            rsid TEXT,
            allele1 TEXT,
            allele2 TEXT,
            file_start_position INTEGER
        )",
        [],
    )
    .unwrap();
    for (v, offset) in variants.iter().zip(offsets.iter()) {
        conn.execute(
            "INSERT INTO Variant VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                v.chromosome,
                v.position,
                v.rsid,
                v.allele1,
                v.allele2,
                *offset as i64
            ],
        )
        .unwrap();
    }

    bgen_path
}

pub fn sample_variants(bit_width: u8) -> Vec<VariantFixture> {
    let max = ((1u64 << bit_width) - 1) as u32;
    vec![
        VariantFixture {
            chromosome: "01",
            position: 1000,
            rsid: "RSID_1",
            allele1: "A",
            allele2: "G",
            bit_width,
            values: vec![(max, 0), (0, max), (0, 0)],
            missing: vec![false, false, false],
        },
        VariantFixture {
            chromosome: "01",
            position: 2000,
            rsid: "RSID_2",
            allele1: "C",
            allele2: "T",
            bit_width,
            values: vec![(max, 0), (max, 0), (0, 0)],
            missing: vec![false, true, false],
        },
        VariantFixture {
            chromosome: "02",
            position: 500,
            rsid: "RSID_3",
            allele1: "G",
            allele2: "A",
            bit_width,
            values: vec![(0, max), (0, max), (0, max)],
            missing: vec![false, false, false],
        },
    ]
}


