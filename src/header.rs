//! Parses the BGEN file prologue, header flags, and optional sample block.

use std::io::{Read, Seek};
use std::path::Path;

use log::debug;

use crate::byte_reader::ByteReader;
use crate::compression::{require_zstd_available, Compression};
use crate::error::{BgenError, Result};

/// BGEN wire layout: v1.1 uses fixed `u16` probability triples, v1.2+ uses
/// bit-packed, ploidy/missingness-aware probability blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    V11,
    V12,
}

/// Everything discovered by reading the file's header and (optional) sample
/// block, plus where the variant stream begins.
#[derive(Debug, Clone)]
pub struct Header {
    pub nb_variants: u32,
    pub nb_samples: u32,
    pub layout: Layout,
    pub compression: Compression,
    pub samples: Option<Vec<String>>,
    pub first_variant_offset: u64,
}

impl Header {
    /// Reads the prologue, header flags, and (if present) sample block from
    /// the start of `reader`. The reader's cursor is left wherever the last
    /// read ended; callers seek explicitly afterwards.
    pub fn parse<R: Read + Seek>(reader: &mut ByteReader<R>) -> Result<Header> {
        let path = reader.path().to_path_buf();

        let offset = reader.read_u32()?;
        let first_variant_offset = offset as u64 + 4;

        let header_size = reader.read_u32()?;
        if header_size < 20 {
            return Err(BgenError::InvalidHeader {
                path,
                reason: format!("header_size must be >= 20, got {header_size}"),
            });
        }

        let nb_variants = reader.read_u32()?;
        let nb_samples = reader.read_u32()?;

        let magic = reader.read_exact(4)?;
        if &magic != b"bgen" && magic != [0, 0, 0, 0] {
            return Err(BgenError::InvalidHeader {
                path,
                reason: "magic number is neither \"bgen\" nor zero".to_string(),
            });
        }

        // Free area.
        reader.read_exact((header_size - 20) as usize)?;

        let flags = reader.read_u32()?;
        let compression_bits = flags & 0b11;
        let layout_bits = (flags >> 2) & 0b1111;
        let has_samples = (flags >> 31) & 1 == 1;

        let compression = Compression::from_flag_bits(compression_bits);
        if compression == Compression::Zstd {
            require_zstd_available(&path)?;
        }

        let layout = match layout_bits {
            0 => {
                return Err(BgenError::InvalidHeader {
                    path,
                    reason: "layout 0 is invalid".to_string(),
                })
            }
            1 => Layout::V11,
            2 => Layout::V12,
            other => {
                return Err(BgenError::InvalidHeader {
                    path,
                    reason: format!("unknown layout {other}"),
                })
            }
        };

        debug!(
            "{}: layout={layout:?} compression={compression:?} nb_variants={nb_variants} nb_samples={nb_samples}",
            path.display()
        );

        let samples = if has_samples {
            Some(Header::parse_sample_block(
                reader, header_size, offset, nb_samples, &path,
            )?)
        } else {
            None
        };

        Ok(Header {
            nb_variants,
            nb_samples,
            layout,
            compression,
            samples,
            first_variant_offset,
        })
    }

    fn parse_sample_block<R: Read + Seek>(
        reader: &mut ByteReader<R>,
        header_size: u32,
        offset: u32,
        nb_samples: u32,
        path: &Path,
    ) -> Result<Vec<String>> {
        let block_size = reader.read_u32()?;
        if block_size + header_size > offset {
            return Err(BgenError::InvalidHeader {
                path: path.to_path_buf(),
                reason: format!(
                    "sample block size {block_size} + header size {header_size} exceeds offset {offset}"
                ),
            });
        }

        let n = reader.read_u32()?;
        if n != nb_samples {
            return Err(BgenError::InvalidBlock {
                path: path.to_path_buf(),
                reason: format!(
                    "sample block declares {n} samples, header declares {nb_samples}"
                ),
            });
        }

        let mut samples = Vec::with_capacity(nb_samples as usize);
        for _ in 0..nb_samples {
            samples.push(reader.read_length_prefixed_string(2)?);
        }

        if samples.len() as u32 != nb_samples {
            return Err(BgenError::InvalidBlock {
                path: path.to_path_buf(),
                reason: "number of samples differs between header and sample block".to_string(),
            });
        }

        Ok(samples)
    }
}
