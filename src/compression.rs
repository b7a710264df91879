//! Decompressor dispatch: selected once per file from the header's
//! compression bits, then applied uniformly to every variant block.

use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::ZlibDecoder;

use crate::error::{BgenError, Result};

/// The three compression kinds BGEN supports for variant blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Zlib,
    Zstd,
}

impl Compression {
    /// Decodes the low 2 bits of the header flags word (spec §4.2 / §6).
    pub fn from_flag_bits(bits: u32) -> Self {
        match bits {
            0 => Compression::None,
            1 => Compression::Zlib,
            _ => Compression::Zstd,
        }
    }

    pub fn is_compressed(self) -> bool {
        !matches!(self, Compression::None)
    }

    /// Decompresses `bytes`, verifying the result is exactly `expected_len`
    /// long when one is supplied.
    pub fn decode(self, bytes: &[u8], expected_len: Option<usize>, path: &Path) -> Result<Vec<u8>> {
        let out = match self {
            Compression::None => bytes.to_vec(),
            Compression::Zlib => {
                let mut decoder = ZlibDecoder::new(bytes);
                let mut out = Vec::new();
                decoder
                    .read_to_end(&mut out)
                    .map_err(|source| BgenError::Io {
                        source,
                        path: path.to_path_buf(),
                    })?;
                out
            }
            Compression::Zstd => zstd::stream::decode_all(bytes).map_err(|source| BgenError::Io {
                source,
                path: path.to_path_buf(),
            })?,
        };

        if let Some(expected) = expected_len {
            if out.len() != expected {
                return Err(BgenError::InvalidBlock {
                    path: path.to_path_buf(),
                    reason: format!(
                        "decompressed length mismatch: expected {expected}, got {}",
                        out.len()
                    ),
                });
            }
        }

        Ok(out)
    }
}

/// Checks whether the zstd backend would be usable; always true in this
/// build since `zstd` is a hard dependency, but kept as a seam matching the
/// source's `HAS_ZSTD` feature-detection so a future build without the
/// `zstd` crate can fail open() with `UnsupportedCompression` instead of not
/// compiling at all.
pub fn zstd_backend_available() -> bool {
    true
}

/// Returns the path-qualified `UnsupportedCompression` open-time check.
pub fn require_zstd_available(path: &Path) -> Result<()> {
    if zstd_backend_available() {
        Ok(())
    } else {
        let _ = path;
        Err(BgenError::UnsupportedCompression)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn identity_passthrough() {
        let data = b"hello world";
        let out = Compression::None
            .decode(data, Some(data.len()), Path::new("x"))
            .unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn zlib_roundtrip() {
        use flate2::write::ZlibEncoder;
        use flate2::Compression as Flate2Compression;

        let mut enc = ZlibEncoder::new(Vec::new(), Flate2Compression::default());
        enc.write_all(b"the quick brown fox").unwrap();
        let compressed = enc.finish().unwrap();

        let out = Compression::Zlib
            .decode(&compressed, Some(19), Path::new("x"))
            .unwrap();
        assert_eq!(out, b"the quick brown fox");
    }

    #[test]
    fn zstd_roundtrip() {
        let compressed = zstd::stream::encode_all(&b"genomics"[..], 0).unwrap();
        let out = Compression::Zstd
            .decode(&compressed, Some(8), Path::new("x"))
            .unwrap();
        assert_eq!(out, b"genomics");
    }

    #[test]
    fn length_mismatch_is_invalid_block() {
        let data = b"abc";
        let err = Compression::None
            .decode(data, Some(99), Path::new("x"))
            .unwrap_err();
        assert!(matches!(err, BgenError::InvalidBlock { .. }));
    }

    #[test]
    fn flag_bits_select_kind() {
        assert_eq!(Compression::from_flag_bits(0), Compression::None);
        assert_eq!(Compression::from_flag_bits(1), Compression::Zlib);
        assert_eq!(Compression::from_flag_bits(2), Compression::Zstd);
    }
}
