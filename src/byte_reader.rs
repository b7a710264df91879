//! Thin little-endian cursor over a seekable byte source.

use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::{BgenError, Result};

/// Wraps a seekable reader and exposes fixed-width little-endian reads.
///
/// All integer reads are unsigned, matching BGEN's wire format. Short reads
/// at EOF are reported as `BgenError::TruncatedFile` rather than panicking.
pub struct ByteReader<R> {
    inner: R,
    path: PathBuf,
}

impl<R: Read + Seek> ByteReader<R> {
    pub fn new(inner: R, path: impl AsRef<Path>) -> Self {
        ByteReader {
            inner,
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Reads exactly `n` bytes, failing with `TruncatedFile` on short read.
    pub fn read_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        match self.inner.read_exact(&mut buf) {
            Ok(()) => Ok(buf),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                Err(BgenError::TruncatedFile {
                    path: self.path.clone(),
                    expected: n,
                    actual: 0,
                })
            }
            Err(source) => Err(BgenError::Io {
                source,
                path: self.path.clone(),
            }),
        }
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_exact(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.read_exact(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.read_exact(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Reads a length-prefixed UTF-8 string. `prefix_width` is 2 (u16) or 4 (u32).
    pub fn read_length_prefixed_string(&mut self, prefix_width: u8) -> Result<String> {
        let len = match prefix_width {
            2 => self.read_u16()? as usize,
            4 => self.read_u32()? as usize,
            other => panic!("unsupported string length prefix width: {other}"),
        };
        let bytes = self.read_exact(len)?;
        String::from_utf8(bytes).map_err(|e| BgenError::InvalidBlock {
            path: self.path.clone(),
            reason: format!("non-UTF-8 string: {e}"),
        })
    }

    pub fn seek(&mut self, abs_offset: u64) -> Result<()> {
        self.inner
            .seek(SeekFrom::Start(abs_offset))
            .map_err(|source| BgenError::Io {
                source,
                path: self.path.clone(),
            })?;
        Ok(())
    }

    pub fn tell(&mut self) -> Result<u64> {
        self.inner
            .seek(SeekFrom::Current(0))
            .map_err(|source| BgenError::Io {
                source,
                path: self.path.clone(),
            })
    }
}
