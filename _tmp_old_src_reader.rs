===== src/reader.rs =====
//! Composes the byte reader, header parser, index client, and variant block
//! codec into the public iteration/lookup API.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use log::debug;

use crate::byte_reader::ByteReader;
use crate::codec::{read_variant_data, read_variant_identity, ReturnMode};
use crate::error::{BgenError, Result};
use crate::header::Header;
use crate::index::IndexClient;
use crate::variant::{Variant, VariantData};

/// A random-access BGEN reader: sequential iteration plus index-backed
/// lookups by name or region.
///
/// Opening is paired with closing via `Drop`; `close()` is available for
/// explicit, idempotent early release and mirrors the source's context
/// manager.
pub struct BgenReader {
    bgen: ByteReader<BufReader<File>>,
    header: Header,
    index: Option<IndexClient>,
    prob_threshold: f64,
    return_mode: ReturnMode,
    last_variant_offset: u64,
    closed: bool,
}

impl BgenReader {
    /// Opens `path` for reading, verifying the sidecar index unless
    /// `skip_index` is set (used by parallel workers that are handed
    /// pre-resolved offsets and never query the index themselves).
    pub fn open(path: impl AsRef<Path>, prob_threshold: f64, probs_only: bool) -> Result<Self> {
        Self::open_impl(path.as_ref(), prob_threshold, probs_only, false)
    }

    /// Opens without connecting to the sidecar index. Used internally by
    /// parallel fan-out workers.
    pub(crate) fn open_skip_index(
        path: impl AsRef<Path>,
        prob_threshold: f64,
        probs_only: bool,
    ) -> Result<Self> {
        Self::open_impl(path.as_ref(), prob_threshold, probs_only, true)
    }

    fn open_impl(
        path: &Path,
        prob_threshold: f64,
        probs_only: bool,
        skip_index: bool,
    ) -> Result<Self> {
        if prob_threshold < 0.0 {
            return Err(BgenError::InvalidHeader {
                path: path.to_path_buf(),
                reason: "probability threshold must be non-negative".to_string(),
            });
        }

        let file = File::open(path).map_err(|source| BgenError::Io {
            source,
            path: path.to_path_buf(),
        })?;
        let mut bgen = ByteReader::new(BufReader::new(file), path);
        let header = Header::parse(&mut bgen)?;

        let (index, last_variant_offset) = if skip_index {
            (None, u64::MAX)
        } else {
            let index = IndexClient::open(path)?;
            let (count, min_offset, max_offset) = index.count_and_bounds()?;
            if count != header.nb_variants {
                return Err(BgenError::InvalidBlock {
                    path: path.to_path_buf(),
                    reason: format!(
                        "number of markers different between header ({}) and index file ({count})",
                        header.nb_variants
                    ),
                });
            }
            if min_offset != header.first_variant_offset {
                return Err(BgenError::InvalidBlock {
                    path: path.to_path_buf(),
                    reason: "first variant offset disagrees with index".to_string(),
                });
            }
            (Some(index), max_offset)
        };

        bgen.seek(header.first_variant_offset)?;

        debug!(
            "{}: opened ({} variants, {} samples)",
            path.display(),
            header.nb_variants,
            header.nb_samples
        );

        let return_mode = if probs_only {
            ReturnMode::Probabilities
        } else {
            ReturnMode::Dosage
        };

        Ok(BgenReader {
            bgen,
            header,
            index,
            prob_threshold,
            return_mode,
            last_variant_offset,
            closed: false,
        })
    }

    pub fn nb_variants(&self) -> u32 {
        self.header.nb_variants
    }

    pub fn nb_samples(&self) -> u32 {
        self.header.nb_samples
    }

    pub fn samples(&self) -> Option<&[String]> {
        self.header.samples.as_deref()
    }

    pub fn path(&self) -> &Path {
        self.bgen.path()
    }

    /// Releases the file and index handles. Idempotent.
    pub fn close(&mut self) {
        if !self.closed {
            debug!("{}: closing", self.bgen.path().display());
            self.index = None;
            self.closed = true;
        }
    }

    /// Reads the variant at the current file position.
    fn read_current_variant(&mut self) -> Result<(Variant, VariantData)> {
        let identity =
            read_variant_identity(&mut self.bgen, self.header.layout, self.header.nb_samples)?;
        let data = read_variant_data(
            &mut self.bgen,
            self.header.layout,
            self.header.compression,
            self.header.nb_samples,
            self.prob_threshold,
            self.return_mode,
        )?;
        Ok((identity, data))
    }

    fn read_at(&mut self, offset: u64) -> Result<(Variant, VariantData)> {
        self.bgen.seek(offset)?;
        self.read_current_variant()
    }

    /// Iterates every variant, from the first block to the last, resetting
    /// the file position to the start of the stream.
    pub fn iter_variants(&mut self) -> Result<SequentialIter<'_>> {
        self.bgen.seek(self.header.first_variant_offset)?;
        Ok(SequentialIter { reader: self })
    }

    /// Iterates variants whose `(chromosome, position)` falls within the
    /// closed interval `[start, end]`, in the index's natural enumeration
    /// order.
    pub fn iter_variants_in_region(
        &mut self,
        chrom: &str,
        start: u32,
        end: u32,
    ) -> Result<SeekListIter<'_>> {
        let offsets = self.require_index()?.offsets_by_region(chrom, start, end)?;
        Ok(SeekListIter {
            reader: self,
            offsets: offsets.into_iter(),
        })
    }

    /// Iterates variants matching any of `names` (by rsid).
    pub fn iter_variants_by_names(&mut self, names: &[&str]) -> Result<SeekListIter<'_>> {
        let offsets = self.require_index()?.offsets_by_rsids(names)?;
        Ok(SeekListIter {
            reader: self,
            offsets: offsets.into_iter(),
        })
    }

    /// Iterates identity-only metadata straight from the index, in batches,
    /// without touching the data stream.
    pub fn iter_variant_info(&self) -> Result<crate::index::VariantMetadataIter<'_>> {
        self.require_index_ref()?.iter_variant_metadata(1000)
    }

    /// Returns every record whose rsid matches `name`. Errors with
    /// `UnknownVariant` when none match (BGEN permits duplicate rsids, so
    /// the result may have more than one entry).
    pub fn get_variant(&mut self, name: &str) -> Result<Vec<(Variant, VariantData)>> {
        let offsets = self.require_index()?.offsets_by_rsid(name)?;
        if offsets.is_empty() {
            return Err(BgenError::UnknownVariant(name.to_string()));
        }

        let mut results = Vec::with_capacity(offsets.len());
        for offset in offsets {
            results.push(self.read_at(offset)?);
        }
        Ok(results)
    }

    /// All variant offsets from the index, ascending — used by the parallel
    /// fan-out to shard work across workers.
    pub(crate) fn all_offsets(&self) -> Result<Vec<u64>> {
        self.require_index_ref()?.offsets_all()
    }

    pub(crate) fn offsets_by_names(&self, names: &[&str]) -> Result<Vec<u64>> {
        self.require_index_ref()?.offsets_by_rsids(names)
    }

    pub(crate) fn prob_threshold(&self) -> f64 {
        self.prob_threshold
    }

    pub(crate) fn return_mode(&self) -> ReturnMode {
        self.return_mode
    }

    /// Reads the variant at a pre-resolved offset, used by parallel
    /// workers which skip the index entirely.
    pub(crate) fn read_seek(&mut self, offset: u64) -> Result<(Variant, VariantData)> {
        self.read_at(offset)
    }

    fn require_index(&mut self) -> Result<&IndexClient> {
        self.index
            .as_ref()
            .ok_or_else(|| BgenError::MissingIndex(self.bgen.path().to_path_buf()))
    }

    fn require_index_ref(&self) -> Result<&IndexClient> {
        self.index
            .as_ref()
            .ok_or_else(|| BgenError::MissingIndex(self.bgen.path().to_path_buf()))
    }
}

impl Drop for BgenReader {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Display for BgenReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BgenReader({} samples; {} variants)",
            self.header.nb_samples, self.header.nb_variants
        )
    }
}

/// Sequential iterator from the first variant block to the last, terminating
/// when the next offset would exceed the index-reported last variant offset.
pub struct SequentialIter<'a> {
    reader: &'a mut BgenReader,
}

impl Iterator for SequentialIter<'_> {
    type Item = Result<(Variant, VariantData)>;

    fn next(&mut self) -> Option<Self::Item> {
        let tell = match self.reader.bgen.tell() {
            Ok(t) => t,
            Err(e) => return Some(Err(e)),
        };
        if tell > self.reader.last_variant_offset {
            return None;
        }
        Some(self.reader.read_current_variant())
    }
}

/// Iterator over a pre-resolved list of offsets (region/name lookups).
pub struct SeekListIter<'a> {
    reader: &'a mut BgenReader,
    offsets: std::vec::IntoIter<u64>,
}

impl Iterator for SeekListIter<'_> {
    type Item = Result<(Variant, VariantData)>;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.offsets.next()?;
        Some(self.reader.read_at(offset))
    }
}

/// Constructs the conventional sidecar index path `<bgen_path>.bgi`.
pub fn bgi_path_for(bgen_path: &Path) -> PathBuf {
    let mut s = bgen_path.as_os_str().to_os_string();
    s.push(".bgi");
    PathBuf::from(s)
}


