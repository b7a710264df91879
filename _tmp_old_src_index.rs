===== src/index.rs =====
//! Client for the `.bgi` sidecar index: a SQLite database adjacent to the
//! BGEN file with a `Variant(chromosome, position, rsid, allele1, allele2,
//! file_start_position)` table.

use std::path::{Path, PathBuf};

use log::debug;
use rusqlite::Connection;

use crate::error::{BgenError, Result};
use crate::variant::Variant;

pub struct IndexClient {
    conn: Connection,
    path: PathBuf,
}

impl IndexClient {
    /// Connects to `<bgen_path>.bgi`, failing with `MissingIndex` if it does
    /// not exist.
    pub fn open(bgen_path: &Path) -> Result<Self> {
        let index_path = bgi_path(bgen_path);
        if !index_path.is_file() {
            return Err(BgenError::MissingIndex(index_path));
        }

        debug!("opening sidecar index {}", index_path.display());
        let conn = Connection::open(&index_path)?;
        Ok(IndexClient {
            conn,
            path: index_path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `(count, min_offset, max_offset)`, used by the header parser
    /// / reader facade to cross-check invariants against the BGEN header.
    pub fn count_and_bounds(&self) -> Result<(u32, u64, u64)> {
        let mut stmt = self.conn.prepare(
            "SELECT COUNT(rsid), MIN(file_start_position), MAX(file_start_position) \
             FROM Variant",
        )?;
        let row = stmt.query_row([], |row| {
            Ok((
                row.get::<_, i64>(0)? as u32,
                row.get::<_, i64>(1)? as u64,
                row.get::<_, i64>(2)? as u64,
            ))
        })?;
        Ok(row)
    }

    /// All variant offsets, ascending.
    pub fn offsets_all(&self) -> Result<Vec<u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT file_start_position FROM Variant ORDER BY file_start_position")?;
        let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row? as u64);
        }
        Ok(out)
    }

    /// Offsets for variants whose rsid is in `names`. Order is unspecified;
    /// duplicate rsids in the file yield duplicate offsets.
    pub fn offsets_by_rsids(&self, names: &[&str]) -> Result<Vec<u64>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = names.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let sql = format!(
            "SELECT file_start_position FROM Variant WHERE rsid IN ({placeholders})"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let params = rusqlite::params_from_iter(names.iter());
        let rows = stmt.query_map(params, |row| row.get::<_, i64>(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row? as u64);
        }
        Ok(out)
    }

    /// Offsets where `chromosome = chrom AND position BETWEEN start AND end`
    /// (inclusive).
    pub fn offsets_by_region(&self, chrom: &str, start: u32, end: u32) -> Result<Vec<u64>> {
        let mut stmt = self.conn.prepare(
            "SELECT file_start_position FROM Variant \
             WHERE chromosome = ?1 AND position BETWEEN ?2 AND ?3",
        )?;
        let rows = stmt.query_map(rusqlite::params![chrom, start, end], |row| {
            row.get::<_, i64>(0)
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row? as u64);
        }
        Ok(out)
    }

    /// The offset for a single rsid, used when a caller already knows the
    /// offset isn't ambiguous (kept separate from `offsets_by_rsids` for the
    /// common one-name case).
    pub fn offsets_by_rsid(&self, name: &str) -> Result<Vec<u64>> {
        self.offsets_by_rsids(&[name])
    }

    /// Lazily yields `(chromosome, position, rsid, allele1, allele2)`
    /// batched to bound memory, matching the original's
    /// `cursor.fetchmany(1000)` loop.
    pub fn iter_variant_metadata(&self, batch_size: usize) -> Result<VariantMetadataIter<'_>> {
        let stmt = self
            .conn
            .prepare("SELECT chromosome, position, rsid, allele1, allele2 FROM Variant")?;
        Ok(VariantMetadataIter {
            stmt,
            batch_size,
            buffer: Vec::new(),
            buffer_pos: 0,
            exhausted: false,
        })
    }
}

fn bgi_path(bgen_path: &Path) -> PathBuf {
    let mut s = bgen_path.as_os_str().to_os_string();
    s.push(".bgi");
    PathBuf::from(s)
}

/// Batched iterator over `(chromosome, position, rsid, allele1, allele2)`.
pub struct VariantMetadataIter<'a> {
    stmt: rusqlite::Statement<'a>,
    batch_size: usize,
    buffer: Vec<Variant>,
    buffer_pos: usize,
    exhausted: bool,
}

impl Iterator for VariantMetadataIter<'_> {
    type Item = Result<Variant>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer_pos >= self.buffer.len() {
            if self.exhausted {
                return None;
            }

            let fetch = (|| -> Result<Vec<Variant>> {
                let mut rows = self.stmt.query([])?;
                let mut batch = Vec::with_capacity(self.batch_size);
                while batch.len() < self.batch_size {
                    match rows.next()? {
                        Some(row) => {
                            let chromosome: String = row.get(0)?;
                            let position: u32 = row.get(1)?;
                            let name: String = row.get(2)?;
                            let allele1: String = row.get(3)?;
                            let allele2: String = row.get(4)?;
                            batch.push(Variant {
                                name,
                                chromosome,
                                position,
                                allele1,
                                allele2,
                            });
                        }
                        None => break,
                    }
                }
                Ok(batch)
            })();

            match fetch {
                Ok(batch) => {
                    if batch.len() < self.batch_size {
                        self.exhausted = true;
                    }
                    self.buffer = batch;
                    self.buffer_pos = 0;
                    if self.buffer.is_empty() {
                        return None;
                    }
                }
                Err(e) => return Some(Err(e)),
            }
        }

        let item = self.buffer[self.buffer_pos].clone();
        self.buffer_pos += 1;
        Some(Ok(item))
    }
}
