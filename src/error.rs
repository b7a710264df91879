//! Error kinds produced while parsing and decoding BGEN files.

use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, BgenError>;

#[derive(Debug, Error)]
pub enum BgenError {
    #[error("{path}: invalid BGEN header ({reason})")]
    InvalidHeader { path: PathBuf, reason: String },

    #[error("{path}: invalid variant block ({reason})")]
    InvalidBlock { path: PathBuf, reason: String },

    #[error("{path}: unsupported variant ({reason})")]
    UnsupportedVariant { path: PathBuf, reason: String },

    #[error("zstandard compression requested but the zstd backend is unavailable")]
    UnsupportedCompression,

    #[error("{0}: no such file (sidecar index missing)")]
    MissingIndex(PathBuf),

    #[error("{0}: name not found")]
    UnknownVariant(String),

    #[error("{path}: truncated file, expected {expected} bytes, got {actual}")]
    TruncatedFile {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    #[error("invalid open mode: '{0}'")]
    UnsupportedMode(String),

    #[error("'w' mode is not yet implemented")]
    NotImplemented,

    #[error("I/O error on {path}")]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("sidecar index error")]
    Index(#[from] rusqlite::Error),
}
