//! A random-access reader for the BGEN file format: sequential iteration
//! over every variant's metadata and per-sample genotype data, plus
//! index-backed random access by variant name or genomic region.
//!
//! ```no_run
//! use bgen_reader::BgenReader;
//!
//! let mut bgen = BgenReader::open("example.bgen", "r", 0.9, false)?;
//! for record in bgen.iter_variants()? {
//!     let (variant, _data) = record?;
//!     println!("{variant}");
//! }
//! # Ok::<(), bgen_reader::BgenError>(())
//! ```

pub mod bitpack;
pub mod byte_reader;
pub mod codec;
pub mod compression;
pub mod error;
pub mod header;
pub mod index;
pub mod parallel;
pub mod reader;
pub mod variant;

pub use codec::ReturnMode;
pub use error::{BgenError, Result};
pub use header::{Header, Layout};
pub use parallel::{ParallelBgenReader, ParallelIter};
pub use reader::{BgenReader, SeekListIter, SequentialIter};
pub use variant::{DosageVector, ProbabilityMatrix, Variant, VariantData};
