===== src/parallel.rs =====
//! Shards a list of variant offsets across independent worker threads, each
//! with its own file handle, merging decoded records through a bounded
//! channel.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread::JoinHandle;

use log::debug;

use crate::codec::ReturnMode;
use crate::error::Result;
use crate::reader::BgenReader;
use crate::variant::{Variant, VariantData};

const DEFAULT_MAX_VARIANTS: usize = 1000;

/// A BGEN reader that fans sequential or by-name iteration out across `cpus`
/// worker threads, each holding an independent file handle into the same
/// path. The sidecar index is only ever touched by this struct's own
/// `inner` reader, never by the workers — they are handed pre-resolved
/// offsets.
pub struct ParallelBgenReader {
    inner: BgenReader,
    cpus: usize,
    max_variants: usize,
}

impl ParallelBgenReader {
    pub fn open(
        path: impl AsRef<std::path::Path>,
        prob_threshold: f64,
        cpus: usize,
        probs_only: bool,
    ) -> Result<Self> {
        Self::open_with_capacity(path, prob_threshold, cpus, probs_only, DEFAULT_MAX_VARIANTS)
    }

    pub fn open_with_capacity(
        path: impl AsRef<std::path::Path>,
        prob_threshold: f64,
        cpus: usize,
        probs_only: bool,
        max_variants: usize,
    ) -> Result<Self> {
        let inner = BgenReader::open(path, prob_threshold, probs_only)?;
        Ok(ParallelBgenReader {
            inner,
            cpus: cpus.max(1),
            max_variants: max_variants.max(1),
        })
    }

    pub fn nb_variants(&self) -> u32 {
        self.inner.nb_variants()
    }

    pub fn nb_samples(&self) -> u32 {
        self.inner.nb_samples()
    }

    pub fn samples(&self) -> Option<&[String]> {
        self.inner.samples()
    }

    /// Iterates every variant in the file across `cpus` worker threads.
    pub fn iter_variants(&self) -> Result<ParallelIter> {
        let offsets = self.inner.all_offsets()?;
        Ok(self.spawn(offsets))
    }

    /// Iterates variants matching any of `names` across `cpus` worker
    /// threads.
    pub fn iter_variants_by_names(&self, names: &[&str]) -> Result<ParallelIter> {
        let offsets = self.inner.offsets_by_names(names)?;
        Ok(self.spawn(offsets))
    }

    fn spawn(&self, offsets: Vec<u64>) -> ParallelIter {
        let stripes: Vec<Vec<u64>> = (0..self.cpus)
            .map(|i| offsets.iter().skip(i).step_by(self.cpus).copied().collect())
            .collect();

        let (tx, rx) = mpsc::sync_channel(self.max_variants);
        let path = self.inner.path().to_path_buf();
        let prob_threshold = self.inner.prob_threshold();
        let probs_only = self.inner.return_mode() == ReturnMode::Probabilities;

        let mut handles = Vec::with_capacity(self.cpus);
        for stripe in stripes {
            let tx = tx.clone();
            let path = path.clone();
            handles.push(std::thread::spawn(move || {
                worker_loop(path, prob_threshold, probs_only, stripe, tx);
            }));
        }
        drop(tx);

        ParallelIter {
            rx: Some(rx),
            handles,
            pending_workers: self.cpus,
        }
    }
}

fn worker_loop(
    path: PathBuf,
    prob_threshold: f64,
    probs_only: bool,
    stripe: Vec<u64>,
    tx: SyncSender<Option<Result<(Variant, VariantData)>>>,
) {
    match BgenReader::open_skip_index(&path, prob_threshold, probs_only) {
        Ok(mut reader) => {
            for offset in stripe {
                let item = reader.read_seek(offset);
                if tx.send(Some(item)).is_err() {
                    // Consumer is gone; stop working this stripe.
                    return;
                }
            }
        }
        Err(e) => {
            let _ = tx.send(Some(Err(e)));
        }
    }
    let _ = tx.send(None);
}

/// Yields `(Variant, Data)` records in arrival order across stripes
/// (non-deterministic across stripes, but in offset order within a stripe)
/// until every worker's sentinel has been observed.
pub struct ParallelIter {
    rx: Option<Receiver<Option<Result<(Variant, VariantData)>>>>,
    handles: Vec<JoinHandle<()>>,
    pending_workers: usize,
}

impl Iterator for ParallelIter {
    type Item = Result<(Variant, VariantData)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.pending_workers == 0 {
                return None;
            }
            match self.rx.as_ref().expect("rx dropped before iterator").recv() {
                Ok(Some(item)) => return Some(item),
                Ok(None) => {
                    self.pending_workers -= 1;
                    continue;
                }
                Err(_) => return None,
            }
        }
    }
}

impl Drop for ParallelIter {
    fn drop(&mut self) {
        // Drop the receiver first so any outstanding `send` in a still
        // running worker fails immediately instead of blocking on a full
        // channel; joining afterwards then guarantees no worker thread
        // outlives this iterator.
        self.rx.take();
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                debug!("parallel bgen worker thread panicked");
            }
        }
    }
}


