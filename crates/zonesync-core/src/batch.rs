//! Bounded batches for bulk API operations
//!
//! Bulk endpoints accept a limited number of items per request. Work is
//! partitioned into [`Batch`]es that are submitted one after another; a batch
//! is never split further once formed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;

/// Default maximum number of items per bulk request
pub const DEFAULT_BATCH_SIZE: usize = 200;

/// What a batch does at the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchKind {
    /// Bulk delete of existing records
    Delete,
    /// Bulk create of new records
    Create,
}

impl fmt::Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchKind::Delete => f.write_str("delete"),
            BatchKind::Create => f.write_str("create"),
        }
    }
}

/// An ordered group of at most `batch_size` items
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch<T> {
    /// Position of this batch within its partition (0-based)
    pub index: usize,
    /// The items, in their original relative order
    pub items: Vec<T>,
}

impl<T> Batch<T> {
    /// Number of items in the batch
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the batch has no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Summary of this batch for reporting
    pub fn summary(&self, kind: BatchKind) -> BatchSummary {
        BatchSummary {
            kind,
            index: self.index,
            size: self.items.len(),
        }
    }
}

/// Lightweight description of a batch, used in reports and errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Delete or create
    pub kind: BatchKind,
    /// Index within batches of the same kind
    pub index: usize,
    /// Number of items submitted
    pub size: usize,
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{} ({} items)", self.kind, self.index, self.size)
    }
}

/// Split `items` into consecutive batches of at most `size` items.
///
/// Produces `ceil(len / size)` batches; concatenating them yields `items`
/// in the original order. An empty input yields no batches.
pub fn partition<T: Clone>(items: &[T], size: NonZeroUsize) -> Vec<Batch<T>> {
    items
        .chunks(size.get())
        .enumerate()
        .map(|(index, chunk)| Batch {
            index,
            items: chunk.to_vec(),
        })
        .collect()
}

/// Tracks which batches of an apply have been committed.
///
/// Providers feed it as they submit batches so a mid-sequence failure can be
/// reported with exact progress.
#[derive(Debug, Default, Clone)]
pub struct BatchProgress {
    applied: Vec<BatchSummary>,
    pending: Vec<BatchSummary>,
}

impl BatchProgress {
    /// Create a tracker expecting the given batches, in submission order
    pub fn new(planned: Vec<BatchSummary>) -> Self {
        Self {
            applied: Vec::new(),
            pending: planned,
        }
    }

    /// Mark the next pending batch as committed
    pub fn mark_applied(&mut self) {
        if !self.pending.is_empty() {
            let done = self.pending.remove(0);
            self.applied.push(done);
        }
    }

    /// Batches committed so far
    pub fn applied(&self) -> &[BatchSummary] {
        &self.applied
    }

    /// Batches not yet committed
    pub fn pending(&self) -> &[BatchSummary] {
        &self.pending
    }

    /// Convert into a partial-apply error: the next pending batch failed
    pub fn into_partial_error(self, zone: impl Into<String>, source: crate::Error) -> crate::Error {
        let mut pending = self.pending.into_iter();
        match pending.next() {
            Some(failed) => crate::Error::PartialApply {
                zone: zone.into(),
                applied: self.applied,
                failed,
                not_attempted: pending.collect(),
                source: Box::new(source),
            },
            // Failure outside of any batch submission
            None => source,
        }
    }

    /// Consume the tracker, returning committed batches
    pub fn into_applied(self) -> Vec<BatchSummary> {
        self.applied
    }
}
