//! Batch-based work distribution over record indices.
//!
//! All workers of one scan share a single cursor. Each claim advances the
//! cursor by a whole batch in one atomic update, so claimed ranges are
//! disjoint and increase monotonically. A worker that proves a duplicate
//! pushes the cursor far past the end so everyone else stops claiming.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Cursor value past which no claim can ever yield work.
const EXHAUSTED: usize = usize::MAX / 2;

/// A contiguous range of record indices claimed by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch {
    /// First record index in the batch.
    pub start: usize,
    /// Number of records in the batch; zero means no work is left.
    pub count: usize,
}

impl Batch {
    /// Whether the claim came back empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Shared cursor handing out disjoint batches of record indices.
#[derive(Debug)]
pub struct WorkDistributor {
    cursor: AtomicUsize,
    total: usize,
}

impl WorkDistributor {
    /// Create a distributor over records `0..total`.
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            cursor: AtomicUsize::new(0),
            total,
        }
    }

    /// Total number of records being distributed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Claim up to `batch_size` records.
    ///
    /// Returns an empty batch once the cursor has passed the end, either
    /// because all records were handed out or because of [`exhaust`].
    ///
    /// [`exhaust`]: Self::exhaust
    pub fn claim(&self, batch_size: usize) -> Batch {
        // Relaxed: the cursor only partitions indices, it publishes no data.
        // Saturating, so a huge batch size can never wrap the cursor back
        // into ranges already handed out.
        let start = self
            .cursor
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |c| {
                Some(c.saturating_add(batch_size))
            })
            .unwrap_or_else(|prev| prev);
        if start >= self.total {
            return Batch { start, count: 0 };
        }
        Batch {
            start,
            count: batch_size.min(self.total - start),
        }
    }

    /// Stop handing out work. Batches already claimed are unaffected.
    pub fn exhaust(&self) {
        self.cursor.fetch_max(EXHAUSTED, Ordering::Relaxed);
    }

    /// Whether every further claim will come back empty.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.cursor.load(Ordering::Relaxed) >= self.total
    }
}
