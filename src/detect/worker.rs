//! Single-threaded scan loop over claimed batches.
//!
//! A worker owns one [`MembershipBitset`]. It keeps claiming batches from
//! the shared [`WorkDistributor`], test-and-setting each record's key, until
//! either the distributor runs dry or it sees a key twice. On a repeat it
//! exhausts the distributor so the other workers stop early.
//!
//! A key outside `0..MAX_KEYS` can only come from a malformed code. The
//! worker stops on it and exhausts the distributor as well, leaving the
//! bitset untouched.
//!
//! ```text
//! Running --claim empty--> Exhausted
//!    |
//!    +----key repeated---> FoundDuplicate
//!    |
//!    +----key too large--> Malformed { index }
//! ```

use super::bitset::MembershipBitset;
use super::code::MAX_KEYS;
use super::distributor::{Batch, WorkDistributor};
use super::records::RecordView;
use super::ScanError;

/// Lifecycle of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Still claiming batches.
    Running,
    /// Saw a key twice within its own partition.
    FoundDuplicate,
    /// The distributor ran out of work without a repeat.
    Exhausted,
    /// Record `index` decoded to a key outside the bitset.
    Malformed {
        /// Zero-based record index
        index: usize,
    },
}

impl WorkerState {
    /// Whether the worker has stopped.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Per-worker counters, reported after the scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Batches claimed (non-empty only).
    pub batches: usize,
    /// Records decoded and tested.
    pub records: usize,
}

/// One scanning worker and its private bitset.
#[derive(Debug)]
pub struct ScanWorker {
    id: usize,
    bitset: MembershipBitset,
    state: WorkerState,
    stats: WorkerStats,
}

impl ScanWorker {
    /// Create a worker with a freshly zeroed bitset.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Allocation`] if the bitset cannot be allocated.
    pub fn new(id: usize) -> Result<Self, ScanError> {
        Ok(Self {
            id,
            bitset: MembershipBitset::new()?,
            state: WorkerState::Running,
            stats: WorkerStats::default(),
        })
    }

    /// Worker index within the scan.
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> WorkerStats {
        self.stats
    }

    /// Keys seen by this worker.
    #[must_use]
    pub fn bitset(&self) -> &MembershipBitset {
        &self.bitset
    }

    /// Claim and process batches until the worker reaches a terminal state.
    pub fn run(
        &mut self,
        records: &RecordView<'_>,
        distributor: &WorkDistributor,
        batch_size: usize,
    ) -> WorkerState {
        while !self.state.is_terminal() {
            self.step(records, distributor, batch_size);
        }
        log::trace!(
            "Worker {} finished: {:?} after {} batches / {} records",
            self.id,
            self.state,
            self.stats.batches,
            self.stats.records
        );
        self.state
    }

    /// Claim and process exactly one batch.
    ///
    /// Does nothing once the worker is in a terminal state.
    pub fn step(
        &mut self,
        records: &RecordView<'_>,
        distributor: &WorkDistributor,
        batch_size: usize,
    ) -> WorkerState {
        if self.state.is_terminal() {
            return self.state;
        }

        let batch = distributor.claim(batch_size);
        if batch.is_empty() {
            self.state = WorkerState::Exhausted;
            return self.state;
        }

        self.stats.batches += 1;
        match self.scan_batch(records, batch) {
            BatchOutcome::Clean => {}
            BatchOutcome::Repeat => {
                distributor.exhaust();
                log::debug!(
                    "Worker {} found a repeated key in batch starting at {}",
                    self.id,
                    batch.start
                );
                self.state = WorkerState::FoundDuplicate;
            }
            BatchOutcome::OutOfRange(index) => {
                distributor.exhaust();
                log::debug!("Worker {} hit a malformed record at {}", self.id, index);
                self.state = WorkerState::Malformed { index };
            }
        }
        self.state
    }

    /// Test-and-set every key in `batch`, stopping at the first repeat or
    /// out-of-range key.
    fn scan_batch(&mut self, records: &RecordView<'_>, batch: Batch) -> BatchOutcome {
        for (offset, key) in records.keys(batch.start, batch.count).enumerate() {
            if key as usize >= MAX_KEYS {
                self.stats.records += offset;
                return BatchOutcome::OutOfRange(batch.start + offset);
            }
            if self.bitset.test_and_set(key) {
                self.stats.records += offset + 1;
                return BatchOutcome::Repeat;
            }
        }
        self.stats.records += batch.count;
        BatchOutcome::Clean
    }
}

enum BatchOutcome {
    Clean,
    Repeat,
    OutOfRange(usize),
}
