//! Scan orchestration: fast path, single-threaded path, parallel path + merge.
//!
//! # Overview
//!
//! 1. **Pigeonhole**: more records than [`MAX_KEYS`] must contain a repeat;
//!    the buffer is not even looked at.
//! 2. **Single-threaded**: small inputs (or `threads == 1`) run one worker
//!    inline over the whole range as a single batch.
//! 3. **Parallel**: `threads` workers, each with a private bitset, drain one
//!    shared [`WorkDistributor`] on a per-scan rayon pool.
//! 4. **Merge**: if no worker saw a local repeat, [`BitsetMerger`] checks
//!    for keys split across partitions.
//!
//! # Example
//!
//! ```
//! use codedupe::detect::{ScanConfig, ScanOrchestrator};
//!
//! let buf = b"ABC123\r\nABD456\r\nABC123\r\n";
//! let orchestrator = ScanOrchestrator::new(ScanConfig::default()).unwrap();
//! let report = orchestrator.scan(buf, 3).unwrap();
//! assert!(report.has_duplicates);
//! ```

use bytesize::ByteSize;
use serde::Serialize;

use super::bitset::MembershipBitset;
use super::code::{RecordLayout, MAX_KEYS};
use super::distributor::WorkDistributor;
use super::merge::BitsetMerger;
use super::records::RecordView;
use super::worker::{ScanWorker, WorkerState};
use super::ScanError;

/// Default number of worker threads.
pub const DEFAULT_THREADS: usize = 3;

/// Default records per claimed batch.
pub const DEFAULT_BATCH_SIZE: usize = 4096;

/// Default record count up to which the scan stays single-threaded.
pub const DEFAULT_SINGLE_THREADED_THRESHOLD: usize = 600_000;

/// Tuning and layout parameters for one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    /// Worker threads for the parallel path.
    pub threads: usize,
    /// Records per claimed batch.
    pub batch_size: usize,
    /// Inputs with at most this many records are scanned on one thread.
    pub single_threaded_threshold: usize,
    /// Record stride in the input buffer.
    pub layout: RecordLayout,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            threads: DEFAULT_THREADS,
            batch_size: DEFAULT_BATCH_SIZE,
            single_threaded_threshold: DEFAULT_SINGLE_THREADED_THRESHOLD,
            layout: RecordLayout::default(),
        }
    }
}

impl ScanConfig {
    /// Set the worker thread count.
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set the batch size.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the single-threaded threshold.
    #[must_use]
    pub fn with_single_threaded_threshold(mut self, threshold: usize) -> Self {
        self.single_threaded_threshold = threshold;
        self
    }

    /// Set the record layout.
    #[must_use]
    pub fn with_layout(mut self, layout: RecordLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Check the parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::InvalidConfig`] for a zero thread count or
    /// batch size.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.threads == 0 {
            return Err(ScanError::InvalidConfig(
                "thread count must be at least 1".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(ScanError::InvalidConfig(
                "batch size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Which mechanism settled the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Detection {
    /// More records than distinct codes.
    Pigeonhole,
    /// A worker saw the same key twice in its own partition.
    WithinPartition {
        /// Worker that found the repeat.
        worker: usize,
    },
    /// Two workers' bitsets share a key.
    AcrossPartitions {
        /// First bitset word holding a shared key.
        word: usize,
    },
    /// Every code is distinct.
    Unique,
}

impl std::fmt::Display for Detection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pigeonhole => write!(f, "pigeonhole"),
            Self::WithinPartition { worker } => write!(f, "within partition of worker {worker}"),
            Self::AcrossPartitions { word } => write!(f, "across partitions (word {word})"),
            Self::Unique => write!(f, "unique"),
        }
    }
}

/// Outcome of one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Whether any code occurs more than once.
    pub has_duplicates: bool,
    /// How the verdict was reached.
    pub detection: Detection,
    /// Records in the input.
    pub record_count: usize,
    /// Workers that took part (0 for the pigeonhole path).
    pub threads_used: usize,
    /// Records actually decoded, summed over workers.
    pub records_scanned: usize,
    /// Workers that claimed at least one batch.
    pub workers_active: usize,
}

impl ScanReport {
    fn pigeonhole(record_count: usize) -> Self {
        Self {
            has_duplicates: true,
            detection: Detection::Pigeonhole,
            record_count,
            threads_used: 0,
            records_scanned: 0,
            workers_active: 0,
        }
    }
}

/// Runs scans with a fixed configuration.
#[derive(Debug, Clone)]
pub struct ScanOrchestrator {
    config: ScanConfig,
}

impl ScanOrchestrator {
    /// Create an orchestrator after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::InvalidConfig`] if the configuration is unusable.
    pub fn new(config: ScanConfig) -> Result<Self, ScanError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan `record_count` records in `buffer` for a repeated code.
    ///
    /// Every call allocates fresh bitsets; nothing carries over between
    /// scans.
    ///
    /// # Errors
    ///
    /// - [`ScanError::BufferTooShort`] if `buffer` cannot hold the records
    /// - [`ScanError::Allocation`] if a bitset cannot be allocated
    /// - [`ScanError::ThreadPool`] if the worker pool cannot be started
    /// - [`ScanError::MalformedRecord`] if a record decodes to a key outside
    ///   `0..MAX_KEYS`
    ///
    /// Malformed codes that happen to decode inside the key range are not
    /// caught here; run [`RecordView::validate`] first for untrusted input.
    pub fn scan(&self, buffer: &[u8], record_count: usize) -> Result<ScanReport, ScanError> {
        if record_count > MAX_KEYS {
            log::debug!(
                "{} records exceed the {} possible codes, skipping scan",
                record_count,
                MAX_KEYS
            );
            return Ok(ScanReport::pigeonhole(record_count));
        }

        let records = RecordView::new(buffer, record_count, self.config.layout)?;

        if record_count <= self.config.single_threaded_threshold || self.config.threads == 1 {
            self.scan_single(&records)
        } else {
            self.scan_parallel(&records)
        }
    }

    fn scan_single(&self, records: &RecordView<'_>) -> Result<ScanReport, ScanError> {
        log::debug!("Scanning {} records on one thread", records.len());

        let mut worker = ScanWorker::new(0)?;
        let distributor = WorkDistributor::new(records.len());
        let state = worker.run(records, &distributor, records.len().max(1));

        let detection = match state {
            WorkerState::Malformed { index } => return Err(malformed(records, index)),
            WorkerState::FoundDuplicate => Detection::WithinPartition { worker: 0 },
            _ => Detection::Unique,
        };
        Ok(ScanReport {
            has_duplicates: state == WorkerState::FoundDuplicate,
            detection,
            record_count: records.len(),
            threads_used: 1,
            records_scanned: worker.stats().records,
            workers_active: usize::from(worker.stats().batches > 0),
        })
    }

    fn scan_parallel(&self, records: &RecordView<'_>) -> Result<ScanReport, ScanError> {
        let threads = self.config.threads;
        let batch_size = self.config.batch_size;

        log::debug!(
            "Scanning {} records on {} threads in batches of {} ({} of bitsets)",
            records.len(),
            threads,
            batch_size,
            ByteSize::b((threads * MembershipBitset::storage_bytes()) as u64)
        );

        let mut workers = (0..threads)
            .map(ScanWorker::new)
            .collect::<Result<Vec<_>, _>>()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("codedupe-scan-{i}"))
            .build()?;

        let distributor = WorkDistributor::new(records.len());
        let shared = &distributor;
        let view = *records;
        pool.scope(|scope| {
            for worker in workers.iter_mut() {
                scope.spawn(move |_| {
                    worker.run(&view, shared, batch_size);
                });
            }
        });

        if let Some(index) = workers.iter().find_map(|w| match w.state() {
            WorkerState::Malformed { index } => Some(index),
            _ => None,
        }) {
            return Err(malformed(records, index));
        }

        let records_scanned = workers.iter().map(|w| w.stats().records).sum();
        let workers_active = workers.iter().filter(|w| w.stats().batches > 0).count();
        log::debug!("{} of {} workers claimed work", workers_active, threads);
        let mut report = ScanReport {
            has_duplicates: false,
            detection: Detection::Unique,
            record_count: records.len(),
            threads_used: threads,
            records_scanned,
            workers_active,
        };

        if let Some(worker) = workers
            .iter()
            .find(|w| w.state() == WorkerState::FoundDuplicate)
        {
            report.has_duplicates = true;
            report.detection = Detection::WithinPartition {
                worker: worker.id(),
            };
            return Ok(report);
        }

        let bitsets: Vec<&MembershipBitset> = workers.iter().map(ScanWorker::bitset).collect();
        if let Some(word) = BitsetMerger::first_shared_word(&bitsets) {
            log::debug!("Merge found a key shared across partitions in word {}", word);
            report.has_duplicates = true;
            report.detection = Detection::AcrossPartitions { word };
        }
        Ok(report)
    }
}

fn malformed(records: &RecordView<'_>, index: usize) -> ScanError {
    ScanError::MalformedRecord {
        index,
        record: String::from_utf8_lossy(records.code(index)).into_owned(),
    }
}

/// One-shot scan with `config`.
///
/// # Errors
///
/// See [`ScanOrchestrator::new`] and [`ScanOrchestrator::scan`].
pub fn scan(
    buffer: &[u8],
    record_count: usize,
    config: &ScanConfig,
) -> Result<ScanReport, ScanError> {
    ScanOrchestrator::new(*config)?.scan(buffer, record_count)
}

/// Scan with explicit parameters and the default 8-byte record layout.
///
/// # Errors
///
/// See [`ScanOrchestrator::scan`]; also [`ScanError::InvalidConfig`].
pub fn has_duplicates(
    buffer: &[u8],
    record_count: usize,
    thread_count: usize,
    batch_size: usize,
    single_threaded_threshold: usize,
) -> Result<bool, ScanError> {
    let config = ScanConfig::default()
        .with_threads(thread_count)
        .with_batch_size(batch_size)
        .with_single_threaded_threshold(single_threaded_threshold);
    Ok(ScanOrchestrator::new(config)?
        .scan(buffer, record_count)?
        .has_duplicates)
}
