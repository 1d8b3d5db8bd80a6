//! Duplicate code detection engine.
//!
//! This module provides:
//! - Code decoding into dense keys ([`code`])
//! - A packed membership bitset over the whole key space ([`bitset`])
//! - Batch-based work distribution across workers ([`distributor`])
//! - The per-thread scan loop ([`worker`])
//! - Cross-partition merging of worker bitsets ([`merge`])
//! - Scan orchestration and reporting ([`scan`])
//! - A sort-based oracle for cross-checking ([`reference`])

pub mod bitset;
pub mod code;
pub mod distributor;
pub mod merge;
pub mod records;
pub mod reference;
pub mod scan;
pub mod worker;

pub use bitset::MembershipBitset;
pub use code::{decode_key, encode_key, LineEnding, RecordLayout, CODE_LEN, MAX_KEYS};
pub use distributor::{Batch, WorkDistributor};
pub use merge::BitsetMerger;
pub use records::RecordView;
pub use scan::{has_duplicates, scan, Detection, ScanConfig, ScanOrchestrator, ScanReport};
pub use worker::{ScanWorker, WorkerState, WorkerStats};

/// Errors that can occur while scanning a record buffer.
///
/// A scan error is never a verdict: "duplicate found" is reported through
/// [`ScanReport`], failures through this type.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Bitset storage could not be allocated.
    #[error("Failed to allocate {bytes} bytes of bitset storage")]
    Allocation {
        /// Bytes requested
        bytes: usize,
    },

    /// Scan parameters are unusable.
    #[error("Invalid scan configuration: {0}")]
    InvalidConfig(String),

    /// The buffer is shorter than the record count implies.
    #[error("Buffer too short: {required} bytes required, {actual} available")]
    BufferTooShort {
        /// Minimum length for the requested record count
        required: usize,
        /// Actual buffer length
        actual: usize,
    },

    /// A record does not hold a well-formed code.
    #[error("Malformed record {index}: {record:?}")]
    MalformedRecord {
        /// Zero-based record index
        index: usize,
        /// The offending code bytes, lossily decoded
        record: String,
    },

    /// The worker thread pool could not be started.
    #[error("Failed to start scan threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
