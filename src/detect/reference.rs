//! Sort-based reference check.
//!
//! Decodes every key, sorts, and looks for equal neighbours. Far slower
//! than the bitset engine, but simple enough to trust as an oracle in tests,
//! `--verify` runs and benchmarks.

use rayon::prelude::*;

use super::records::RecordView;

/// Whether any key in `records` occurs twice, by sorting.
#[must_use]
pub fn has_duplicates(records: &RecordView<'_>) -> bool {
    let mut keys: Vec<u32> = records.keys(0, records.len()).collect();
    keys.par_sort_unstable();
    keys.windows(2).any(|pair| pair[0] == pair[1])
}
