//! Timing harness comparing the bitset engine with the sort-based reference.
//!
//! Each file is opened once, then both algorithms run `iterations` times
//! over the same bytes. Disagreements are logged as warnings and reported
//! in the result rather than treated as errors, so one bad file does not
//! hide the timings of the rest.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::detect::{reference, RecordView, ScanConfig, ScanError, ScanOrchestrator};
use crate::input::RecordFile;
use crate::output::millis;

/// Mean and best wall time over a series of runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Average run time.
    pub mean: Duration,
    /// Fastest run.
    pub min: Duration,
}

impl Timing {
    fn from_runs(runs: &[Duration]) -> Self {
        let total: Duration = runs.iter().sum();
        let mean_nanos = total.as_nanos() / runs.len().max(1) as u128;
        Self {
            mean: Duration::from_nanos(u64::try_from(mean_nanos).unwrap_or(u64::MAX)),
            min: runs.iter().copied().min().unwrap_or_default(),
        }
    }
}

/// Timings for one file.
#[derive(Debug, Clone)]
pub struct BenchResult {
    /// File that was timed
    pub file: PathBuf,
    /// Records in the file
    pub records: usize,
    /// Verdict of the bitset engine
    pub has_duplicates: bool,
    /// Bitset engine timing
    pub engine: Timing,
    /// Reference timing; `None` when the file was decided by length alone
    pub reference: Option<Timing>,
    /// Whether the reference reached the same verdict
    pub agreed: bool,
}

impl BenchResult {
    /// Human-readable summary lines.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = format!(
            "{} ({} records, {})\n  bitset:    avg {:.4} ms, best {:.4} ms",
            self.file.display(),
            self.records,
            if self.has_duplicates {
                "duplicates"
            } else {
                "no duplicates"
            },
            millis(self.engine.mean),
            millis(self.engine.min)
        );
        if let Some(reference) = self.reference {
            out.push_str(&format!(
                "\n  reference: avg {:.4} ms, best {:.4} ms",
                millis(reference.mean),
                millis(reference.min)
            ));
        }
        if !self.agreed {
            out.push_str("\n  WARNING: reference returned a different result");
        }
        out
    }
}

/// Time both algorithms over an opened file.
///
/// # Errors
///
/// Returns [`ScanError`] if the engine rejects the configuration or fails
/// to allocate.
pub fn bench_file(
    file: &RecordFile,
    config: ScanConfig,
    iterations: usize,
) -> Result<BenchResult, ScanError> {
    let iterations = iterations.max(1);
    let orchestrator = ScanOrchestrator::new(config)?;
    let bytes = file.bytes();
    let records = file.record_count();

    let mut engine_runs = Vec::with_capacity(iterations);
    let mut has_duplicates = false;
    for _ in 0..iterations {
        let start = Instant::now();
        has_duplicates = orchestrator.scan(bytes, records)?.has_duplicates;
        engine_runs.push(start.elapsed());
    }

    let mut reference_timing = None;
    let mut agreed = true;
    if file.is_loaded() || records == 0 {
        let view = RecordView::new(bytes, records, file.layout())?;
        let mut reference_runs = Vec::with_capacity(iterations);
        for _ in 0..iterations {
            let start = Instant::now();
            let expected = reference::has_duplicates(&view);
            reference_runs.push(start.elapsed());
            if expected != has_duplicates {
                agreed = false;
            }
        }
        reference_timing = Some(Timing::from_runs(&reference_runs));
    }

    if !agreed {
        log::warn!(
            "Bitset engine and reference disagree on {}",
            file.path().display()
        );
    }

    Ok(BenchResult {
        file: file.path().to_path_buf(),
        records,
        has_duplicates,
        engine: Timing::from_runs(&engine_runs),
        reference: reference_timing,
        agreed,
    })
}
