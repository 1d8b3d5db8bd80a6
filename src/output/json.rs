//! JSON output formatter for check results.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "file": "codes.txt",
//!   "has_duplicates": true,
//!   "detection": { "kind": "across_partitions", "word": 7 },
//!   "record_count": 1000000,
//!   "threads_used": 3,
//!   "records_scanned": 1000000,
//!   "workers_active": 3,
//!   "elapsed_ms": 12.5,
//!   "verified": null,
//!   "exit_code": 0,
//!   "exit_code_name": "CD000"
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use super::CheckOutcome;
use crate::detect::Detection;

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// File that was checked
    pub file: String,
    /// Whether any code repeats
    pub has_duplicates: bool,
    /// Mechanism that settled the verdict
    pub detection: Detection,
    /// Records in the file
    pub record_count: usize,
    /// Worker threads used (0 when the length alone decided)
    pub threads_used: usize,
    /// Records decoded across all workers
    pub records_scanned: usize,
    /// Workers that claimed at least one batch
    pub workers_active: usize,
    /// Scan wall time in milliseconds
    pub elapsed_ms: f64,
    /// Reference agreement, when `--verify` was given
    pub verified: Option<bool>,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "CD000")
    pub exit_code_name: String,
}

impl JsonOutput {
    /// Build the JSON view of an outcome.
    #[must_use]
    pub fn new(outcome: &CheckOutcome) -> Self {
        let report = &outcome.report;
        let exit_code = outcome.exit_code();
        Self {
            file: outcome.file.display().to_string(),
            has_duplicates: report.has_duplicates,
            detection: report.detection,
            record_count: report.record_count,
            threads_used: report.threads_used,
            records_scanned: report.records_scanned,
            workers_active: report.workers_active,
            elapsed_ms: super::millis(outcome.elapsed),
            verified: outcome.verified,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty-printed JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)
    }
}
