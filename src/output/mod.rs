//! Output formatters for check results.
//!
//! This module provides different output formats for a verdict:
//! - Text for humans, colored when the terminal allows
//! - JSON for automation and scripting
//!
//! # Example
//!
//! ```no_run
//! use codedupe::detect::{ScanConfig, ScanOrchestrator};
//! use codedupe::output::{CheckOutcome, JsonOutput};
//! use std::path::PathBuf;
//! use std::time::Duration;
//!
//! let report = ScanOrchestrator::new(ScanConfig::default())
//!     .unwrap()
//!     .scan(b"ABC123\r\n", 1)
//!     .unwrap();
//! let outcome = CheckOutcome::new(PathBuf::from("codes.txt"), report, Duration::ZERO);
//! println!("{}", JsonOutput::new(&outcome).to_json_pretty().unwrap());
//! ```

pub mod json;
pub mod text;

use std::path::PathBuf;
use std::time::Duration;

use crate::detect::ScanReport;
use crate::error::ExitCode;

// Re-export main types
pub use json::JsonOutput;
pub use text::TextOutput;

/// Everything known about one checked file.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    /// File that was checked
    pub file: PathBuf,
    /// Engine report
    pub report: ScanReport,
    /// Wall time of the scan
    pub elapsed: Duration,
    /// Whether the reference agreed, if it was consulted
    pub verified: Option<bool>,
}

impl CheckOutcome {
    /// Outcome without a reference cross-check.
    #[must_use]
    pub fn new(file: PathBuf, report: ScanReport, elapsed: Duration) -> Self {
        Self {
            file,
            report,
            elapsed,
            verified: None,
        }
    }

    /// Record the result of a reference cross-check.
    #[must_use]
    pub fn with_verified(mut self, agreed: bool) -> Self {
        self.verified = Some(agreed);
        self
    }

    /// Exit code this outcome maps to.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        if self.verified == Some(false) {
            ExitCode::VerificationFailed
        } else {
            ExitCode::from_verdict(self.report.has_duplicates)
        }
    }
}

/// Duration as fractional milliseconds.
pub(crate) fn millis(elapsed: Duration) -> f64 {
    elapsed.as_nanos() as f64 / 1_000_000.0
}
