//! Human-readable verdict output.
//!
//! ```text
//! Duplicates found
//!   codes.txt: 1000000 records, 3 threads, across partitions (word 7), 12.50 ms
//! ```
//!
//! Coloring goes through `yansi` and is switched off globally by
//! `--no-color` / `NO_COLOR`.

use yansi::Paint;

use super::{millis, CheckOutcome};

/// Text formatter for a single outcome.
#[derive(Debug, Clone, Copy)]
pub struct TextOutput<'a> {
    outcome: &'a CheckOutcome,
}

impl<'a> TextOutput<'a> {
    /// Wrap an outcome for rendering.
    #[must_use]
    pub fn new(outcome: &'a CheckOutcome) -> Self {
        Self { outcome }
    }

    /// The one-line verdict.
    #[must_use]
    pub fn headline(&self) -> String {
        if self.outcome.report.has_duplicates {
            "Duplicates found".red().bold().to_string()
        } else {
            "No duplicates".green().bold().to_string()
        }
    }

    /// Scan details below the verdict.
    #[must_use]
    pub fn details(&self) -> String {
        let report = &self.outcome.report;
        let mut line = format!(
            "{}: {} records, {} threads, {}, {:.2} ms",
            self.outcome.file.display(),
            report.record_count,
            report.threads_used,
            report.detection,
            millis(self.outcome.elapsed)
        );
        match self.outcome.verified {
            Some(true) => line.push_str(", verified"),
            Some(false) => line.push_str(", REFERENCE DISAGREES"),
            None => {}
        }
        line
    }

    /// Headline and dimmed details.
    #[must_use]
    pub fn render(&self) -> String {
        format!("{}\n  {}", self.headline(), self.details().dim())
    }
}
