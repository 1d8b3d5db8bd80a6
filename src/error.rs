//! Structured error handling and exit codes.

use serde::Serialize;

use crate::detect::ScanError;
use crate::input::InputError;

/// Exit codes for the CodeDupe application.
///
/// - 0: Success (completed normally; for `check`, duplicates were found)
/// - 1: General error (unexpected failure)
/// - 2: No duplicates found (completed normally)
/// - 3: Verification failed (engine and reference disagree)
/// - 4: Invalid input (record file unreadable, misaligned or malformed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: completed normally, and for `check` at least one code repeats.
    Success = 0,
    /// An unexpected error occurred.
    GeneralError = 1,
    /// Scan completed and every code is distinct.
    NoDuplicates = 2,
    /// The bitset verdict did not match the sort-based reference.
    VerificationFailed = 3,
    /// The record file could not be read or does not hold valid records.
    InvalidInput = 4,
}

impl ExitCode {
    /// Exit code for a verdict.
    #[must_use]
    pub fn from_verdict(has_duplicates: bool) -> Self {
        if has_duplicates {
            Self::Success
        } else {
            Self::NoDuplicates
        }
    }

    /// Exit code for a failed run, from the first recognised cause.
    ///
    /// Input problems map to [`InvalidInput`](Self::InvalidInput); anything
    /// else is a [`GeneralError`](Self::GeneralError).
    #[must_use]
    pub fn from_error(err: &anyhow::Error) -> Self {
        let bad_input = err.chain().any(|cause| {
            cause.is::<InputError>()
                || matches!(
                    cause.downcast_ref::<ScanError>(),
                    Some(ScanError::MalformedRecord { .. } | ScanError::BufferTooShort { .. })
                )
        });
        if bad_input {
            Self::InvalidInput
        } else {
            Self::GeneralError
        }
    }

    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "CD000",
            Self::GeneralError => "CD001",
            Self::NoDuplicates => "CD002",
            Self::VerificationFailed => "CD003",
            Self::InvalidInput => "CD004",
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "CD001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
        }
    }
}
