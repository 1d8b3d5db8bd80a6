//! Command-line interface definitions for CodeDupe.
//!
//! This module defines all CLI arguments, subcommands, and options using the clap derive API.
//! Global options (verbosity, color, config file) apply to every subcommand.
//!
//! # Example
//!
//! ```bash
//! # Check a record file for duplicate codes
//! codedupe check codes.txt
//!
//! # Check with 8 worker threads and JSON output
//! codedupe check codes.txt --threads 8 --output json
//!
//! # Cross-check the verdict against the sort-based reference
//! codedupe check codes.txt --verify
//!
//! # Time the engine against the reference over several files
//! codedupe bench Rgn00.txt Rgn01.txt Rgn02.txt --iterations 4
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::detect::LineEnding;

/// Upper bound for `bench --iterations`.
pub const MAX_ITERATIONS: u64 = 1_000_000;

/// Parallel bitset duplicate detector for fixed-format code files.
///
/// Each record is three uppercase letters and three digits followed by a
/// line ending. CodeDupe reports whether any code occurs more than once.
#[derive(Debug, Parser)]
#[command(name = "codedupe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Report errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for CodeDupe.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check a record file for duplicate codes
    Check(CheckArgs),
    /// Time the bitset engine against the sort-based reference
    Bench(BenchArgs),
    /// Print the effective configuration as TOML
    Config,
}

/// Scan tuning shared by `check` and `bench`.
///
/// Every option left unset falls back to the configuration file,
/// environment, or built-in default.
#[derive(Debug, Clone, Default, Args)]
pub struct ScanArgs {
    /// Number of worker threads for large files
    #[arg(short, long, value_name = "N")]
    pub threads: Option<usize>,

    /// Records claimed per batch by each worker
    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Record count up to which the scan stays single-threaded
    #[arg(long, value_name = "N")]
    pub threshold: Option<usize>,

    /// Line ending of the record file
    #[arg(long, value_enum, value_name = "ENDING")]
    pub line_ending: Option<LineEndingArg>,

    /// Read the file into memory instead of memory-mapping it
    #[arg(long)]
    pub no_mmap: bool,
}

/// Arguments for the check subcommand.
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Record file to check
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[command(flatten)]
    pub scan: ScanArgs,

    /// Reject files containing malformed codes before scanning
    #[arg(long)]
    pub validate: bool,

    /// Cross-check the verdict with the sort-based reference
    #[arg(long)]
    pub verify: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the bench subcommand.
#[derive(Debug, Args)]
pub struct BenchArgs {
    /// Record files to time
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Timed runs per file and algorithm
    #[arg(
        short = 'n',
        long,
        value_name = "N",
        default_value = "4",
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..=MAX_ITERATIONS)
    )]
    pub iterations: usize,

    #[command(flatten)]
    pub scan: ScanArgs,
}

/// Output format for check results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable verdict
    Text,
    /// JSON report for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Line ending selection, including automatic detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEndingArg {
    /// Infer from the first record
    #[default]
    Auto,
    /// Windows line endings (8-byte records)
    Crlf,
    /// Unix line endings (7-byte records)
    Lf,
}

impl LineEndingArg {
    /// The fixed line ending, or `None` for automatic detection.
    #[must_use]
    pub fn to_line_ending(self) -> Option<LineEnding> {
        match self {
            Self::Auto => None,
            Self::Crlf => Some(LineEnding::Crlf),
            Self::Lf => Some(LineEnding::Lf),
        }
    }
}
