//! CodeDupe - Parallel Duplicate Code Detector
//!
//! Decides whether a file of fixed-width records (three uppercase letters and
//! three digits per line) contains any code more than once. Every possible
//! code maps to one bit of a 17,576,000-bit membership set; large files are
//! split across worker threads that claim batches from a shared cursor and
//! fill private bitsets, which are intersected once all workers finish.

pub mod bench;
pub mod cli;
pub mod config;
pub mod detect;
pub mod error;
pub mod input;
pub mod logging;
pub mod output;

use std::io::{self, Write};
use std::time::Instant;

use anyhow::{Context, Result};

use crate::cli::{BenchArgs, CheckArgs, Cli, Commands, OutputFormat};
use crate::config::Config;
use crate::detect::{reference, RecordView, ScanOrchestrator};
use crate::error::ExitCode;
use crate::input::RecordFile;
use crate::output::{CheckOutcome, JsonOutput, TextOutput};

/// Run the application for parsed command-line arguments.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded, a record file cannot
/// be opened or is malformed, or the engine fails to allocate.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Check(args) => handle_check(args, config),
        Commands::Bench(args) => handle_bench(args, config),
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(ExitCode::Success)
        }
    }
}

fn handle_check(args: CheckArgs, mut config: Config) -> Result<ExitCode> {
    config.apply_overrides(&args.scan);
    if args.validate {
        config.validate = true;
    }

    let file = RecordFile::open(&args.file, &config.file_options())
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    let orchestrator = ScanOrchestrator::new(config.scan_config(file.layout()))
        .context("Invalid scan configuration")?;

    log::info!(
        "Checking {} ({} records, {}-byte records)",
        args.file.display(),
        file.record_count(),
        file.layout().width()
    );

    if config.validate && file.is_loaded() {
        RecordView::new(file.bytes(), file.record_count(), file.layout())?
            .validate()
            .with_context(|| format!("Malformed record in {}", args.file.display()))?;
        log::debug!("All {} records are well formed", file.record_count());
    }

    let start = Instant::now();
    let report = orchestrator
        .scan(file.bytes(), file.record_count())
        .with_context(|| format!("Failed to scan {}", args.file.display()))?;
    let elapsed = start.elapsed();
    log::debug!("Scan finished in {:?}: {}", elapsed, report.detection);

    let mut outcome = CheckOutcome::new(args.file.clone(), report, elapsed);
    if args.verify {
        if file.is_loaded() {
            let view = RecordView::new(file.bytes(), file.record_count(), file.layout())?;
            let expected = reference::has_duplicates(&view);
            let agreed = expected == outcome.report.has_duplicates;
            if !agreed {
                log::error!(
                    "Reference disagrees: bitset says {}, reference says {}",
                    outcome.report.has_duplicates,
                    expected
                );
            }
            outcome = outcome.with_verified(agreed);
        } else {
            log::info!("File decided by length alone; nothing to verify");
        }
    }

    match args.output {
        OutputFormat::Text => println!("{}", TextOutput::new(&outcome).render()),
        OutputFormat::Json => JsonOutput::new(&outcome)
            .write_to(io::stdout().lock())
            .context("Failed to write JSON output")?,
    }

    Ok(outcome.exit_code())
}

fn handle_bench(args: BenchArgs, mut config: Config) -> Result<ExitCode> {
    config.apply_overrides(&args.scan);
    let options = config.file_options();

    let mut all_agreed = true;
    let mut stdout = io::stdout().lock();
    for path in &args.files {
        let file = RecordFile::open(path, &options)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let result = bench::bench_file(&file, config.scan_config(file.layout()), args.iterations)
            .with_context(|| format!("Benchmark failed for {}", path.display()))?;
        writeln!(stdout, "{}", result.summary())?;
        all_agreed &= result.agreed;
    }

    Ok(if all_agreed {
        ExitCode::Success
    } else {
        ExitCode::VerificationFailed
    })
}
