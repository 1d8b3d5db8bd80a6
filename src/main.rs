//! CodeDupe - Parallel Duplicate Code Detector
//!
//! Binary entry point. The verdict is carried by the exit code: 0 when a
//! code repeats, 2 when every code is distinct, 3 when `--verify` caught a
//! disagreement, 4 for unreadable or malformed record files, 1 otherwise.

use clap::Parser;
use codedupe::{
    cli::Cli,
    error::{ExitCode, StructuredError},
};

fn main() {
    let cli = Cli::parse();
    let json_errors = cli.json_errors;

    let code = match codedupe::run_app(cli) {
        Ok(code) => code,
        Err(err) => {
            let code = ExitCode::from_error(&err);
            report_error(&err, code, json_errors);
            code
        }
    };
    std::process::exit(code.as_i32());
}

fn report_error(err: &anyhow::Error, code: ExitCode, json: bool) {
    if json {
        match serde_json::to_string_pretty(&StructuredError::new(err, code)) {
            Ok(rendered) => {
                eprintln!("{rendered}");
                return;
            }
            Err(e) => log::warn!("Could not render error as JSON: {e}"),
        }
    }
    eprintln!("[{}] Error: {:#}", code.code_prefix(), err);
}
