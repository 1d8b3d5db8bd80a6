use clap::Parser;
use codedupe::cli::Cli;
use codedupe::error::ExitCode;
use codedupe::run_app;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

/// Temp directory with an empty config file, so runs ignore any user config.
fn workspace() -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "").unwrap();
    (dir, config)
}

fn write_codes(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn run(config: &Path, args: &[&str]) -> anyhow::Result<ExitCode> {
    let mut argv = vec![
        "codedupe".to_string(),
        "-q".to_string(),
        "--config".to_string(),
        config.display().to_string(),
    ];
    argv.extend(args.iter().map(|a| a.to_string()));
    run_app(Cli::try_parse_from(argv).unwrap())
}

#[test]
fn test_check_reports_duplicate() {
    let (dir, config) = workspace();
    let file = write_codes(dir.path(), "codes.txt", b"ABC123\r\nXYZ999\r\nABC123\r\n");
    let code = run(&config, &["check", file.to_str().unwrap()]).unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_check_reports_unique() {
    let (dir, config) = workspace();
    let file = write_codes(dir.path(), "codes.txt", b"ABC123\r\nABC124\r\n");
    let code = run(&config, &["check", file.to_str().unwrap()]).unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);
}

#[test]
fn test_check_parallel_with_verify_and_json() {
    let (dir, config) = workspace();
    let file = write_codes(
        dir.path(),
        "codes.txt",
        b"ABC123\r\nDEF456\r\nGHI789\r\nABC123\r\n",
    );
    let path = file.to_str().unwrap();
    let code = run(
        &config,
        &[
            "check",
            path,
            "--threads",
            "4",
            "--batch-size",
            "1",
            "--threshold",
            "0",
            "--verify",
            "--output",
            "json",
        ],
    )
    .unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_check_lf_file_without_mmap() {
    let (dir, config) = workspace();
    let file = write_codes(dir.path(), "codes.txt", b"ABC123\nABC124\nZZZ999");
    let code = run(&config, &["check", file.to_str().unwrap(), "--no-mmap", "--verify"]).unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);
}

#[test]
fn test_check_empty_file() {
    let (dir, config) = workspace();
    let file = write_codes(dir.path(), "empty.txt", b"");
    let code = run(&config, &["check", file.to_str().unwrap(), "--verify"]).unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);
}

#[test]
fn test_check_verify_agrees_with_reference() {
    let (dir, config) = workspace();
    let dup = write_codes(dir.path(), "dup.txt", b"ABC123\r\nXYZ999\r\nABC123\r\n");
    let unique = write_codes(dir.path(), "unique.txt", b"ABC123\r\nXYZ999\r\n");

    let code = run(&config, &["check", dup.to_str().unwrap(), "--verify"]).unwrap();
    assert_eq!(code, ExitCode::Success);
    let code = run(&config, &["check", unique.to_str().unwrap(), "--verify"]).unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);
}

#[test]
fn test_check_malformed_without_validate_is_an_error() {
    let (dir, config) = workspace();
    let file = write_codes(dir.path(), "codes.txt", b"abc123\r\nABC123\r\n");
    let path = file.to_str().unwrap();

    for threshold in ["600000", "0"] {
        let err = run(&config, &["check", path, "--threshold", threshold]).unwrap_err();
        assert!(format!("{err:#}").contains("Malformed record 0"));
        assert_eq!(ExitCode::from_error(&err), ExitCode::InvalidInput);
    }
}

#[test]
fn test_check_huge_batch_size() {
    let (dir, config) = workspace();
    let file = write_codes(
        dir.path(),
        "codes.txt",
        b"AAA000\r\nAAA001\r\nAAA002\r\nAAA003\r\n",
    );
    let huge = (usize::MAX / 2 + 2).to_string();
    for _ in 0..10 {
        let code = run(
            &config,
            &["check", file.to_str().unwrap(), "--batch-size", &huge, "--threshold", "0"],
        )
        .unwrap();
        assert_eq!(code, ExitCode::NoDuplicates);
    }
}

#[test]
fn test_check_validate_rejects_malformed() {
    let (dir, config) = workspace();
    let file = write_codes(dir.path(), "codes.txt", b"ABC123\r\nabc123\r\n");
    let path = file.to_str().unwrap();

    let err = run(&config, &["check", path, "--validate"]).unwrap_err();
    assert!(format!("{err:#}").contains("Malformed record 1"));
}

#[test]
fn test_check_misaligned_file() {
    let (dir, config) = workspace();
    let file = write_codes(dir.path(), "codes.txt", b"ABC123\r\nAB");
    let err = run(&config, &["check", file.to_str().unwrap()]).unwrap_err();
    assert!(format!("{err:#}").contains("not a multiple"));
    assert_eq!(ExitCode::from_error(&err), ExitCode::InvalidInput);
}

#[test]
fn test_check_missing_file() {
    let (dir, config) = workspace();
    let missing = dir.path().join("missing.txt");
    let err = run(&config, &["check", missing.to_str().unwrap()]).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to open"));
}

#[test]
fn test_check_rejects_zero_threads() {
    let (dir, config) = workspace();
    let file = write_codes(dir.path(), "codes.txt", b"ABC123\r\n");
    let err = run(&config, &["check", file.to_str().unwrap(), "--threads", "0"]).unwrap_err();
    assert_eq!(ExitCode::from_error(&err), ExitCode::GeneralError);
}

#[test]
fn test_config_file_settings_apply() {
    let (dir, config) = workspace();
    fs::write(&config, "line_ending = \"lf\"\n").unwrap();
    // CRLF content read with a forced LF layout is misaligned.
    let file = write_codes(dir.path(), "codes.txt", b"ABC123\r\nABC124\r\n");
    assert!(run(&config, &["check", file.to_str().unwrap()]).is_err());
    // The CLI flag wins over the file.
    let code = run(
        &config,
        &["check", file.to_str().unwrap(), "--line-ending", "crlf"],
    )
    .unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);
}

#[test]
fn test_bench_multiple_files() {
    let (dir, config) = workspace();
    let a = write_codes(dir.path(), "a.txt", b"ABC123\r\nABC124\r\n");
    let b = write_codes(dir.path(), "b.txt", b"ABC123\r\nABC123\r\n");
    let code = run(
        &config,
        &[
            "bench",
            a.to_str().unwrap(),
            b.to_str().unwrap(),
            "-n",
            "2",
            "--threshold",
            "0",
        ],
    )
    .unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_config_command() {
    let (_dir, config) = workspace();
    assert_eq!(run(&config, &["config"]).unwrap(), ExitCode::Success);
}
