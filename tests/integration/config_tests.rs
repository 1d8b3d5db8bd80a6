use codedupe::cli::LineEndingArg;
use codedupe::config::{Config, ConfigError, ENV_PREFIX};
use figment::providers::{Env, Serialized};
use figment::Figment;
use std::fs;
use std::sync::Mutex;
use tempfile::tempdir;

// Serializes tests that touch process-wide environment variables.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

#[test]
fn test_config_load_defaults() {
    let figment = Figment::from(Serialized::defaults(Config::default()));
    let config: Config = figment.extract().unwrap();
    assert_eq!(config.threads, 3);
    assert_eq!(config.batch_size, 4096);
    assert_eq!(config.single_threaded_threshold, 600_000);
    assert_eq!(config.line_ending, LineEndingArg::Auto);
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
threads = 6
single_threaded_threshold = 1000
line_ending = "lf"
mmap = false
"#,
    )
    .unwrap();

    let _lock = ENV_MUTEX.lock().unwrap();
    let config = Config::load(Some(&config_path)).unwrap();
    assert_eq!(config.threads, 6);
    assert_eq!(config.single_threaded_threshold, 1000);
    assert_eq!(config.line_ending, LineEndingArg::Lf);
    assert!(!config.mmap);
    // Unset keys keep their defaults
    assert_eq!(config.batch_size, 4096);
}

#[test]
fn test_config_load_from_env() {
    let _lock = ENV_MUTEX.lock().unwrap();
    std::env::set_var("CODEDUPE_THREADS", "16");
    std::env::set_var("CODEDUPE_BATCH_SIZE", "512");

    let figment =
        Figment::from(Serialized::defaults(Config::default())).merge(Env::prefixed(ENV_PREFIX));
    let config: Config = figment.extract().unwrap();

    std::env::remove_var("CODEDUPE_THREADS");
    std::env::remove_var("CODEDUPE_BATCH_SIZE");

    assert_eq!(config.threads, 16);
    assert_eq!(config.batch_size, 512);
}

#[test]
fn test_env_overrides_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "threads = 6\nbatch_size = 100\n").unwrap();

    let _lock = ENV_MUTEX.lock().unwrap();
    std::env::set_var("CODEDUPE_THREADS", "2");
    let config = Config::load(Some(&config_path));
    std::env::remove_var("CODEDUPE_THREADS");

    let config = config.unwrap();
    assert_eq!(config.threads, 2);
    assert_eq!(config.batch_size, 100);
}

#[test]
fn test_invalid_toml_value() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "threads = \"many\"\n").unwrap();

    let _lock = ENV_MUTEX.lock().unwrap();
    let result = Config::load(Some(&config_path));
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_missing_config_file() {
    let temp_dir = tempdir().unwrap();
    let result = Config::load(Some(&temp_dir.path().join("absent.toml")));
    match result {
        Err(ConfigError::NotFound(path)) => assert!(path.ends_with("absent.toml")),
        other => panic!("Expected NotFound, got {:?}", other),
    }
}
