//! Config load, defaults and override behaviour.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use marped_core::{config::config_path_at, Config, ConfigError};
use tempfile::TempDir;

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn missing_config_file_yields_defaults() {
    let home = TempDir::new().expect("home");
    let config = Config::default().finish(home.path(), no_env);

    assert_eq!(config.engine_dir, home.path().join(".marped").join("engine"));
    assert_eq!(config.pack_blacklist, vec![".particify.de".to_string()]);
    assert_eq!(config.debounce(), Duration::from_millis(300));
    assert_eq!(config.marp_program, None);
}

#[test]
fn partial_yaml_keeps_remaining_defaults() {
    let home = TempDir::new().expect("home");
    let path = config_path_at(home.path());
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(&path, "engine_dir: /srv/marp-engine\ndebounce_ms: 50\n").expect("write");

    let config = Config::load_at(home.path()).expect("load");

    assert_eq!(config.engine_dir, PathBuf::from("/srv/marp-engine"));
    assert_eq!(config.debounce_ms, 50);
    assert_eq!(config.node_program, "node");
    assert_eq!(config.engine_script(), PathBuf::from("/srv/marp-engine/engine.js"));
    assert_eq!(config.themes_dir(), PathBuf::from("/srv/marp-engine/themes"));
}

#[test]
fn corrupt_yaml_reports_path() {
    let home = TempDir::new().expect("home");
    let path = config_path_at(home.path());
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(&path, "debounce_ms: [not, a, number\n").expect("write");

    let err = Config::load_at(home.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("config.yaml"));
}

#[test]
fn environment_overrides_win_over_file() {
    let home = TempDir::new().expect("home");
    let config = Config {
        engine_dir: PathBuf::from("/from/file"),
        ..Config::default()
    }
    .finish(home.path(), |key| match key {
        "MARPED_ENGINE_DIR" => Some("/from/env".to_string()),
        "MARPED_MARP" => Some("/usr/local/bin/marp".to_string()),
        _ => None,
    });

    assert_eq!(config.engine_dir, PathBuf::from("/from/env"));
    assert_eq!(config.marp_program, Some(PathBuf::from("/usr/local/bin/marp")));
}

#[test]
fn explicit_missing_file_is_an_error() {
    let home = TempDir::new().expect("home");
    let err = Config::load_file(&home.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }), "got: {err}");
}
