//! Configuration resolution and graceful degradation
//!
//! Tests that manipulate BLOSSOM_ROOT_FOLDER are marked #[serial] so they do not
//! race each other over the process environment.

use blossom_common::config::{
    CompiledDefaults, RootFolderInitializer, RootFolderResolver, ServiceConfig, TomlConfig, CONFIG_FILE_ENV,
    DEFAULT_API_PORT, DEFAULT_WEB_PORT, ROOT_FOLDER_ENV,
};
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};

#[test]
fn test_compiled_defaults() {
    let defaults = CompiledDefaults::for_current_platform();
    assert!(!defaults.root_folder.as_os_str().is_empty());
    assert_eq!(defaults.log_level, "info");
    assert_eq!(defaults.api_port, DEFAULT_API_PORT);
    assert_eq!(defaults.web_port, DEFAULT_WEB_PORT);
}

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let root_folder = RootFolderResolver::new(TomlConfig::default()).resolve();
    assert_eq!(root_folder, CompiledDefaults::for_current_platform().root_folder);
}

#[test]
#[serial]
fn test_resolver_env_var() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/blossom-test-env-folder");

    let root_folder = RootFolderResolver::new(TomlConfig::default()).resolve();
    assert_eq!(root_folder, PathBuf::from("/tmp/blossom-test-env-folder"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_resolver_cli_beats_env_and_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/blossom-from-env");
    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/blossom-from-toml")),
        ..TomlConfig::default()
    };

    let resolved = RootFolderResolver::new(toml.clone())
        .with_cli_arg(Some(PathBuf::from("/tmp/blossom-from-cli")))
        .resolve();
    assert_eq!(resolved, PathBuf::from("/tmp/blossom-from-cli"));

    // Environment beats TOML
    let resolved = RootFolderResolver::new(toml.clone()).resolve();
    assert_eq!(resolved, PathBuf::from("/tmp/blossom-from-env"));

    env::remove_var(ROOT_FOLDER_ENV);
    let resolved = RootFolderResolver::new(toml).resolve();
    assert_eq!(resolved, PathBuf::from("/tmp/blossom-from-toml"));
}

#[test]
fn test_toml_parsing() {
    let config = TomlConfig::from_toml_str(
        r#"
        root_folder = "/srv/blossom"
        log_level = "debug"
        api_port = 9000
        "#,
    )
    .unwrap();

    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/blossom")));
    assert_eq!(config.log_level.as_deref(), Some("debug"));
    assert_eq!(config.api_port, Some(9000));
    assert_eq!(config.web_port, None);
}

#[test]
fn test_malformed_toml_is_an_error() {
    assert!(TomlConfig::from_toml_str("api_port = \"not a number\"").is_err());
}

#[test]
fn test_toml_file_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "web_port = 8500\n").unwrap();

    let config = TomlConfig::load(&path).unwrap();
    assert_eq!(config.web_port, Some(8500));

    assert!(TomlConfig::load(&dir.path().join("missing.toml")).is_err());
}

#[test]
#[serial]
fn test_service_config_port_priority() {
    env::remove_var(ROOT_FOLDER_ENV);
    let toml = TomlConfig {
        api_port: Some(9100),
        bind_address: Some("0.0.0.0".to_string()),
        ..TomlConfig::default()
    };

    let from_toml = ServiceConfig::resolve(
        Some(Path::new("/tmp/blossom-svc")),
        None,
        &toml,
        |t| t.api_port,
        DEFAULT_API_PORT,
    );
    assert_eq!(from_toml.port, 9100);
    assert_eq!(from_toml.socket_address(), "0.0.0.0:9100");
    assert_eq!(from_toml.root_folder, PathBuf::from("/tmp/blossom-svc"));

    let from_cli = ServiceConfig::resolve(None, Some(7000), &toml, |t| t.api_port, DEFAULT_API_PORT);
    assert_eq!(from_cli.port, 7000);

    let fallback = ServiceConfig::resolve(None, None, &toml, |t| t.web_port, DEFAULT_WEB_PORT);
    assert_eq!(fallback.port, DEFAULT_WEB_PORT);
}

#[test]
fn test_initializer_creates_directory_idempotently() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("nested").join("root");

    let initializer = RootFolderInitializer::new(root.clone());
    initializer.ensure_directory_exists().unwrap();
    initializer.ensure_directory_exists().unwrap();

    assert!(root.is_dir());
    assert_eq!(initializer.database_path(), root.join("blossom.db"));
    assert!(!initializer.database_exists());
}

#[test]
#[serial]
fn test_config_env_var_selects_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "log_level = \"debug\"\napi_port = 9100\n").unwrap();
    env::set_var(CONFIG_FILE_ENV, &path);

    let config = TomlConfig::discover().unwrap();
    assert_eq!(config.log_level.as_deref(), Some("debug"));
    assert_eq!(config.api_port, Some(9100));

    // A malformed file degrades to defaults
    std::fs::write(&path, "api_port = [").unwrap();
    assert!(TomlConfig::discover().is_err());
    assert_eq!(TomlConfig::load_or_default(), TomlConfig::default());

    env::remove_var(CONFIG_FILE_ENV);
}
