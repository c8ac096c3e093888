//! Configuration loader tests
//!
//! Tests that mutate environment variables are ignored by default:
//!
//! ```bash
//! cargo test -p svcreg-infrastructure --test unit config -- --test-threads=1 --ignored
//! ```

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use svcreg_domain::error::Error;
use svcreg_infrastructure::config::loader::validate_app_config;
use svcreg_infrastructure::config::{AppConfig, ConfigLoader};
use tempfile::TempDir;

const TEST_ENV_PREFIX: &str = "SVCREG_UNIT_TEST";

fn loader_for(dir: &TempDir) -> ConfigLoader {
    ConfigLoader::new()
        .with_config_path(dir.path().join("svcreg.toml"))
        .with_env_prefix(TEST_ENV_PREFIX)
}

fn write_config(dir: &TempDir, content: &str) {
    std::fs::write(dir.path().join("svcreg.toml"), content).unwrap();
}

/// Helper to set env var safely
fn set_env(key: &str, value: &str) {
    // SAFETY: Tests must run with --test-threads=1
    unsafe {
        env::set_var(key, value);
    }
}

/// Helper to remove env var safely
fn remove_env(key: &str) {
    // SAFETY: Tests must run with --test-threads=1
    unsafe {
        env::remove_var(key);
    }
}

#[test]
fn test_defaults_without_config_file() {
    let dir = TempDir::new().unwrap();
    let config = loader_for(&dir).load().unwrap();

    assert_eq!(config, AppConfig::default());
    assert_eq!(config.registry.provider, "json");
    assert_eq!(config.registry.location, Some(PathBuf::from("services")));
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.access.provider, "http");
    assert_eq!(
        config.manager.reload_interval(),
        Some(Duration::from_secs(120))
    );
}

#[test]
fn test_file_overrides_defaults() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        r#"
[logging]
level = "debug"
json_format = true

[registry]
provider = "sql"
url = "sqlite::memory:"
max_connections = 3
operation_timeout_secs = 2

[manager]
reload_interval_secs = 0

[access]
remote_timeout_secs = 9
"#,
    );

    let config = loader_for(&dir).load().unwrap();
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.json_format);
    assert_eq!(config.registry.provider, "sql");
    assert_eq!(config.registry.url.as_deref(), Some("sqlite::memory:"));
    assert_eq!(config.registry.max_connections, 3);
    assert_eq!(config.manager.reload_interval(), None);
    assert_eq!(config.access.remote_timeout_secs, 9);
    // Untouched keys keep their defaults
    assert_eq!(config.access.provider, "http");
}

#[test]
fn test_registry_section_converts_to_provider_config() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        r#"
[registry]
provider = "directory"
base_dn = "ou=apps,dc=corp"
operation_timeout_secs = 7
"#,
    );

    let provider = loader_for(&dir).load().unwrap().registry.to_provider_config();
    assert_eq!(provider.provider, "directory");
    assert_eq!(provider.base_dn.as_deref(), Some("ou=apps,dc=corp"));
    assert_eq!(provider.operation_timeout, Some(Duration::from_secs(7)));
}

#[test]
fn test_unknown_registry_provider_is_rejected() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "[registry]\nprovider = \"nonexistent\"\n");

    let err = loader_for(&dir).load().unwrap_err();
    assert!(matches!(err, Error::Configuration { .. }));
    assert!(err.to_string().contains("nonexistent"));
}

#[test]
fn test_invalid_log_level_is_rejected() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "[logging]\nlevel = \"chatty\"\n");

    assert!(matches!(
        loader_for(&dir).load(),
        Err(Error::Configuration { .. })
    ));
}

#[test]
fn test_malformed_file_is_a_configuration_error() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "[registry]\nmax_connections = \"many\"\n");

    assert!(matches!(
        loader_for(&dir).load(),
        Err(Error::Configuration { .. })
    ));
}

#[test]
fn test_validation_rules() {
    let mut config = AppConfig::default();
    config.registry.location = None;
    assert!(validate_app_config(&config).is_err());

    let mut config = AppConfig::default();
    config.registry.provider = "memory".to_string();
    config.registry.location = None;
    assert!(validate_app_config(&config).is_ok());

    let mut config = AppConfig::default();
    config.registry.max_connections = 0;
    assert!(validate_app_config(&config).is_err());

    let mut config = AppConfig::default();
    config.access.provider = "carrier-pigeon".to_string();
    assert!(validate_app_config(&config).is_err());

    let mut config = AppConfig::default();
    config.access.remote_timeout_secs = 0;
    assert!(validate_app_config(&config).is_err());
}

#[test]
fn test_saved_config_loads_back() {
    let dir = TempDir::new().unwrap();
    let mut config = AppConfig::default();
    config.registry.provider = "yaml".to_string();
    config.registry.location = Some(dir.path().join("defs"));
    config.registry.watch = true;
    config.manager.reload_interval_secs = 15;

    let loader = loader_for(&dir);
    loader
        .save_to_file(&config, loader.config_path().unwrap())
        .unwrap();

    assert_eq!(loader.load().unwrap(), config);
}

#[test]
#[ignore = "requires --test-threads=1 due to env var mutations"]
fn test_env_vars_override_file() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "[registry]\nprovider = \"sql\"\nmax_connections = 3\n");
    set_env("SVCREG_UNIT_TEST__REGISTRY__PROVIDER", "memory");
    set_env("SVCREG_UNIT_TEST__REGISTRY__MAX_CONNECTIONS", "11");

    let config = loader_for(&dir).load();

    remove_env("SVCREG_UNIT_TEST__REGISTRY__PROVIDER");
    remove_env("SVCREG_UNIT_TEST__REGISTRY__MAX_CONNECTIONS");

    let config = config.unwrap();
    assert_eq!(config.registry.provider, "memory");
    assert_eq!(config.registry.max_connections, 11);
}
