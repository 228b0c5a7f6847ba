//! Unit tests for configuration loading and validation
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate PEOPLE_INFO_* variables are marked with #[serial].

use people_common::config::{
    ServiceConfig, ENV_AGE_URL, ENV_BIND, ENV_CALL_TIMEOUT_MS, ENV_DATABASE, ENV_PUBLIC_URL,
};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

fn clear_env() {
    for name in [ENV_BIND, ENV_DATABASE, ENV_AGE_URL, ENV_CALL_TIMEOUT_MS, ENV_PUBLIC_URL] {
        env::remove_var(name);
    }
}

#[test]
fn test_compiled_defaults() {
    let config = ServiceConfig::default();

    assert_eq!(config.server.bind_address, "127.0.0.1:8080");
    assert_eq!(config.server.request_timeout_secs, 10);
    assert!(config.server.public_base_url.is_none());
    assert_eq!(config.enrichment.age_url, "https://api.agify.io/");
    assert_eq!(config.enrichment.gender_url, "https://api.genderize.io/");
    assert_eq!(config.enrichment.nationality_url, "https://api.nationalize.io/");
    assert_eq!(config.enrichment.call_timeout(), Duration::from_secs(5));
    assert_eq!(config.enrichment.gender_min_probability, 0.70);
    assert_eq!(config.pagination.default_limit, 5);
    assert_eq!(config.pagination.default_offset, 0);
    assert_eq!(config.pagination.max_limit, 100);
    assert_eq!(config.logging.level, "info");
    assert!(config.database.path.ends_with("people.db"));
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let config = ServiceConfig::from_toml_str(
        r#"
        [pagination]
        default_limit = 20

        [enrichment]
        gender_min_probability = 0.9
        "#,
    )
    .expect("Partial TOML should parse");

    assert_eq!(config.pagination.default_limit, 20);
    assert_eq!(config.pagination.max_limit, 100);
    assert_eq!(config.enrichment.gender_min_probability, 0.9);
    assert_eq!(config.enrichment.call_timeout_ms, 5000);
    assert_eq!(config.server.bind_address, "127.0.0.1:8080");
}

#[test]
fn test_invalid_toml_is_config_error() {
    let err = ServiceConfig::from_toml_str("[server\nbind_address = 1").unwrap_err();
    assert!(err.to_string().contains("Parse TOML failed"));
}

#[test]
#[serial]
fn test_load_explicit_file() {
    clear_env();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
        [server]
        bind_address = "0.0.0.0:9000"

        [database]
        path = "/tmp/people-test.db"
        "#
    )
    .unwrap();

    let config = ServiceConfig::load(Some(file.path())).expect("Should load config file");

    assert_eq!(config.server.bind_address, "0.0.0.0:9000");
    assert_eq!(config.database.path, PathBuf::from("/tmp/people-test.db"));
    assert_eq!(config.source.as_deref(), Some(file.path()));
}

#[test]
#[serial]
fn test_load_missing_explicit_file_fails() {
    clear_env();

    let result = ServiceConfig::load(Some(std::path::Path::new(
        "/nonexistent/people-info/config.toml",
    )));
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_env_overrides_file_values() {
    clear_env();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
        [server]
        bind_address = "0.0.0.0:9000"
        "#
    )
    .unwrap();

    env::set_var(ENV_BIND, "127.0.0.1:7000");
    env::set_var(ENV_AGE_URL, "http://localhost:4000/age");
    env::set_var(ENV_CALL_TIMEOUT_MS, "1500");
    env::set_var(ENV_PUBLIC_URL, "https://people.example.com");

    let config = ServiceConfig::load(Some(file.path())).expect("Should load config");

    assert_eq!(config.server.bind_address, "127.0.0.1:7000");
    assert_eq!(config.enrichment.age_url, "http://localhost:4000/age");
    assert_eq!(config.enrichment.call_timeout_ms, 1500);
    assert_eq!(
        config.server.public_base_url.as_deref(),
        Some("https://people.example.com")
    );

    clear_env();
}

#[test]
#[serial]
fn test_env_timeout_must_be_numeric() {
    clear_env();
    env::set_var(ENV_CALL_TIMEOUT_MS, "soon");

    let mut config = ServiceConfig::default();
    let result = config.apply_env_overrides();
    assert!(result.is_err());

    clear_env();
}

#[test]
fn test_validate_rejects_bad_values() {
    let mut config = ServiceConfig::default();
    config.enrichment.gender_min_probability = 1.5;
    assert!(config.validate().is_err());

    let mut config = ServiceConfig::default();
    config.enrichment.call_timeout_ms = 0;
    assert!(config.validate().is_err());

    let mut config = ServiceConfig::default();
    config.pagination.default_limit = 0;
    assert!(config.validate().is_err());

    let mut config = ServiceConfig::default();
    config.pagination.default_limit = 500;
    assert!(config.validate().is_err());

    let mut config = ServiceConfig::default();
    config.enrichment.nationality_url = "not a url".to_string();
    assert!(config.validate().is_err());

    let mut config = ServiceConfig::default();
    config.server.public_base_url = Some("::nope".to_string());
    assert!(config.validate().is_err());

    let mut config = ServiceConfig::default();
    config.database.max_connections = 0;
    assert!(config.validate().is_err());

    let mut config = ServiceConfig::default();
    config.server.request_timeout_secs = 5;
    assert!(config.validate().is_err());
}
