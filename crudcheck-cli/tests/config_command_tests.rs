//! Integration tests for `crudcheck config` and config loading.
//!
//! Tests config validation and display functionality with real TOML files.

use std::fs;
use std::path::PathBuf;

use serial_test::serial;
use tempfile::TempDir;

use crudcheck_cli::commands::config::{show_report, validation_report};
use crudcheck_cli::commands::load_config;
use crudcheck_cli::error::CliError;
use crudcheck_core::config::CrudcheckConfig;

fn write_config(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("should write config");
    path
}

#[tokio::test]
async fn test_config_validate_valid_toml() {
    // Given: A valid config file
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = write_config(
        &temp_dir,
        "crudcheck.toml",
        r#"
[general]
log_level = "debug"
log_format = "json"

[session]
operation_timeout_secs = 10
wait_timeout_secs = 60
poll_interval_ms = 100
verify_updates = true
"#,
    );

    // When: Validating the config
    let report = validation_report(&config_path).await;

    // Then: Should be valid
    assert!(report.valid, "valid config should load: {:?}", report.errors);
    assert!(report.errors.is_empty());
}

#[tokio::test]
async fn test_config_validate_malformed_toml() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = write_config(&temp_dir, "bad.toml", "[general\nlog_level = \"info\"\n");

    let report = validation_report(&config_path).await;

    assert!(!report.valid, "malformed TOML should fail to load");
    assert!(report.errors[0].contains("parse"));
}

#[tokio::test]
async fn test_config_validate_out_of_range_value() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = write_config(
        &temp_dir,
        "range.toml",
        r#"
[session]
operation_timeout_secs = 30
wait_timeout_secs = 120
poll_interval_ms = 0
verify_updates = true
"#,
    );

    let report = validation_report(&config_path).await;

    assert!(!report.valid);
    assert!(report.errors[0].contains("session.poll_interval_ms"));
}

#[tokio::test]
async fn test_config_validate_empty_file_uses_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = write_config(&temp_dir, "empty.toml", "");

    let report = validation_report(&config_path).await;
    assert!(report.valid, "empty file should fall back to defaults");
}

#[tokio::test]
async fn test_config_show_appliance_section_from_file() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = write_config(
        &temp_dir,
        "crudcheck.toml",
        r#"
[appliance]
tag_catalog = ["Location/Brno"]
delete_delay_ms = 0
run_delay_ms = 0

[[appliance.providers]]
name = "only-ec2"
kind = "ec2"
"#,
    );

    let config = CrudcheckConfig::load(&config_path).await.expect("config should load");
    let report = show_report(&config, &config_path, Some("appliance".to_owned()))
        .expect("appliance is a known section");

    assert!(report.config_toml.contains("only-ec2"));
    assert!(report.config_toml.contains("Location/Brno"));
    assert!(!report.config_toml.contains("rhos-01"));
}

#[tokio::test]
async fn test_config_data_tables_round_into_cases() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = write_config(
        &temp_dir,
        "crudcheck.toml",
        r#"
[[data.reports]]
menu_name = "from file"
title = "Hosts by cluster"
base_report_on = "Hosts"
report_fields = ["Name", "Cluster"]
"#,
    );

    let config = load_config(&config_path).await.expect("config should load");
    assert_eq!(config.data.reports.len(), 1);
    assert_eq!(config.data.reports[0]["menu_name"], "from file");
}

#[tokio::test]
#[serial]
async fn test_load_config_missing_file_falls_back_to_defaults() {
    let config = load_config(&PathBuf::from("/nonexistent/crudcheck.toml"))
        .await
        .expect("missing file should use defaults");
    assert_eq!(config.appliance.providers.len(), 2);
}

#[tokio::test]
#[serial]
async fn test_load_config_missing_file_still_applies_env() {
    // SAFETY: serial 테스트에서만 환경변수를 조작합니다.
    unsafe { std::env::set_var("CRUDCHECK_SESSION_POLL_INTERVAL_MS", "0") };
    let result = load_config(&PathBuf::from("/nonexistent/crudcheck.toml")).await;
    unsafe { std::env::remove_var("CRUDCHECK_SESSION_POLL_INTERVAL_MS") };

    let err = result.expect_err("zero poll interval is out of range");
    assert!(matches!(err, CliError::Config(_)));
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn test_config_validate_missing_file() {
    let report = validation_report(&PathBuf::from("/nonexistent/crudcheck.toml")).await;
    assert!(!report.valid, "missing file should fail validation");
}
