//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files and
//! building a client from it.

use std::io::Write;
use std::time::Duration;

use diadoc_infra::{config, DiadocClient};
use tempfile::NamedTempFile;

fn write_config(contents: &str, extension: &str) -> std::path::PathBuf {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(contents.as_bytes()).expect("Failed to write to temp file");
    let path = temp_file.path().with_extension(extension);
    std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");
    path
}

#[test]
fn test_load_config_from_json_file() {
    let path = write_config(
        r#"{
            "api": {
                "base_url": "https://diadoc-api.example.test",
                "client_id": "integration-client",
                "timeout_secs": 45,
                "user_agent": "integration-agent/1.0"
            },
            "shelf": { "part_length": 65536, "max_attempts": 4 },
            "task": {
                "default_timeout_ms": 120000,
                "max_retry_delay_secs": 10,
                "default_retry_delay_secs": 5
            }
        }"#,
        "json",
    );

    let config = config::load_from_file(Some(path.clone())).expect("Failed to load config from JSON file");
    std::fs::remove_file(path).ok();

    assert_eq!(config.api.base_url, "https://diadoc-api.example.test");
    assert_eq!(config.api.client_id, "integration-client");
    assert_eq!(config.api.timeout(), Duration::from_secs(45));
    assert_eq!(config.api.user_agent.as_deref(), Some("integration-agent/1.0"));
    assert_eq!(config.shelf.part_length, 65536);
    assert_eq!(config.shelf.max_attempts, 4);
    assert_eq!(config.task.default_timeout(), Duration::from_secs(120));

    let client = DiadocClient::new(config).expect("client from loaded config");
    assert_eq!(client.shelf_upload_chunk_size(), 65536);
    assert_eq!(client.shelf_upload_max_attempts(), 4);
    assert!(!client.is_authenticated());
}

#[test]
fn test_load_config_from_toml_file() {
    let path = write_config(
        r#"
[api]
base_url = "https://diadoc-api.example.test"
client_id = "toml-client"
"#,
        "toml",
    );

    let config = config::load_from_file(Some(path.clone())).expect("Failed to load config from TOML file");
    std::fs::remove_file(path).ok();

    assert_eq!(config.api.client_id, "toml-client");
    assert_eq!(config.shelf.part_length, 512 * 1024);
    assert_eq!(config.task.max_retry_delay(), Duration::from_secs(15));
}

#[test]
fn test_missing_api_section_is_rejected() {
    let path = write_config(r#"{ "shelf": { "part_length": 1, "max_attempts": 1 } }"#, "json");

    let result = config::load_from_file(Some(path.clone()));
    std::fs::remove_file(path).ok();

    assert!(result.is_err(), "api section is required");
}

#[test]
fn test_client_rejects_invalid_base_url() {
    let path = write_config(r#"{ "api": { "base_url": "::not a url::", "client_id": "c" } }"#, "json");

    let config = config::load_from_file(Some(path.clone())).expect("config parses");
    std::fs::remove_file(path).ok();

    assert!(DiadocClient::new(config).is_err());
}
