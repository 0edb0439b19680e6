//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If the client id is not set there, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `DIADOC_API_CLIENT_ID`: API client id (required)
//! - `DIADOC_API_URL`: API base URL
//! - `DIADOC_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `DIADOC_TASK_TIMEOUT_MS`: Default task wait timeout in milliseconds
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./diadoc.json` or `./diadoc.toml` (current working directory)
//! 2. `../diadoc.json` or `../diadoc.toml` (parent directory)
//! 3. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use diadoc_domain::{ClientConfig, DiadocError, Result};

const CONFIG_FILE_STEM: &str = "diadoc";

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the client id is
/// missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `DiadocError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<ClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only `DIADOC_API_CLIENT_ID` is required; everything else falls back to
/// the protocol defaults.
///
/// # Errors
/// Returns `DiadocError::Config` if the client id is missing or a numeric
/// variable does not parse.
pub fn load_from_env() -> Result<ClientConfig> {
    let mut config = ClientConfig::new(env_var("DIADOC_API_CLIENT_ID")?);

    if let Ok(url) = std::env::var("DIADOC_API_URL") {
        config.api.base_url = url;
    }
    if let Some(timeout) = env_parse::<u64>("DIADOC_TIMEOUT_SECS")? {
        config.api.timeout_secs = timeout;
    }
    if let Some(timeout) = env_parse::<u64>("DIADOC_TASK_TIMEOUT_MS")? {
        config.task.default_timeout_ms = timeout;
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `DiadocError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(DiadocError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            DiadocError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| DiadocError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| DiadocError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| DiadocError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(DiadocError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd.clone());
        roots.push(cwd.join(".."));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    roots
        .into_iter()
        .flat_map(|root| {
            ["json", "toml"].map(|ext| root.join(format!("{CONFIG_FILE_STEM}.{ext}")))
        })
        .find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `DiadocError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| DiadocError::Config(format!("Missing required environment variable: {key}")))
}

/// Parse an optional environment variable.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| DiadocError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}
