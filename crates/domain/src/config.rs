//! Client configuration structures

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT_SECS, SHELF_MAX_ATTEMPTS, SHELF_PART_LENGTH,
    TASK_DEFAULT_RETRY_DELAY, TASK_DEFAULT_TIMEOUT_MS, TASK_MAX_RETRY_DELAY,
};

/// Top-level client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api: ApiConfig,
    #[serde(default)]
    pub shelf: ShelfConfig,
    #[serde(default)]
    pub task: TaskConfig,
}

/// Connection settings for the Diadoc API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub client_id: String,
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// Shelf upload tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelfConfig {
    pub part_length: usize,
    pub max_attempts: u32,
}

/// Task polling tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskConfig {
    pub default_timeout_ms: u64,
    pub max_retry_delay_secs: u64,
    pub default_retry_delay_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl ClientConfig {
    /// Configuration pointing at the production API with default tuning.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            api: ApiConfig {
                base_url: DEFAULT_API_URL.to_string(),
                client_id: client_id.into(),
                timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                user_agent: None,
            },
            shelf: ShelfConfig::default(),
            task: TaskConfig::default(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ShelfConfig {
    fn default() -> Self {
        Self { part_length: SHELF_PART_LENGTH, max_attempts: SHELF_MAX_ATTEMPTS }
    }
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: TASK_DEFAULT_TIMEOUT_MS,
            max_retry_delay_secs: TASK_MAX_RETRY_DELAY.as_secs(),
            default_retry_delay_secs: TASK_DEFAULT_RETRY_DELAY.as_secs(),
        }
    }
}

impl TaskConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    pub fn max_retry_delay(&self) -> Duration {
        Duration::from_secs(self.max_retry_delay_secs)
    }

    pub fn default_retry_delay(&self) -> Duration {
        Duration::from_secs(self.default_retry_delay_secs)
    }
}
