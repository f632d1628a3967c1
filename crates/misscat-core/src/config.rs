use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_FEED_CAPACITY, DEFAULT_INSTANCE, DEFAULT_PAGE_SIZE, DEFAULT_REQUEST_TIMEOUT,
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Base URL of the instance, without the `/api` suffix
    pub instance_url: String,
    pub page_size: u32,
    pub feed_capacity: usize,
    pub request_timeout_secs: u64,
}

impl CoreConfig {
    pub fn new(instance_url: impl Into<String>) -> Self {
        Self {
            instance_url: instance_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Defaults overlaid with `MISSCAT_INSTANCE` and `MISSCAT_PAGE_SIZE`
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(instance) = std::env::var("MISSCAT_INSTANCE") {
            config.instance_url = instance.trim_end_matches('/').to_string();
        }
        if let Ok(page_size) = std::env::var("MISSCAT_PAGE_SIZE") {
            config.page_size = page_size.parse().map_err(|_| ConfigError::InvalidValue {
                key: "MISSCAT_PAGE_SIZE",
                value: page_size.clone(),
            })?;
        }
        Ok(config)
    }

    /// Load a JSON config file; missing fields take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&content)?;
        config.instance_url = config.instance_url.trim_end_matches('/').to_string();
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            instance_url: DEFAULT_INSTANCE.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            feed_capacity: DEFAULT_FEED_CAPACITY,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
        }
    }
}
