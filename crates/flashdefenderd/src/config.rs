//! Configuration management for flashdefenderd.
//!
//! Loads settings from $FLASHDEFENDER_CONFIG, /etc/flashdefender/config.toml
//! or /var/lib/flashdefender/config.toml, in that order; falls back to
//! defaults.

use anyhow::Result;
use flashdefender_common::{PipelineSettings, MAX_PAGE_LIMIT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "FLASHDEFENDER_CONFIG";

/// Config file path
pub const CONFIG_PATH: &str = "/etc/flashdefender/config.toml";

/// Default config file path for fallback
pub const DEFAULT_CONFIG_PATH: &str = "/var/lib/flashdefender/config.toml";

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the API listens on
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:7870".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Flashman request tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformTuning {
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Devices per search page (platform maximum is 50)
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,

    /// Pause between two devices in milliseconds
    #[serde(default = "default_device_delay")]
    pub device_delay_ms: u64,
}

fn default_request_timeout() -> u64 {
    30
}

fn default_page_limit() -> u32 {
    MAX_PAGE_LIMIT
}

fn default_device_delay() -> u64 {
    100
}

impl Default for PlatformTuning {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            page_limit: default_page_limit(),
            device_delay_ms: default_device_delay(),
        }
    }
}

/// Complete daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub platform: PlatformTuning,
}

impl Config {
    /// Load config from the first readable location, or defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            match Self::load_from_path(&path) {
                Ok(config) => return config,
                Err(e) => warn!("Failed to load {} from {}: {}", CONFIG_ENV, path, e),
            }
        }

        Self::load_from_path(CONFIG_PATH)
            .or_else(|_| Self::load_from_path(DEFAULT_CONFIG_PATH))
            .unwrap_or_else(|e| {
                warn!("Config not found, using defaults: {}", e);
                Config::default()
            })
    }

    /// Load config from specific path
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Convert the platform table to pipeline settings
    pub fn to_pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            page_limit: self.platform.page_limit.clamp(1, MAX_PAGE_LIMIT),
            device_delay: Duration::from_millis(self.platform.device_delay_ms),
            request_timeout: Duration::from_secs(self.platform.request_timeout_secs),
        }
    }
}
