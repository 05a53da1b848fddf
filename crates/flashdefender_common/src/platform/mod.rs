//! Flashman platform API abstraction
//!
//! The remediation pipeline only talks to the platform through
//! [`PlatformApi`], which enables:
//! - Deterministic testing with [`FakePlatform`]
//! - No network required for pipeline and route tests
//!
//! Production code uses [`HttpPlatformClient`].

mod fake;
mod http;

pub use fake::{FakeConnector, FakePlatform};
pub use http::{HttpConnector, HttpPlatformClient};

use crate::model::{DeviceId, DeviceRecord, DnsList, PlatformConfig};
use async_trait::async_trait;
use std::sync::Arc;

/// Failure of a single platform call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("platform rejected request: {}", .0.as_deref().unwrap_or("no message"))]
    Rejected(Option<String>),

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("request error: {0}")]
    Request(String),
}

impl From<reqwest::Error> for PlatformError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            PlatformError::Timeout
        } else if e.is_connect() {
            PlatformError::Connect(e.to_string())
        } else if e.is_decode() {
            PlatformError::Decode(e.to_string())
        } else {
            PlatformError::Request(e.to_string())
        }
    }
}

/// The three Flashman v3 endpoints the pipeline consumes.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// One page of online devices (`fields=_id`). Pages start at 1.
    async fn search_devices(
        &self,
        page: u32,
        page_limit: u32,
    ) -> Result<Vec<DeviceRecord>, PlatformError>;

    /// Current LAN DNS servers of a device.
    async fn get_lan_dns(&self, device: &DeviceId) -> Result<DnsList, PlatformError>;

    /// Replace the LAN DNS servers of a device.
    async fn set_lan_dns(&self, device: &DeviceId, dns: &[String]) -> Result<(), PlatformError>;
}

/// Builds a [`PlatformApi`] for caller-supplied connection parameters.
pub trait PlatformConnector: Send + Sync {
    fn connect(&self, config: PlatformConfig) -> Result<Arc<dyn PlatformApi>, PlatformError>;
}
