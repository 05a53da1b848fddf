//! reqwest-backed Flashman client.

use super::{PlatformApi, PlatformConnector, PlatformError};
use crate::model::{DeviceId, DeviceRecord, DnsList, PlatformConfig};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const SEARCH_PATH: &str = "/api/v3/device/search/";

/// Longest error body kept in a [`PlatformError::Status`].
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    devices: Vec<DeviceRecord>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DnsEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    lan_dns_servers_list: DnsList,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AckEnvelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct DnsUpdate<'a> {
    lan_dns_servers_list: &'a [String],
}

/// HTTP client for one Flashman instance.
pub struct HttpPlatformClient {
    config: PlatformConfig,
    http: reqwest::Client,
}

impl HttpPlatformClient {
    pub fn new(config: PlatformConfig, timeout: Duration) -> Result<Self, PlatformError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("flashdefender/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PlatformError::Request(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.endpoint_url(), path)
    }

    fn dns_url(&self, device: &DeviceId) -> String {
        self.url(&format!(
            "/api/v3/device/mac/{}/lan-dns-servers",
            device.path_segment()
        ))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, self.config.auth_token())
    }
}

/// Decode a 200 response body; any other status becomes [`PlatformError::Status`].
async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<T, PlatformError> {
    let status = response.status();
    if status != StatusCode::OK {
        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        return Err(PlatformError::Status {
            code: status.as_u16(),
            body,
        });
    }

    Ok(response.json::<T>().await?)
}

#[async_trait]
impl PlatformApi for HttpPlatformClient {
    async fn search_devices(
        &self,
        page: u32,
        page_limit: u32,
    ) -> Result<Vec<DeviceRecord>, PlatformError> {
        let query = [
            ("online", "true".to_string()),
            ("fields", "_id".to_string()),
            ("page", page.to_string()),
            ("pageLimit", page_limit.to_string()),
        ];

        let response = self
            .authorized(self.http.get(self.url(SEARCH_PATH)))
            .query(&query)
            .send()
            .await?;
        debug!(page, status = %response.status(), "device search response");

        let envelope: SearchEnvelope = read_envelope(response).await?;
        if !envelope.success {
            return Err(PlatformError::Rejected(envelope.message));
        }
        Ok(envelope.devices)
    }

    async fn get_lan_dns(&self, device: &DeviceId) -> Result<DnsList, PlatformError> {
        let response = self
            .authorized(self.http.get(self.dns_url(device)))
            .send()
            .await?;
        debug!(device_id = %device, status = %response.status(), "DNS read response");

        let envelope: DnsEnvelope = read_envelope(response).await?;
        if !envelope.success {
            return Err(PlatformError::Rejected(envelope.message));
        }
        Ok(envelope.lan_dns_servers_list)
    }

    async fn set_lan_dns(&self, device: &DeviceId, dns: &[String]) -> Result<(), PlatformError> {
        let response = self
            .authorized(self.http.put(self.dns_url(device)))
            .json(&DnsUpdate {
                lan_dns_servers_list: dns,
            })
            .send()
            .await?;
        debug!(device_id = %device, status = %response.status(), "DNS write response");

        let envelope: AckEnvelope = read_envelope(response).await?;
        if !envelope.success {
            return Err(PlatformError::Rejected(envelope.message));
        }
        Ok(())
    }
}

/// Connector producing [`HttpPlatformClient`]s with a fixed request timeout.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    timeout: Duration,
}

impl HttpConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for HttpConnector {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl PlatformConnector for HttpConnector {
    fn connect(&self, config: PlatformConfig) -> Result<Arc<dyn PlatformApi>, PlatformError> {
        let client: Arc<dyn PlatformApi> = Arc::new(HttpPlatformClient::new(config, self.timeout)?);
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dns_url_encodes_mac() {
        let client = HttpPlatformClient::new(
            PlatformConfig::new("http://flashman.local/", "u", "p"),
            Duration::from_secs(1),
        )
        .unwrap();
        let id = DeviceId::new("AA:BB:CC:00:11:22").unwrap();
        assert_eq!(
            client.dns_url(&id),
            "http://flashman.local/api/v3/device/mac/AA%3ABB%3ACC%3A00%3A11%3A22/lan-dns-servers"
        );
    }

    #[test]
    fn test_search_envelope_defaults() {
        let envelope: SearchEnvelope = serde_json::from_str("{}").unwrap();
        assert!(!envelope.success);
        assert!(envelope.devices.is_empty());
        assert!(envelope.message.is_none());
    }

    #[test]
    fn test_dns_update_body() {
        let dns = vec!["1.1.1.1".to_string(), "8.8.4.4".to_string()];
        let body = serde_json::to_value(DnsUpdate {
            lan_dns_servers_list: &dns,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"lan_dns_servers_list": ["1.1.1.1", "8.8.4.4"]})
        );
    }
}
