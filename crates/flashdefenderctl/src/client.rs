//! HTTP client for communicating with flashdefenderd.

use anyhow::{Context, Result};
use flashdefender_common::{
    ErrorResponse, ProcessDnsRequest, ProcessDnsResponse, TestConnectionRequest,
    TestConnectionResponse,
};
use reqwest::StatusCode;
use tracing::debug;

/// Where flashdefenderd listens by default
pub const DEFAULT_DAEMON_URL: &str = "http://127.0.0.1:7870";

/// Result of a process-dns call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessReply {
    /// The run completed; the report lists every device
    Finished(ProcessDnsResponse),
    /// The run did not start or did not complete
    Refused { status: u16, error: ErrorResponse },
}

impl ProcessReply {
    pub fn is_finished(&self) -> bool {
        matches!(self, ProcessReply::Finished(_))
    }
}

/// Client for the daemon's JSON API
pub struct DaemonClient {
    base_url: String,
    http: reqwest::Client,
}

impl DaemonClient {
    pub fn new(base_url: &str) -> Result<Self> {
        // No request timeout: a process-dns run lasts as long as the inventory
        let http = reqwest::Client::builder()
            .user_agent(concat!("flashdefenderctl/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<T: serde::Serialize>(&self, path: &str, body: &T) -> Result<reqwest::Response> {
        let url = self.url(path);
        debug!("POST {}", url);
        self.http
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Cannot reach flashdefenderd at {}", self.base_url))
    }

    /// The daemon answers with the same body shape for every status.
    pub async fn test_connection(
        &self,
        request: &TestConnectionRequest,
    ) -> Result<(u16, TestConnectionResponse)> {
        let response = self.post("/api/test-connection", request).await?;
        let status = response.status().as_u16();
        let body = response
            .json::<TestConnectionResponse>()
            .await
            .context("Unexpected test-connection response from daemon")?;
        Ok((status, body))
    }

    pub async fn process_dns(&self, request: &ProcessDnsRequest) -> Result<ProcessReply> {
        let response = self.post("/api/process-dns", request).await?;
        let status = response.status();

        if status == StatusCode::OK {
            let report = response
                .json::<ProcessDnsResponse>()
                .await
                .context("Unexpected process-dns report from daemon")?;
            return Ok(ProcessReply::Finished(report));
        }

        let error = response
            .json::<ErrorResponse>()
            .await
            .with_context(|| format!("Daemon returned HTTP {} without an error body", status))?;
        Ok(ProcessReply::Refused {
            status: status.as_u16(),
            error,
        })
    }
}
