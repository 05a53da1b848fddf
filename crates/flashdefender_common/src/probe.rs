//! Connectivity and credential check before a full run.

use crate::inventory::fetch_online_devices;
use crate::platform::{PlatformApi, PlatformError};
use tracing::{info, warn};

/// Page size of the initial reachability request.
pub const PROBE_PAGE_LIMIT: u32 = 1;

/// What a connection test found out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Credentials accepted; `device_count` is the full online inventory size
    Connected { device_count: usize },
    /// The platform did not answer within the request timeout
    TimedOut,
    /// No connection could be established
    Unreachable(String),
    /// The platform answered but refused (bad status, success=false, bad body)
    Rejected(String),
}

impl ProbeOutcome {
    pub fn is_connected(&self) -> bool {
        matches!(self, ProbeOutcome::Connected { .. })
    }
}

/// Request page 1 with a single device; on success count the whole inventory.
pub async fn test_connection(api: &dyn PlatformApi, page_limit: u32) -> ProbeOutcome {
    match api.search_devices(1, PROBE_PAGE_LIMIT).await {
        Ok(_) => {
            let device_count = fetch_online_devices(api, page_limit).await.len();
            info!(device_count, "connection test succeeded");
            ProbeOutcome::Connected { device_count }
        }
        Err(PlatformError::Timeout) => {
            warn!("connection test timed out");
            ProbeOutcome::TimedOut
        }
        Err(PlatformError::Connect(msg)) => {
            warn!(error = %msg, "connection test could not connect");
            ProbeOutcome::Unreachable(msg)
        }
        Err(other) => {
            warn!(error = %other, "connection test rejected");
            ProbeOutcome::Rejected(other.to_string())
        }
    }
}
