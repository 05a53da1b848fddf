//! Per-device DNS read/write.
//!
//! Every failure mode (transport, status, success flag, malformed body)
//! collapses to `None` / `false` here so the pipeline loop stays free of
//! error plumbing. The typed cause is logged before it is dropped.

use crate::model::{DeviceId, DnsList};
use crate::platform::PlatformApi;
use tracing::warn;

/// Current LAN DNS servers, or `None` if they could not be read.
pub async fn get_device_dns(api: &dyn PlatformApi, device: &DeviceId) -> Option<DnsList> {
    match api.get_lan_dns(device).await {
        Ok(dns) => Some(dns),
        Err(e) => {
            warn!(device_id = %device, error = %e, "failed to read device DNS");
            None
        }
    }
}

/// Write `dns` to the device. `true` only when the platform confirmed it.
pub async fn set_device_dns(api: &dyn PlatformApi, device: &DeviceId, dns: &[String]) -> bool {
    match api.set_lan_dns(device, dns).await {
        Ok(()) => true,
        Err(e) => {
            warn!(device_id = %device, error = %e, "failed to update device DNS");
            false
        }
    }
}
