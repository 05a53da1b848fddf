//! Paginated collection of the online device inventory.

use crate::model::DeviceRecord;
use crate::platform::PlatformApi;
use tracing::{debug, info, warn};

/// Largest page the Flashman search endpoint accepts.
pub const MAX_PAGE_LIMIT: u32 = 50;

/// Collect every online device, page by page.
///
/// Stops at the first failed page, the first empty page, or the first page
/// shorter than `page_limit` (which is still included). A failure returns
/// what was collected so far; callers cannot tell a partial inventory from a
/// complete one.
pub async fn fetch_online_devices(api: &dyn PlatformApi, page_limit: u32) -> Vec<DeviceRecord> {
    let page_limit = page_limit.clamp(1, MAX_PAGE_LIMIT);
    let mut devices = Vec::new();
    let mut page = 1u32;

    loop {
        let batch = match api.search_devices(page, page_limit).await {
            Ok(batch) => batch,
            Err(e) => {
                warn!(page, error = %e, collected = devices.len(), "inventory fetch stopped early");
                break;
            }
        };
        debug!(page, count = batch.len(), "inventory page fetched");

        if batch.is_empty() {
            break;
        }

        let last_page = batch.len() < page_limit as usize;
        devices.extend(batch);
        if last_page {
            break;
        }
        page += 1;
    }

    info!(total = devices.len(), pages = page, "inventory fetch complete");
    devices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{FakePlatform, PlatformError};

    #[tokio::test]
    async fn test_three_pages() {
        let fake = FakePlatform::new().with_devices(130, &["1.1.1.1"]);

        let devices = fetch_online_devices(&fake, 50).await;

        assert_eq!(devices.len(), 130);
        assert_eq!(fake.search_calls(), vec![(1, 50), (2, 50), (3, 50)]);
    }

    #[tokio::test]
    async fn test_exact_page_needs_empty_page_to_stop() {
        let fake = FakePlatform::new().with_devices(50, &[]);

        let devices = fetch_online_devices(&fake, 50).await;

        assert_eq!(devices.len(), 50);
        assert_eq!(fake.search_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_inventory() {
        let fake = FakePlatform::new();
        assert!(fetch_online_devices(&fake, 50).await.is_empty());
        assert_eq!(fake.search_calls(), vec![(1, 50)]);
    }

    #[tokio::test]
    async fn test_failure_keeps_partial_result() {
        let fake = FakePlatform::new()
            .with_devices(120, &[])
            .fail_search_at(2, PlatformError::Timeout);

        let devices = fetch_online_devices(&fake, 50).await;

        assert_eq!(devices.len(), 50);
        assert_eq!(fake.search_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_first_page_is_empty_result() {
        let fake = FakePlatform::new()
            .with_devices(10, &[])
            .fail_search_at(1, PlatformError::Rejected(Some("bad auth".to_string())));

        assert!(fetch_online_devices(&fake, 50).await.is_empty());
    }

    #[tokio::test]
    async fn test_page_limit_is_clamped() {
        let fake = FakePlatform::new().with_devices(3, &[]);

        fetch_online_devices(&fake, 500).await;
        fetch_online_devices(&fake, 0).await;

        let calls = fake.search_calls();
        assert_eq!(calls[0], (1, MAX_PAGE_LIMIT));
        // limit 0 becomes 1: pages of one device until the empty page 4
        assert_eq!(&calls[1..], &[(1, 1), (2, 1), (3, 1), (4, 1)]);
    }
}
