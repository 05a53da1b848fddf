//! In-memory Flashman platform for deterministic testing.

use super::{PlatformApi, PlatformConnector, PlatformError};
use crate::model::{DeviceId, DeviceRecord, DnsList, PlatformConfig};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Fake platform backed by an in-memory device store
///
/// Devices are returned by `search_devices` in insertion order. Reads and
/// writes go to the same store, so a write is visible to the next read.
///
/// ## Example
///
/// ```rust,ignore
/// let fake = FakePlatform::new()
///     .with_device("AA:BB:CC:00:00:01", &["6.6.6.6"])
///     .with_device("AA:BB:CC:00:00:02", &["1.1.1.1"])
///     .fail_write("AA:BB:CC:00:00:01", PlatformError::Timeout);
/// ```
#[derive(Default)]
pub struct FakePlatform {
    inventory: Vec<DeviceRecord>,
    dns: Mutex<HashMap<String, DnsList>>,
    search_failures: HashMap<u32, PlatformError>,
    read_failures: HashMap<String, PlatformError>,
    write_failures: HashMap<String, PlatformError>,
    panic_on: HashSet<String>,
    /// (page, page_limit) of every search call
    search_calls: Mutex<Vec<(u32, u32)>>,
    /// (device_id, dns) of every successful write
    writes: Mutex<Vec<(String, DnsList)>>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an online device with its current DNS servers.
    pub fn with_device(mut self, id: &str, dns: &[&str]) -> Self {
        self.inventory.push(DeviceRecord::new(id));
        self.dns
            .get_mut()
            .unwrap()
            .insert(id.to_string(), dns.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Add `count` devices with generated MACs, all using `dns`.
    pub fn with_devices(mut self, count: usize, dns: &[&str]) -> Self {
        for i in 0..count {
            let id = format!(
                "02:00:00:{:02X}:{:02X}:{:02X}",
                (i >> 16) & 0xff,
                (i >> 8) & 0xff,
                i & 0xff
            );
            self = self.with_device(&id, dns);
        }
        self
    }

    /// Add an inventory entry that has no `_id`.
    pub fn with_anonymous_device(mut self) -> Self {
        self.inventory.push(DeviceRecord::anonymous());
        self
    }

    /// Make the search for `page` fail.
    pub fn fail_search_at(mut self, page: u32, error: PlatformError) -> Self {
        self.search_failures.insert(page, error);
        self
    }

    pub fn fail_read(mut self, id: &str, error: PlatformError) -> Self {
        self.read_failures.insert(id.to_string(), error);
        self
    }

    pub fn fail_write(mut self, id: &str, error: PlatformError) -> Self {
        self.write_failures.insert(id.to_string(), error);
        self
    }

    /// Panic while reading this device's DNS.
    pub fn panic_on(mut self, id: &str) -> Self {
        self.panic_on.insert(id.to_string());
        self
    }

    /// Current DNS of a device in the store.
    pub fn dns_of(&self, id: &str) -> Option<DnsList> {
        self.dns.lock().unwrap().get(id).cloned()
    }

    pub fn search_calls(&self) -> Vec<(u32, u32)> {
        self.search_calls.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<(String, DnsList)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlatformApi for FakePlatform {
    async fn search_devices(
        &self,
        page: u32,
        page_limit: u32,
    ) -> Result<Vec<DeviceRecord>, PlatformError> {
        self.search_calls.lock().unwrap().push((page, page_limit));

        if let Some(error) = self.search_failures.get(&page) {
            return Err(error.clone());
        }

        let limit = page_limit as usize;
        let start = (page.saturating_sub(1) as usize).saturating_mul(limit);
        Ok(self
            .inventory
            .iter()
            .skip(start)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_lan_dns(&self, device: &DeviceId) -> Result<DnsList, PlatformError> {
        if self.panic_on.contains(device.as_str()) {
            panic!("fake platform panic for {}", device);
        }
        if let Some(error) = self.read_failures.get(device.as_str()) {
            return Err(error.clone());
        }

        self.dns
            .lock()
            .unwrap()
            .get(device.as_str())
            .cloned()
            .ok_or_else(|| PlatformError::Status {
                code: 404,
                body: format!("device {} not found", device),
            })
    }

    async fn set_lan_dns(&self, device: &DeviceId, dns: &[String]) -> Result<(), PlatformError> {
        if let Some(error) = self.write_failures.get(device.as_str()) {
            return Err(error.clone());
        }

        let mut store = self.dns.lock().unwrap();
        match store.get_mut(device.as_str()) {
            Some(current) => {
                *current = dns.to_vec();
                self.writes
                    .lock()
                    .unwrap()
                    .push((device.to_string(), dns.to_vec()));
                Ok(())
            }
            None => Err(PlatformError::Status {
                code: 404,
                body: format!("device {} not found", device),
            }),
        }
    }
}

/// Connector that hands out one shared [`FakePlatform`]
pub struct FakeConnector {
    platform: Arc<FakePlatform>,
    connect_error: Option<PlatformError>,
    /// Configs passed to `connect`, in call order
    connections: Mutex<Vec<PlatformConfig>>,
}

impl FakeConnector {
    pub fn new(platform: Arc<FakePlatform>) -> Self {
        Self {
            platform,
            connect_error: None,
            connections: Mutex::new(Vec::new()),
        }
    }

    /// Make every `connect` call fail with `error`.
    pub fn failing(error: PlatformError) -> Self {
        Self {
            platform: Arc::new(FakePlatform::new()),
            connect_error: Some(error),
            connections: Mutex::new(Vec::new()),
        }
    }

    pub fn platform(&self) -> &Arc<FakePlatform> {
        &self.platform
    }

    pub fn connections(&self) -> Vec<PlatformConfig> {
        self.connections.lock().unwrap().clone()
    }
}

impl PlatformConnector for FakeConnector {
    fn connect(&self, config: PlatformConfig) -> Result<Arc<dyn PlatformApi>, PlatformError> {
        self.connections.lock().unwrap().push(config);
        if let Some(error) = &self.connect_error {
            return Err(error.clone());
        }
        let platform: Arc<dyn PlatformApi> = self.platform.clone();
        Ok(platform)
    }
}
