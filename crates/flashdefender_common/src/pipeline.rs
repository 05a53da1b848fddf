//! Remediation pipeline
//!
//! fetch inventory -> per device: read DNS -> classify -> (skip | rewrite) -> record
//!
//! Devices are processed strictly one after another. Each device runs in its
//! own tokio task so that a panic while handling one device becomes a
//! `Failed` outcome for that device instead of aborting the batch.

use crate::classifier::{is_suspicious, SuspiciousSet};
use crate::dns_client::{get_device_dns, set_device_dns};
use crate::inventory::{fetch_online_devices, MAX_PAGE_LIMIT};
use crate::model::{DeviceId, DeviceRecord, DnsList};
use crate::platform::PlatformApi;
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinError;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const READ_FAILURE: &str = "could not read current DNS";
pub const WRITE_FAILURE: &str = "could not update DNS";

/// Tunables for one pipeline instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Devices per search page (clamped to 1..=50)
    pub page_limit: u32,
    /// Pause between two devices; zero disables it
    pub device_delay: Duration,
    /// Timeout applied to every platform request
    pub request_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            page_limit: MAX_PAGE_LIMIT,
            device_delay: Duration::from_millis(100),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeDevice {
    pub device_id: DeviceId,
    pub dns_before: DnsList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemediatedDevice {
    pub device_id: DeviceId,
    pub dns_before: DnsList,
    pub dns_after: DnsList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedDevice {
    pub device_id: DeviceId,
    /// Empty when the current DNS could not be read
    pub dns_before: DnsList,
    pub reason: String,
}

/// Result of processing one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemediationOutcome {
    /// No suspicious DNS; nothing written
    Safe(SafeDevice),
    /// Suspicious DNS replaced with the safe list
    Remediated(RemediatedDevice),
    /// Read or write failed, or processing crashed
    Failed(FailedDevice),
}

impl RemediationOutcome {
    pub fn device_id(&self) -> &DeviceId {
        match self {
            Self::Safe(d) => &d.device_id,
            Self::Remediated(d) => &d.device_id,
            Self::Failed(d) => &d.device_id,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Safe(_) => "safe",
            Self::Remediated(_) => "remediated",
            Self::Failed(_) => "failed",
        }
    }

    fn failed(device_id: DeviceId, dns_before: DnsList, reason: impl Into<String>) -> Self {
        Self::Failed(FailedDevice {
            device_id,
            dns_before,
            reason: reason.into(),
        })
    }
}

/// Categorized result of one batch run. Every device with a usable id lands
/// in exactly one bucket.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    /// Inventory size, including entries without an id
    pub total_devices: usize,
    pub safe: Vec<SafeDevice>,
    pub remediated: Vec<RemediatedDevice>,
    pub failed: Vec<FailedDevice>,
}

impl BatchReport {
    fn start(run_id: Uuid, total_devices: usize) -> Self {
        let now = Local::now();
        Self {
            run_id,
            started_at: now,
            finished_at: now,
            total_devices,
            safe: Vec::new(),
            remediated: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: RemediationOutcome) {
        match outcome {
            RemediationOutcome::Safe(d) => self.safe.push(d),
            RemediationOutcome::Remediated(d) => self.remediated.push(d),
            RemediationOutcome::Failed(d) => self.failed.push(d),
        }
    }

    /// Devices that produced an outcome.
    pub fn processed(&self) -> usize {
        self.safe.len() + self.remediated.len() + self.failed.len()
    }
}

/// Scan-and-remediate pass over one platform.
pub struct RemediationPipeline {
    api: Arc<dyn PlatformApi>,
    settings: PipelineSettings,
}

impl RemediationPipeline {
    pub fn new(api: Arc<dyn PlatformApi>, settings: PipelineSettings) -> Self {
        Self { api, settings }
    }

    /// Fetch the online inventory with the configured page size.
    pub async fn inventory(&self) -> Vec<DeviceRecord> {
        fetch_online_devices(self.api.as_ref(), self.settings.page_limit).await
    }

    /// Full run: fetch the inventory, then remediate it.
    pub async fn run(&self, safe_dns: DnsList, suspicious: SuspiciousSet) -> BatchReport {
        let devices = self.inventory().await;
        self.remediate(devices, safe_dns, suspicious).await
    }

    /// Process an already fetched inventory, in order.
    pub async fn remediate(
        &self,
        devices: Vec<DeviceRecord>,
        safe_dns: DnsList,
        suspicious: SuspiciousSet,
    ) -> BatchReport {
        let run_id = Uuid::new_v4();
        let mut report = BatchReport::start(run_id, devices.len());
        let timer = Instant::now();
        let safe_dns: Arc<[String]> = safe_dns.into();
        let suspicious = Arc::new(suspicious);

        info!(
            %run_id,
            devices = devices.len(),
            safe_dns = ?safe_dns,
            suspicious = ?suspicious.sorted(),
            "starting remediation run"
        );

        let total = devices.len();
        let mut first = true;
        for (index, record) in devices.into_iter().enumerate() {
            let Some(device_id) = record.device_id() else {
                debug!(%run_id, position = index + 1, "device without id, skipping");
                continue;
            };

            if !first && !self.settings.device_delay.is_zero() {
                tokio::time::sleep(self.settings.device_delay).await;
            }
            first = false;

            debug!(%run_id, device_id = %device_id, "processing device {}/{}", index + 1, total);
            let outcome = self.process_isolated(device_id, &safe_dns, &suspicious).await;
            info!(
                %run_id,
                device_id = %outcome.device_id(),
                outcome = outcome.label(),
                "device outcome recorded"
            );
            report.record(outcome);
        }

        report.finished_at = Local::now();
        info!(
            %run_id,
            safe = report.safe.len(),
            remediated = report.remediated.len(),
            failed = report.failed.len(),
            elapsed_ms = timer.elapsed().as_millis() as u64,
            "remediation run finished"
        );
        report
    }

    async fn process_isolated(
        &self,
        device_id: DeviceId,
        safe_dns: &Arc<[String]>,
        suspicious: &Arc<SuspiciousSet>,
    ) -> RemediationOutcome {
        let api = Arc::clone(&self.api);
        let safe_dns = Arc::clone(safe_dns);
        let suspicious = Arc::clone(suspicious);
        let task_device = device_id.clone();

        let handle = tokio::spawn(async move {
            process_device(api.as_ref(), task_device, &safe_dns, &suspicious).await
        });

        match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                let detail = describe_join_error(e);
                warn!(device_id = %device_id, error = %detail, "device processing crashed");
                RemediationOutcome::failed(
                    device_id,
                    Vec::new(),
                    format!("processing error: {}", detail),
                )
            }
        }
    }
}

/// Read, classify and, when needed, rewrite one device.
pub async fn process_device(
    api: &dyn PlatformApi,
    device_id: DeviceId,
    safe_dns: &[String],
    suspicious: &SuspiciousSet,
) -> RemediationOutcome {
    let Some(current) = get_device_dns(api, &device_id).await else {
        return RemediationOutcome::failed(device_id, Vec::new(), READ_FAILURE);
    };

    if !is_suspicious(&current, suspicious) {
        return RemediationOutcome::Safe(SafeDevice {
            device_id,
            dns_before: current,
        });
    }

    debug!(device_id = %device_id, current = ?current, "suspicious DNS found, rewriting");
    if set_device_dns(api, &device_id, safe_dns).await {
        RemediationOutcome::Remediated(RemediatedDevice {
            device_id,
            dns_before: current,
            dns_after: safe_dns.to_vec(),
        })
    } else {
        RemediationOutcome::failed(device_id, current, WRITE_FAILURE)
    }
}

fn describe_join_error(e: JoinError) -> String {
    if !e.is_panic() {
        return e.to_string();
    }
    let payload = e.into_panic();
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{FakePlatform, PlatformError};

    fn settings() -> PipelineSettings {
        PipelineSettings {
            device_delay: Duration::ZERO,
            ..PipelineSettings::default()
        }
    }

    fn pipeline(fake: FakePlatform) -> (Arc<FakePlatform>, RemediationPipeline) {
        let fake = Arc::new(fake);
        let pipeline = RemediationPipeline::new(fake.clone(), settings());
        (fake, pipeline)
    }

    fn safe() -> DnsList {
        vec!["1.1.1.1".to_string(), "1.0.0.1".to_string()]
    }

    #[tokio::test]
    async fn test_categorizes_devices() {
        let (fake, pipeline) = pipeline(
            FakePlatform::new()
                .with_device("AA:01", &["8.8.8.8"])
                .with_device("AA:02", &["6.6.6.6", "8.8.8.8"])
                .with_device("AA:03", &["6.6.6.6"])
                .fail_write("AA:03", PlatformError::Timeout)
                .with_device("AA:04", &["1.1.1.1"])
                .fail_read("AA:04", PlatformError::Connect("refused".to_string())),
        );

        let report = pipeline.run(safe(), SuspiciousSet::parse("6.6.6.6")).await;

        assert_eq!(report.total_devices, 4);
        assert_eq!(report.safe.len(), 1);
        assert_eq!(report.safe[0].device_id.as_str(), "AA:01");
        assert_eq!(report.remediated.len(), 1);
        assert_eq!(report.remediated[0].dns_before, vec!["6.6.6.6", "8.8.8.8"]);
        assert_eq!(report.remediated[0].dns_after, safe());
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.failed[0].reason, WRITE_FAILURE);
        assert_eq!(report.failed[0].dns_before, vec!["6.6.6.6"]);
        assert_eq!(report.failed[1].reason, READ_FAILURE);
        assert!(report.failed[1].dns_before.is_empty());
        assert_eq!(fake.writes(), vec![("AA:02".to_string(), safe())]);
    }

    #[tokio::test]
    async fn test_devices_without_id_are_skipped() {
        let (_, pipeline) = pipeline(
            FakePlatform::new()
                .with_anonymous_device()
                .with_device("AA:01", &["1.1.1.1"])
                .with_device("", &["6.6.6.6"]),
        );

        let report = pipeline.run(safe(), SuspiciousSet::parse("6.6.6.6")).await;

        assert_eq!(report.total_devices, 3);
        assert_eq!(report.processed(), 1);
        assert_eq!(report.safe.len(), 1);
    }

    #[tokio::test]
    async fn test_whitespace_id_is_processed() {
        let (fake, pipeline) = pipeline(
            FakePlatform::new()
                .with_device(" ", &["6.6.6.6"])
                .with_device("AA:01", &["1.1.1.1"]),
        );

        let report = pipeline.run(safe(), SuspiciousSet::parse("6.6.6.6")).await;

        assert_eq!(report.total_devices, 2);
        assert_eq!(report.processed(), 2);
        assert_eq!(report.remediated.len(), 1);
        assert_eq!(report.remediated[0].device_id.as_str(), " ");
        assert_eq!(fake.dns_of(" "), Some(safe()));
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let (fake, pipeline) = pipeline(FakePlatform::new().with_device("AA:01", &["6.6.6.6"]));
        let suspicious = SuspiciousSet::parse("6.6.6.6");

        let first = pipeline.run(safe(), suspicious.clone()).await;
        let second = pipeline.run(safe(), suspicious).await;

        assert_eq!(first.remediated.len(), 1);
        assert_eq!(second.remediated.len(), 0);
        assert_eq!(second.safe.len(), 1);
        assert_eq!(second.safe[0].dns_before, safe());
        assert_eq!(fake.writes().len(), 1);
    }

    #[tokio::test]
    async fn test_panic_is_isolated_to_one_device() {
        let (_, pipeline) = pipeline(
            FakePlatform::new()
                .with_device("AA:01", &["6.6.6.6"])
                .with_device("AA:02", &["6.6.6.6"])
                .panic_on("AA:02")
                .with_device("AA:03", &["6.6.6.6"]),
        );

        let report = pipeline.run(safe(), SuspiciousSet::parse("6.6.6.6")).await;

        assert_eq!(report.remediated.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].device_id.as_str(), "AA:02");
        assert!(report.failed[0].reason.starts_with("processing error:"));
        assert!(report.failed[0].reason.contains("fake platform panic"));
    }

    #[tokio::test]
    async fn test_empty_suspicious_set_never_writes() {
        let (fake, pipeline) = pipeline(FakePlatform::new().with_device("AA:01", &["6.6.6.6"]));

        let report = pipeline.run(safe(), SuspiciousSet::default()).await;

        assert_eq!(report.safe.len(), 1);
        assert!(fake.writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_between_devices() {
        let fake = Arc::new(FakePlatform::new().with_devices(3, &["1.1.1.1"]));
        let pipeline = RemediationPipeline::new(
            fake,
            PipelineSettings {
                device_delay: Duration::from_millis(100),
                ..PipelineSettings::default()
            },
        );

        let start = tokio::time::Instant::now();
        pipeline.run(safe(), SuspiciousSet::parse("6.6.6.6")).await;

        // Two gaps between three devices
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[test]
    fn test_outcome_labels() {
        let id = DeviceId::new("AA:01").unwrap();
        let outcome = RemediationOutcome::failed(id.clone(), Vec::new(), READ_FAILURE);
        assert_eq!(outcome.label(), "failed");
        assert_eq!(outcome.device_id(), &id);
    }
}
