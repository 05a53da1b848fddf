//! Request and response bodies of the daemon's HTTP API.
//!
//! Field names follow the front end's existing contract (`flashman_url`,
//! `default_dns`, `dns_to_delete`, bucket `success` for remediated devices).

use crate::classifier::SuspiciousSet;
use crate::model::{parse_dns_list, DnsList, PlatformConfig};
use crate::pipeline::{BatchReport, FailedDevice, RemediatedDevice, SafeDevice};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Display format of `start_time` / `end_time`.
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

pub const SAFE_MESSAGE: &str = "Device already uses safe DNS";
pub const REMEDIATED_MESSAGE: &str = "DNS updated";
pub const FINISHED_MESSAGE: &str = "Processing finished";

pub const MISSING_CONNECTION_FIELDS: &str = "Flashman URL, username and password are required";
pub const MISSING_PROCESS_FIELDS: &str = "All fields are required";
pub const NO_DEVICES: &str = "No devices found";

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestConnectionRequest {
    #[serde(default)]
    pub flashman_url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl TestConnectionRequest {
    /// Platform config if every field is present and non-empty.
    pub fn platform_config(&self) -> Option<PlatformConfig> {
        Some(PlatformConfig::new(
            present(&self.flashman_url)?,
            present(&self.username)?,
            present(&self.password)?,
        ))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessDnsRequest {
    #[serde(default)]
    pub flashman_url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Comma-separated safe DNS list written to remediated devices
    #[serde(default)]
    pub default_dns: Option<String>,
    /// Comma-separated suspicious DNS list
    #[serde(default)]
    pub dns_to_delete: Option<String>,
}

/// Validated inputs of a process-dns run.
#[derive(Debug, Clone)]
pub struct ProcessDnsInput {
    pub platform: PlatformConfig,
    pub safe_dns: DnsList,
    pub suspicious: SuspiciousSet,
}

impl ProcessDnsRequest {
    /// Validated inputs, or `None` if any field is missing or a DNS list
    /// has no usable entries.
    pub fn validate(&self) -> Option<ProcessDnsInput> {
        let platform = PlatformConfig::new(
            present(&self.flashman_url)?,
            present(&self.username)?,
            present(&self.password)?,
        );
        let safe_dns = parse_dns_list(present(&self.default_dns)?);
        let suspicious = SuspiciousSet::parse(present(&self.dns_to_delete)?);
        if safe_dns.is_empty() || suspicious.is_empty() {
            return None;
        }
        Some(ProcessDnsInput {
            platform,
            safe_dns,
            suspicious,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestConnectionResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_devices: Option<usize>,
}

impl TestConnectionResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            total_devices: None,
        }
    }
}

/// Error body of process-dns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// One device line in a report bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub device_id: String,
    pub old_dns: DnsList,
    pub new_dns: DnsList,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&SafeDevice> for DeviceEntry {
    fn from(d: &SafeDevice) -> Self {
        Self {
            device_id: d.device_id.to_string(),
            old_dns: d.dns_before.clone(),
            new_dns: d.dns_before.clone(),
            message: Some(SAFE_MESSAGE.to_string()),
            error: None,
        }
    }
}

impl From<&RemediatedDevice> for DeviceEntry {
    fn from(d: &RemediatedDevice) -> Self {
        Self {
            device_id: d.device_id.to_string(),
            old_dns: d.dns_before.clone(),
            new_dns: d.dns_after.clone(),
            message: Some(REMEDIATED_MESSAGE.to_string()),
            error: None,
        }
    }
}

impl From<&FailedDevice> for DeviceEntry {
    fn from(d: &FailedDevice) -> Self {
        Self {
            device_id: d.device_id.to_string(),
            old_dns: d.dns_before.clone(),
            new_dns: Vec::new(),
            message: None,
            error: Some(d.reason.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub safe_count: usize,
    pub success_count: usize,
    pub failures_count: usize,
}

/// Body of a completed process-dns run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessDnsResponse {
    pub run_id: String,
    pub message: String,
    pub start_time: String,
    pub end_time: String,
    pub total_devices: usize,
    pub safe: Vec<DeviceEntry>,
    /// Remediated devices
    pub success: Vec<DeviceEntry>,
    pub failures: Vec<DeviceEntry>,
    pub summary: ReportSummary,
}

fn format_timestamp(ts: &DateTime<Local>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

impl From<&BatchReport> for ProcessDnsResponse {
    fn from(report: &BatchReport) -> Self {
        Self {
            run_id: report.run_id.to_string(),
            message: FINISHED_MESSAGE.to_string(),
            start_time: format_timestamp(&report.started_at),
            end_time: format_timestamp(&report.finished_at),
            total_devices: report.total_devices,
            safe: report.safe.iter().map(DeviceEntry::from).collect(),
            success: report.remediated.iter().map(DeviceEntry::from).collect(),
            failures: report.failed.iter().map(DeviceEntry::from).collect(),
            summary: ReportSummary {
                safe_count: report.safe.len(),
                success_count: report.remediated.len(),
                failures_count: report.failed.len(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DeviceId;
    use crate::pipeline::{READ_FAILURE, WRITE_FAILURE};
    use chrono::TimeZone;
    use uuid::Uuid;

    fn id(s: &str) -> DeviceId {
        DeviceId::new(s).unwrap()
    }

    fn strings(list: &[&str]) -> DnsList {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn sample_report() -> BatchReport {
        let started_at = Local.with_ymd_and_hms(2025, 3, 7, 9, 5, 1).unwrap();
        let finished_at = Local.with_ymd_and_hms(2025, 3, 7, 9, 6, 30).unwrap();
        BatchReport {
            run_id: Uuid::nil(),
            started_at,
            finished_at,
            total_devices: 5,
            safe: vec![SafeDevice {
                device_id: id("AA:01"),
                dns_before: strings(&["1.1.1.1"]),
            }],
            remediated: vec![RemediatedDevice {
                device_id: id("AA:02"),
                dns_before: strings(&["6.6.6.6"]),
                dns_after: strings(&["1.1.1.1", "1.0.0.1"]),
            }],
            failed: vec![
                FailedDevice {
                    device_id: id("AA:03"),
                    dns_before: Vec::new(),
                    reason: READ_FAILURE.to_string(),
                },
                FailedDevice {
                    device_id: id("AA:04"),
                    dns_before: strings(&["6.6.6.6"]),
                    reason: WRITE_FAILURE.to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_response_shape() {
        let response = ProcessDnsResponse::from(&sample_report());
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["start_time"], "07/03/2025 09:05:01");
        assert_eq!(json["end_time"], "07/03/2025 09:06:30");
        assert_eq!(json["total_devices"], 5);
        assert_eq!(json["message"], FINISHED_MESSAGE);
        assert_eq!(
            json["summary"],
            serde_json::json!({"safe_count": 1, "success_count": 1, "failures_count": 2})
        );
        assert_eq!(
            json["safe"][0],
            serde_json::json!({
                "device_id": "AA:01",
                "old_dns": ["1.1.1.1"],
                "new_dns": ["1.1.1.1"],
                "message": SAFE_MESSAGE,
            })
        );
        assert_eq!(json["success"][0]["new_dns"], serde_json::json!(["1.1.1.1", "1.0.0.1"]));
        assert_eq!(
            json["failures"][1],
            serde_json::json!({
                "device_id": "AA:04",
                "old_dns": ["6.6.6.6"],
                "new_dns": [],
                "error": WRITE_FAILURE,
            })
        );
    }

    #[test]
    fn test_response_parses_back() {
        let response = ProcessDnsResponse::from(&sample_report());
        let text = serde_json::to_string(&response).unwrap();
        let parsed: ProcessDnsResponse = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, response);
    }

    #[test]
    fn test_process_request_validation() {
        let mut request = ProcessDnsRequest {
            flashman_url: Some("http://flashman/".to_string()),
            username: Some("admin".to_string()),
            password: Some("secret".to_string()),
            default_dns: Some("1.1.1.1, 1.0.0.1".to_string()),
            dns_to_delete: Some("6.6.6.6".to_string()),
        };
        let input = request.validate().unwrap();
        assert_eq!(input.platform.endpoint_url(), "http://flashman");
        assert_eq!(input.safe_dns, strings(&["1.1.1.1", "1.0.0.1"]));
        assert!(input.suspicious.contains("6.6.6.6"));

        request.password = Some("  ".to_string());
        assert!(request.validate().is_none());

        request.password = Some("secret".to_string());
        request.default_dns = Some(" , ".to_string());
        assert!(request.validate().is_none());

        request.default_dns = None;
        assert!(request.validate().is_none());
    }

    #[test]
    fn test_connection_request_missing_fields() {
        let request: TestConnectionRequest =
            serde_json::from_str(r#"{"flashman_url": "http://x", "username": "u"}"#).unwrap();
        assert!(request.platform_config().is_none());

        let request: TestConnectionRequest = serde_json::from_str(
            r#"{"flashman_url": "http://x", "username": "u", "password": "p"}"#,
        )
        .unwrap();
        assert!(request.platform_config().is_some());
    }

    #[test]
    fn test_connection_response_omits_missing_count() {
        let json = serde_json::to_value(TestConnectionResponse::failure("nope")).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "message": "nope"}));
    }
}
