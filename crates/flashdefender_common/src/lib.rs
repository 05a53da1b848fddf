//! FlashDefender common library
//!
//! Device inventory, DNS inspection and remediation against a Flashman
//! device-management platform. Shared by the daemon and the CLI.

pub mod auth;
pub mod classifier;
pub mod dns_client;
pub mod inventory;
pub mod model;
pub mod pipeline;
pub mod platform;
pub mod probe;
pub mod report;

pub use auth::build_auth_header;
pub use classifier::{is_suspicious, SuspiciousSet};
pub use dns_client::{get_device_dns, set_device_dns};
pub use inventory::{fetch_online_devices, MAX_PAGE_LIMIT};
pub use model::{parse_dns_list, DeviceId, DeviceRecord, DnsList, PlatformConfig};
pub use pipeline::{
    BatchReport, FailedDevice, PipelineSettings, RemediatedDevice, RemediationOutcome,
    RemediationPipeline, SafeDevice,
};
pub use platform::{
    FakeConnector, FakePlatform, HttpConnector, HttpPlatformClient, PlatformApi, PlatformConnector,
    PlatformError,
};
pub use probe::{test_connection, ProbeOutcome, PROBE_PAGE_LIMIT};
pub use report::{
    DeviceEntry, ErrorResponse, HealthResponse, ProcessDnsInput, ProcessDnsRequest,
    ProcessDnsResponse, ReportSummary, TestConnectionRequest, TestConnectionResponse,
    MISSING_CONNECTION_FIELDS, MISSING_PROCESS_FIELDS, NO_DEVICES,
};
