//! Core data types shared across the remediation pipeline.

use crate::auth::build_auth_header;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered list of DNS server addresses. Order is kept for display and for
/// writes; classification only looks at membership.
pub type DnsList = Vec<String>;

/// Connection parameters for one Flashman instance.
///
/// Immutable for the duration of a run. The auth token is never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    endpoint_url: String,
    auth_token: String,
}

impl PlatformConfig {
    /// Build a config from a base URL and credentials. Trailing slashes are
    /// stripped from the URL.
    pub fn new(endpoint_url: &str, username: &str, password: &str) -> Self {
        Self::with_token(endpoint_url, build_auth_header(username, password))
    }

    /// Build a config from a base URL and a prebuilt `Authorization` value.
    pub fn with_token(endpoint_url: &str, auth_token: String) -> Self {
        Self {
            endpoint_url: endpoint_url.trim().trim_end_matches('/').to_string(),
            auth_token,
        }
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }
}

impl fmt::Debug for PlatformConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformConfig")
            .field("endpoint_url", &self.endpoint_url)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

/// MAC-address-shaped identifier of a managed device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Returns `None` for an empty identifier. Any other value, whitespace
    /// included, is kept verbatim.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Form used inside a URL path segment (`:` becomes `%3A`).
    pub fn path_segment(&self) -> String {
        self.0.replace(':', "%3A")
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry of the device search result. The platform may omit `_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl DeviceRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()) }
    }

    /// Record without an identifier, as the platform sometimes returns.
    pub fn anonymous() -> Self {
        Self { id: None }
    }

    /// Usable identifier, if any.
    pub fn device_id(&self) -> Option<DeviceId> {
        self.id.clone().and_then(DeviceId::new)
    }
}

/// Split a comma-separated DNS list, trimming entries and dropping empty ones.
pub fn parse_dns_list(csv: &str) -> DnsList {
    csv.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_config_strips_trailing_slash() {
        let config = PlatformConfig::new("https://flashman.example.com/", "u", "p");
        assert_eq!(config.endpoint_url(), "https://flashman.example.com");

        let config = PlatformConfig::new("http://10.0.0.1:8000///", "u", "p");
        assert_eq!(config.endpoint_url(), "http://10.0.0.1:8000");
    }

    #[test]
    fn test_platform_config_debug_hides_token() {
        let config = PlatformConfig::new("http://flashman", "admin", "secret");
        let debug = format!("{:?}", config);
        assert!(debug.contains("http://flashman"));
        assert!(!debug.contains(config.auth_token()));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_device_id_path_segment() {
        let id = DeviceId::new("AA:BB:CC:DD:EE:FF").unwrap();
        assert_eq!(id.path_segment(), "AA%3ABB%3ACC%3ADD%3AEE%3AFF");
        assert_eq!(id.to_string(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn test_device_id_rejects_empty() {
        assert!(DeviceId::new("").is_none());
        assert_eq!(DeviceId::new("   ").unwrap().as_str(), "   ");
    }

    #[test]
    fn test_device_record_deserialize() {
        let records: Vec<DeviceRecord> =
            serde_json::from_str(r#"[{"_id":"AA:BB"},{},{"_id":""},{"_id":" "}]"#).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].device_id().unwrap().as_str(), "AA:BB");
        assert!(records[1].device_id().is_none());
        assert!(records[2].device_id().is_none());
        assert_eq!(records[3].device_id().unwrap().as_str(), " ");
    }

    #[test]
    fn test_parse_dns_list() {
        assert_eq!(
            parse_dns_list(" 1.1.1.1, 8.8.8.8 ,,"),
            vec!["1.1.1.1".to_string(), "8.8.8.8".to_string()]
        );
        assert!(parse_dns_list("").is_empty());
        assert!(parse_dns_list(" , ").is_empty());
    }
}
