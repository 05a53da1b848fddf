//! Suspicious DNS classification.

use std::collections::HashSet;

/// Deny-list of DNS servers presumed to indicate a hijacked configuration.
///
/// Entries are stored trimmed; empty entries are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuspiciousSet {
    entries: HashSet<String>,
}

impl SuspiciousSet {
    /// Parse a comma-separated list such as `"1.2.3.4, 5.6.7.8"`.
    pub fn parse(csv: &str) -> Self {
        csv.split(',').collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, dns: &str) -> bool {
        self.entries.contains(dns.trim())
    }

    /// Entries in sorted order, for logs and display.
    pub fn sorted(&self) -> Vec<&str> {
        let mut entries: Vec<&str> = self.entries.iter().map(String::as_str).collect();
        entries.sort_unstable();
        entries
    }
}

impl<S: AsRef<str>> FromIterator<S> for SuspiciousSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let entries = iter
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Self { entries }
    }
}

/// True if any of the device's current DNS servers is in the deny-list.
///
/// Either side being empty means "not suspicious". Comparison is exact
/// after trimming whitespace (case-sensitive).
pub fn is_suspicious(current_dns: &[String], suspicious: &SuspiciousSet) -> bool {
    if current_dns.is_empty() || suspicious.is_empty() {
        return false;
    }
    current_dns.iter().any(|dns| suspicious.contains(dns))
}
