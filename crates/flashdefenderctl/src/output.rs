//! Output formatting - ASCII-only terminal output
//!
//! Renderers return strings; main decides where they go.

use flashdefender_common::{DeviceEntry, ErrorResponse, ProcessDnsResponse, TestConnectionResponse};
use owo_colors::OwoColorize;
use std::fmt::Write;

fn join_dns(list: &[String]) -> String {
    if list.is_empty() {
        "-".to_string()
    } else {
        list.join(", ")
    }
}

/// One line for a test-connection result
pub fn render_connection(response: &TestConnectionResponse) -> String {
    if response.success {
        let count = response.total_devices.unwrap_or(0);
        format!(
            "{} {} ({} online devices)",
            "[OK]".bright_green(),
            response.message,
            count.to_string().bold()
        )
    } else {
        format!("{} {}", "[ERROR]".bright_red(), response.message)
    }
}

/// Error line for a run that did not start
pub fn render_error(status: u16, error: &ErrorResponse) -> String {
    format!("{} HTTP {}: {}", "[ERROR]".bright_red(), status, error.error)
}

fn render_bucket(out: &mut String, title: &str, entries: &[DeviceEntry]) {
    if entries.is_empty() {
        return;
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{} ({})", title.bold(), entries.len());
    for entry in entries {
        match &entry.error {
            Some(reason) => {
                let _ = writeln!(
                    out,
                    "  {}  {}  [{}]",
                    entry.device_id,
                    reason.bright_red(),
                    join_dns(&entry.old_dns)
                );
            }
            None => {
                let _ = writeln!(
                    out,
                    "  {}  {} -> {}",
                    entry.device_id,
                    join_dns(&entry.old_dns),
                    join_dns(&entry.new_dns)
                );
            }
        }
    }
}

/// Summary header plus one line per device per bucket
pub fn render_report(report: &ProcessDnsResponse) -> String {
    let mut out = String::new();
    let indicator = if report.failures.is_empty() {
        "[OK]".bright_green().to_string()
    } else {
        "[PARTIAL]".yellow().to_string()
    };

    let _ = writeln!(out, "{} {} (run {})", indicator, report.message, report.run_id);
    let _ = writeln!(out, "  Started:  {}", report.start_time);
    let _ = writeln!(out, "  Finished: {}", report.end_time);
    let _ = writeln!(
        out,
        "  Devices: {} total, {} safe, {} updated, {} failed",
        report.total_devices,
        report.summary.safe_count.green(),
        report.summary.success_count.cyan(),
        report.summary.failures_count.bright_red()
    );

    render_bucket(&mut out, "SAFE", &report.safe);
    render_bucket(&mut out, "UPDATED", &report.success);
    render_bucket(&mut out, "FAILED", &report.failures);
    out
}
