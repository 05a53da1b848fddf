//! CLI - Command-line argument parsing
//!
//! Defines the CLI structure using clap.
//! Keeps argument parsing separate from execution logic.

use crate::client::DEFAULT_DAEMON_URL;
use clap::{Args, Parser, Subcommand};
use flashdefender_common::{ProcessDnsRequest, TestConnectionRequest};

/// Log filter used when RUST_LOG is unset
pub const DEFAULT_LOG_FILTER: &str = "info";

/// FlashDefender CLI
#[derive(Parser, Debug)]
#[command(name = "flashdefenderctl")]
#[command(about = "FlashDefender - find and fix hijacked router DNS on Flashman", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Base URL of flashdefenderd
    #[arg(long, global = true, default_value = DEFAULT_DAEMON_URL)]
    pub daemon: String,

    /// Print the raw JSON response
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check Flashman URL and credentials, count online devices
    TestConnection {
        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Scan online devices and replace suspicious DNS servers
    ProcessDns {
        #[command(flatten)]
        connection: ConnectionArgs,

        /// Comma-separated safe DNS list written to affected devices
        #[arg(long)]
        default_dns: String,

        /// Comma-separated DNS servers considered hijacked
        #[arg(long)]
        dns_to_delete: String,

        /// Run the scan in this process instead of through the daemon
        #[arg(long)]
        direct: bool,
    },
}

/// Flashman endpoint and credentials
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Flashman base URL, e.g. https://flashman.example.net
    #[arg(long)]
    pub url: String,

    #[arg(long)]
    pub username: String,

    #[arg(long)]
    pub password: String,
}

impl ConnectionArgs {
    pub fn to_test_request(&self) -> TestConnectionRequest {
        TestConnectionRequest {
            flashman_url: Some(self.url.clone()),
            username: Some(self.username.clone()),
            password: Some(self.password.clone()),
        }
    }

    pub fn to_process_request(&self, default_dns: &str, dns_to_delete: &str) -> ProcessDnsRequest {
        ProcessDnsRequest {
            flashman_url: Some(self.url.clone()),
            username: Some(self.username.clone()),
            password: Some(self.password.clone()),
            default_dns: Some(default_dns.to_string()),
            dns_to_delete: Some(dns_to_delete.to_string()),
        }
    }
}
