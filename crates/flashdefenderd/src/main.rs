//! FlashDefender Daemon
//!
//! HTTP service that scans Flashman-managed routers for hijacked DNS and
//! rewrites them with a safe list.

use anyhow::Result;
use flashdefender_common::HttpConnector;
use flashdefenderd::config::Config;
use flashdefenderd::server::{self, AppState};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("[BOOT] flashdefenderd v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Config::load();
    let settings = config.to_pipeline_settings();
    info!(
        "[BOOT] Config loaded (page_limit={}, device_delay={:?}, request_timeout={:?})",
        settings.page_limit, settings.device_delay, settings.request_timeout
    );

    let connector = Arc::new(HttpConnector::new(settings.request_timeout));
    let state = AppState::new(connector, settings);

    server::run(state, &config.server.bind).await
}
