//! In-process DNS processing, without a running daemon.
//!
//! Mirrors the daemon's process-dns route: same validation, same report.

use crate::client::ProcessReply;
use anyhow::{Context, Result};
use flashdefender_common::{
    ErrorResponse, PipelineSettings, PlatformConnector, ProcessDnsRequest, ProcessDnsResponse,
    RemediationPipeline, MISSING_PROCESS_FIELDS, NO_DEVICES,
};
use tracing::info;

pub async fn process_dns(
    connector: &dyn PlatformConnector,
    request: &ProcessDnsRequest,
    settings: PipelineSettings,
) -> Result<ProcessReply> {
    let Some(input) = request.validate() else {
        return Ok(ProcessReply::Refused {
            status: 400,
            error: ErrorResponse::new(MISSING_PROCESS_FIELDS),
        });
    };

    let api = connector
        .connect(input.platform)
        .context("Failed to create Flashman client")?;
    let pipeline = RemediationPipeline::new(api, settings);

    let devices = pipeline.inventory().await;
    if devices.is_empty() {
        return Ok(ProcessReply::Refused {
            status: 404,
            error: ErrorResponse::new(NO_DEVICES),
        });
    }
    info!(devices = devices.len(), "processing locally");

    let report = pipeline
        .remediate(devices, input.safe_dns, input.suspicious)
        .await;
    Ok(ProcessReply::Finished(ProcessDnsResponse::from(&report)))
}
