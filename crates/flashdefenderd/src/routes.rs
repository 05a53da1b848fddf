//! API routes for flashdefenderd
//!
//! POST /api/test-connection - validate Flashman URL and credentials
//! POST /api/process-dns     - scan all online devices and rewrite suspicious DNS
//! GET  /api/health          - liveness

use crate::server::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use flashdefender_common::{
    test_connection, ErrorResponse, HealthResponse, PlatformError, ProbeOutcome,
    ProcessDnsRequest, ProcessDnsResponse, RemediationPipeline, TestConnectionRequest,
    TestConnectionResponse, MISSING_CONNECTION_FIELDS, MISSING_PROCESS_FIELDS, NO_DEVICES,
};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

type AppStateArc = Arc<AppState>;

/// Request body, or its default when the body is missing or malformed.
/// Validation then reports the missing fields.
fn body_or_default<T: Default>(body: Result<Json<T>, JsonRejection>) -> T {
    match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!("  Unreadable request body: {}", rejection);
            T::default()
        }
    }
}

/// Run one request's platform work in its own task. Connector errors and
/// panics both come back as an error string for a 500 response.
async fn run_guarded<F, T>(work: F) -> Result<T, String>
where
    F: Future<Output = Result<T, PlatformError>> + Send + 'static,
    T: Send + 'static,
{
    match tokio::spawn(work).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.to_string()),
        Err(e) => Err(e.to_string()),
    }
}

// ============================================================================
// Flashman Routes
// ============================================================================

pub fn flashman_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/api/test-connection", post(test_connection_route))
        .route("/api/process-dns", post(process_dns_route))
}

async fn test_connection_route(
    State(state): State<AppStateArc>,
    body: Result<Json<TestConnectionRequest>, JsonRejection>,
) -> (StatusCode, Json<TestConnectionResponse>) {
    let request: TestConnectionRequest = body_or_default(body);
    let Some(platform) = request.platform_config() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(TestConnectionResponse::failure(MISSING_CONNECTION_FIELDS)),
        );
    };

    info!("  Testing connection to {}", platform.endpoint_url());
    let connector = Arc::clone(&state.connector);
    let page_limit = state.settings.page_limit;

    let result = run_guarded(async move {
        let api = connector.connect(platform)?;
        Ok(test_connection(api.as_ref(), page_limit).await)
    })
    .await;

    match result {
        Ok(outcome) => connection_response(outcome),
        Err(e) => {
            error!("  Connection test failed unexpectedly: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(TestConnectionResponse::failure(format!("Internal error: {}", e))),
            )
        }
    }
}

/// Map a probe outcome to the status code the front end expects.
pub fn connection_response(outcome: ProbeOutcome) -> (StatusCode, Json<TestConnectionResponse>) {
    let (status, message) = match outcome {
        ProbeOutcome::Connected { device_count } => {
            return (
                StatusCode::OK,
                Json(TestConnectionResponse {
                    success: true,
                    message: "Connection established".to_string(),
                    total_devices: Some(device_count),
                }),
            );
        }
        ProbeOutcome::TimedOut => (StatusCode::REQUEST_TIMEOUT, "API connection timed out"),
        ProbeOutcome::Unreachable(_) => (StatusCode::SERVICE_UNAVAILABLE, "Could not connect to the API"),
        ProbeOutcome::Rejected(_) => (
            StatusCode::UNAUTHORIZED,
            "Authentication or connection to the API failed",
        ),
    };
    (status, Json(TestConnectionResponse::failure(message)))
}

async fn process_dns_route(
    State(state): State<AppStateArc>,
    body: Result<Json<ProcessDnsRequest>, JsonRejection>,
) -> Response {
    let request: ProcessDnsRequest = body_or_default(body);
    let Some(input) = request.validate() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(MISSING_PROCESS_FIELDS)),
        )
            .into_response();
    };

    info!(
        url = input.platform.endpoint_url(),
        safe_dns = ?input.safe_dns,
        suspicious = ?input.suspicious.sorted(),
        "  Starting DNS processing"
    );
    let connector = Arc::clone(&state.connector);
    let settings = state.settings;

    let result = run_guarded(async move {
        let api = connector.connect(input.platform)?;
        let pipeline = RemediationPipeline::new(api, settings);
        let devices = pipeline.inventory().await;
        if devices.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            pipeline
                .remediate(devices, input.safe_dns, input.suspicious)
                .await,
        ))
    })
    .await;

    match result {
        Ok(Some(report)) => {
            (StatusCode::OK, Json(ProcessDnsResponse::from(&report))).into_response()
        }
        Ok(None) => {
            warn!("  {}", NO_DEVICES);
            (StatusCode::NOT_FOUND, Json(ErrorResponse::new(NO_DEVICES))).into_response()
        }
        Err(e) => {
            error!("  DNS processing failed unexpectedly: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(format!("Internal error: {}", e))),
            )
                .into_response()
        }
    }
}

// ============================================================================
// Health Routes
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/api/health", get(health_check))
}

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_status_mapping() {
        let (status, Json(body)) = connection_response(ProbeOutcome::Connected { device_count: 7 });
        assert_eq!(status, StatusCode::OK);
        assert!(body.success);
        assert_eq!(body.total_devices, Some(7));

        let cases = [
            (ProbeOutcome::TimedOut, StatusCode::REQUEST_TIMEOUT),
            (
                ProbeOutcome::Unreachable("refused".to_string()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                ProbeOutcome::Rejected("HTTP 401".to_string()),
                StatusCode::UNAUTHORIZED,
            ),
        ];
        for (outcome, expected) in cases {
            let (status, Json(body)) = connection_response(outcome);
            assert_eq!(status, expected);
            assert!(!body.success);
            assert!(body.total_devices.is_none());
        }
    }

    async fn explode() -> Result<(), PlatformError> {
        panic!("boom")
    }

    #[tokio::test]
    async fn test_run_guarded_catches_panics() {
        let result = run_guarded(explode()).await;
        assert!(result.is_err());

        let result = run_guarded(async { Err::<(), _>(PlatformError::Timeout) }).await;
        assert_eq!(result, Err("request timed out".to_string()));
    }
}
