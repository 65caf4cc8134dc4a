//! HTTP request handlers for the gateway API.

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::IntoResponse,
    Json,
};
use gateway_core::{sanitize, validate, GatewayError, SanitizedResponse, MAX_TEXT_CHARS};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    error::ApiError,
    extractors::{RawJson, RequestId, MAX_BODY_BYTES},
    state::AppState,
};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Version
    pub version: String,
    /// Whether an upstream URL is set
    pub upstream_configured: bool,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        upstream_configured: state.config.upstream.is_configured(),
    })
}

/// Metrics endpoint (Prometheus format)
pub async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let metrics = state.metrics.gather();
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics,
    )
}

/// CORS preflight on the route endpoints. Headers come from the CORS middleware.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Any method other than `POST` or `OPTIONS` on the route endpoints
pub async fn method_not_allowed(State(state): State<AppState>, method: Method) -> ApiError {
    debug!(method = %method, "Rejected method");
    let err = GatewayError::MethodNotAllowed {
        method: method.to_string(),
    };
    state.metrics.record_request(err.category().metric_label());
    err.into()
}

/// Route a user request to the agent-routing service.
///
/// Validates the body, forwards it upstream and returns the sanitized
/// answer. Every failure is mapped to the fixed `{error, message}` shape.
#[instrument(skip_all, fields(request_id = %request_id))]
pub async fn route_request(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    body: RawJson,
) -> Result<Json<SanitizedResponse>, ApiError> {
    let result = match body {
        RawJson::Parsed(body) => process_route(&state, &request_id, body).await,
        RawJson::TooLarge => Err(body_too_large()),
    };

    match &result {
        Ok(response) => {
            state.metrics.record_request("success");
            info!(risk = %response.risk, "Route request completed");
        }
        Err(e) => {
            state.metrics.record_request(e.category().metric_label());
            if e.is_client_error() {
                warn!(error = %e, "Route request rejected");
            } else {
                error!(error = %e, "Route request failed");
            }
        }
    }

    result.map(Json).map_err(ApiError::from)
}

/// A body over the buffering limit cannot hold an acceptable `text`
fn body_too_large() -> GatewayError {
    warn!(limit_bytes = MAX_BODY_BYTES, "Request body exceeds limit");
    GatewayError::TextTooLong {
        actual: MAX_BODY_BYTES,
        max: MAX_TEXT_CHARS,
    }
}

async fn process_route(
    state: &AppState,
    request_id: &str,
    body: Value,
) -> Result<SanitizedResponse, GatewayError> {
    let request = validate(body)?;
    let base_url = state.config.upstream.resolve_url()?;

    let started = Instant::now();
    let outcome = state.forwarder.forward(&request, &base_url, request_id).await;
    state.metrics.record_upstream_latency(started.elapsed());

    if let Err(GatewayError::Upstream { status, .. }) = &outcome {
        let kind = status.map_or_else(|| "transport".to_string(), |code| format!("status_{code}"));
        state.metrics.record_upstream_error(&kind);
    }

    Ok(sanitize(outcome?))
}
