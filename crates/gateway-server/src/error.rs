//! Error types for the HTTP layer.

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use gateway_core::{ErrorBody, GatewayError};
use gateway_telemetry::TelemetryError;

/// Error returned by route handlers.
///
/// Renders as the gateway's `{error, message}` body. Server-side detail stays
/// in the wrapped [`GatewayError`] and never reaches the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError(pub GatewayError);

impl ApiError {
    /// Client body for this error
    #[must_use]
    pub fn body(&self) -> ErrorBody {
        self.0.to_body()
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0.status_code(), Json(self.body())).into_response()
    }
}

/// Error starting or running the server
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Could not bind the listener
    #[error("Failed to bind {address}: {source}")]
    Bind {
        /// Address that was requested
        address: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The accept loop failed
    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),

    /// Metrics could not be created
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// The upstream client could not be created
    #[error("Failed to create forwarder: {0}")]
    Forwarder(#[source] GatewayError),
}
