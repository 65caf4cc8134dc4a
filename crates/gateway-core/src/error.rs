//! Error types for the gateway.
//!
//! `GatewayError` carries two views of a failure: its `Display` output is the
//! full server-side detail that goes to the logs, while [`GatewayError::to_body`]
//! produces the `{error, message}` pair that is allowed to reach the client.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result alias used across the gateway crates.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Generic client message for upstream failures with no usable detail.
pub const BACKEND_SERVICE_ERROR: &str = "Backend service error";

/// Client message for a missing upstream target.
pub const BACKEND_NOT_CONFIGURED: &str = "Backend service not configured";

/// Client message for anything the gateway did not anticipate.
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred. Please try again.";

/// Fixed, client-visible error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// `user_id` missing, empty or not a string
    InvalidUserId,
    /// `text` missing, blank or not a string
    InvalidText,
    /// `text` longer than the permitted number of characters
    TextTooLong,
    /// HTTP method other than `POST`/`OPTIONS`
    MethodNotAllowed,
    /// Upstream target not configured
    Configuration,
    /// Upstream answered with an error or could not be reached
    Backend,
    /// Catch-all for gateway faults
    Internal,
}

impl ErrorCategory {
    /// The `error` tag sent to clients.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidUserId => "Invalid user_id",
            Self::InvalidText => "Invalid text",
            Self::TextTooLong => "Text too long",
            Self::MethodNotAllowed => "Method not allowed",
            Self::Configuration => "Configuration error",
            Self::Backend => "Backend error",
            Self::Internal => "Internal server error",
        }
    }

    /// HTTP status reported for this category.
    #[must_use]
    pub const fn status_code(self) -> StatusCode {
        match self {
            Self::InvalidUserId | Self::InvalidText | Self::TextTooLong => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Configuration | Self::Backend | Self::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short label used for metrics.
    #[must_use]
    pub const fn metric_label(self) -> &'static str {
        match self {
            Self::InvalidUserId | Self::InvalidText | Self::TextTooLong => "validation",
            Self::MethodNotAllowed => "method_not_allowed",
            Self::Configuration => "configuration",
            Self::Backend => "backend",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire shape of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Category tag
    pub error: String,
    /// Human readable, safe to display
    pub message: String,
}

/// Gateway error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// `user_id` failed validation
    #[error("invalid user_id: {reason}")]
    InvalidUserId {
        /// What was wrong with the field
        reason: &'static str,
    },

    /// `text` failed validation
    #[error("invalid text: {reason}")]
    InvalidText {
        /// What was wrong with the field
        reason: &'static str,
    },

    /// `text` exceeded the character limit
    #[error("text too long: {actual} characters, limit is {max}")]
    TextTooLong {
        /// Characters received
        actual: usize,
        /// Characters allowed
        max: usize,
    },

    /// Method rejected by the route's method policy
    #[error("method {method} not allowed")]
    MethodNotAllowed {
        /// Offending method
        method: String,
    },

    /// The upstream base URL is absent or unusable
    #[error("configuration error: {reason}")]
    Configuration {
        /// Operator-facing reason
        reason: String,
    },

    /// The upstream failed or returned a non-2xx status
    #[error("upstream error (status {status:?}): {detail}")]
    Upstream {
        /// Message that may be shown to the client
        message: String,
        /// Upstream HTTP status, if a response was received
        status: Option<u16>,
        /// Operator-facing detail
        detail: String,
        /// Whether a retry could plausibly succeed
        retryable: bool,
    },

    /// Unexpected fault inside the gateway
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Create a configuration error
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Upstream answered with a non-2xx status.
    ///
    /// `client_message` is the best-effort extraction from the upstream body;
    /// `None` falls back to the generic message.
    pub fn upstream_status(
        status: u16,
        client_message: Option<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::Upstream {
            message: client_message.unwrap_or_else(|| BACKEND_SERVICE_ERROR.to_string()),
            status: Some(status),
            detail: detail.into(),
            retryable: matches!(status, 502..=504),
        }
    }

    /// Upstream could not be reached or its answer could not be read.
    pub fn upstream_transport(detail: impl Into<String>, retryable: bool) -> Self {
        Self::Upstream {
            message: BACKEND_SERVICE_ERROR.to_string(),
            status: None,
            detail: detail.into(),
            retryable,
        }
    }

    /// Create an internal error
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal(detail.into())
    }

    /// Client-visible category
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidUserId { .. } => ErrorCategory::InvalidUserId,
            Self::InvalidText { .. } => ErrorCategory::InvalidText,
            Self::TextTooLong { .. } => ErrorCategory::TextTooLong,
            Self::MethodNotAllowed { .. } => ErrorCategory::MethodNotAllowed,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Upstream { .. } => ErrorCategory::Backend,
            Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// HTTP status returned to the client. Upstream statuses are never passed through.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category().status_code()
    }

    /// Message safe to show to the client
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::InvalidUserId { .. } => "user_id is required and must be a string".to_string(),
            Self::InvalidText { .. } => {
                "text is required and must be a non-empty string".to_string()
            }
            Self::TextTooLong { max, .. } => format!("text must be less than {max} characters"),
            Self::MethodNotAllowed { .. } => "Only POST requests are supported".to_string(),
            Self::Configuration { .. } => BACKEND_NOT_CONFIGURED.to_string(),
            Self::Upstream { message, .. } => message.clone(),
            Self::Internal(_) => UNEXPECTED_ERROR.to_string(),
        }
    }

    /// Build the `{error, message}` body
    #[must_use]
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.category().as_str().to_string(),
            message: self.client_message(),
        }
    }

    /// Check if the error is retryable
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream { retryable: true, .. })
    }

    /// Check if this is a client input error
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}
