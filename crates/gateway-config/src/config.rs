//! Configuration types.

use gateway_core::GatewayError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::error;
use url::Url;
use validator::{Validate, ValidationError};

/// Top-level gateway configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP listener settings
    #[validate(nested)]
    pub server: ServerSettings,

    /// Agent-routing service settings
    #[validate(nested)]
    pub upstream: UpstreamSettings,

    /// Log output settings
    #[validate(nested)]
    pub logging: LoggingSettings,
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ServerSettings {
    /// Address to bind to
    #[validate(length(min = 1))]
    pub host: String,

    /// Port to bind to
    #[validate(range(min = 1))]
    pub port: u16,

    /// How long in-flight requests get to finish on shutdown
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl ServerSettings {
    /// `host:port` string for binding
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Agent-routing service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct UpstreamSettings {
    /// Base URL of the agent-routing service. Requests fail while unset.
    pub url: Option<String>,

    /// Upper bound on a single upstream round-trip
    #[serde(with = "humantime_serde")]
    #[validate(custom(function = "validate_timeout"))]
    pub timeout: Duration,

    /// Extra attempts after a retryable failure. Zero disables retries.
    #[validate(range(max = 5))]
    pub max_retries: u32,

    /// Base delay before the first retry
    #[serde(with = "humantime_serde")]
    pub retry_base_delay: Duration,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            url: None,
            timeout: Duration::from_secs(30),
            max_retries: 0,
            retry_base_delay: Duration::from_millis(200),
        }
    }
}

impl UpstreamSettings {
    /// Settings pointing at `url`
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Whether a non-blank URL is present
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.url.as_deref().is_some_and(|url| !url.trim().is_empty())
    }

    /// Resolve the upstream base URL for a request.
    ///
    /// An absent or unparseable URL is a per-request failure rather than a
    /// startup failure. The reason is logged; the returned error carries only
    /// the generic client message.
    ///
    /// # Errors
    /// Returns [`GatewayError::Configuration`] when no usable URL is configured
    pub fn resolve_url(&self) -> Result<Url, GatewayError> {
        let raw = match self.url.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => raw,
            _ => {
                error!("Upstream URL is not configured");
                return Err(GatewayError::configuration("upstream url is not set"));
            }
        };

        let url = Url::parse(raw).map_err(|e| {
            error!(error = %e, "Upstream URL is not a valid URL");
            GatewayError::configuration(format!("upstream url is invalid: {e}"))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            error!(scheme = %url.scheme(), "Upstream URL has an unsupported scheme");
            return Err(GatewayError::configuration(format!(
                "upstream url scheme '{}' is not http(s)",
                url.scheme()
            )));
        }

        Ok(url)
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default level when `RUST_LOG` is unset
    #[validate(custom(function = "validate_level"))]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

fn validate_level(level: &str) -> Result<(), ValidationError> {
    match level.to_ascii_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ValidationError::new("unknown_log_level")),
    }
}

fn validate_timeout(timeout: &Duration) -> Result<(), ValidationError> {
    if timeout.is_zero() {
        return Err(ValidationError::new("zero_timeout"));
    }
    Ok(())
}
