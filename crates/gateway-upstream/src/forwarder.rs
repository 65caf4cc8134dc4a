//! Forwarding validated requests to the agent-routing service.

use async_trait::async_trait;
use gateway_config::UpstreamSettings;
use gateway_core::{GatewayError, UpstreamRequest, UpstreamResponse};
use gateway_resilience::RetryPolicy;
use reqwest::{header, Client};
use serde_json::Value;
use tracing::{debug, error, warn};
use url::Url;

/// Longest upstream error body copied into the logs
const MAX_LOGGED_BODY: usize = 512;

/// Sends a validated request upstream and returns the parsed payload
#[async_trait]
pub trait Forwarder: Send + Sync {
    /// Forward `request` to `{base_url}/route`.
    ///
    /// # Errors
    /// Returns [`GatewayError::Upstream`] for non-2xx answers and transport failures
    async fn forward(
        &self,
        request: &UpstreamRequest,
        base_url: &Url,
        request_id: &str,
    ) -> Result<UpstreamResponse, GatewayError>;
}

/// Build the `/route` endpoint URL from a base URL.
///
/// Any path prefix and query string on the base are kept; a fragment is dropped.
///
/// # Errors
/// Returns an internal error if the base URL cannot carry a path
pub fn route_url(base_url: &Url) -> Result<Url, GatewayError> {
    let mut url = base_url.clone();
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|()| GatewayError::internal(format!("Base URL cannot carry a path: {base_url}")))?
        .pop_if_empty()
        .push("route");
    Ok(url)
}

/// Pull a client-displayable message out of an upstream error body.
///
/// Looks for a non-empty string `detail`, then `message`.
#[must_use]
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["detail", "message"].iter().find_map(|key| {
        value
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

/// reqwest-backed forwarder
#[derive(Debug, Clone)]
pub struct HttpForwarder {
    client: Client,
    retry_policy: RetryPolicy,
}

impl HttpForwarder {
    /// Create a forwarder from upstream settings
    ///
    /// # Errors
    /// Returns error if HTTP client cannot be created
    pub fn new(settings: &UpstreamSettings) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .pool_max_idle_per_host(32)
            .build()
            .map_err(|e| GatewayError::internal(format!("Failed to create HTTP client: {e}")))?;

        let retry_policy = if settings.max_retries == 0 {
            RetryPolicy::disabled()
        } else {
            RetryPolicy::with_retries(settings.max_retries, settings.retry_base_delay)
        };

        Ok(Self {
            client,
            retry_policy,
        })
    }

    /// Replace the retry policy
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    async fn send_once(
        &self,
        url: &Url,
        request: &UpstreamRequest,
        request_id: &str,
    ) -> Result<UpstreamResponse, GatewayError> {
        let response = self
            .client
            .post(url.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .header("x-request-id", request_id)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, timeout = e.is_timeout(), "Upstream request failed");
                GatewayError::upstream_transport(
                    format!("Request failed: {e}"),
                    e.is_timeout() || e.is_connect() || e.is_request(),
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(MAX_LOGGED_BODY).collect();
            error!(
                status = status.as_u16(),
                reason = status.canonical_reason().unwrap_or("unknown"),
                body = %snippet,
                "Upstream returned an error status"
            );

            return Err(GatewayError::upstream_status(
                status.as_u16(),
                extract_error_message(&body),
                format!("{status}: {snippet}"),
            ));
        }

        let payload: Value = response.json().await.map_err(|e| {
            error!(error = %e, "Upstream returned an unreadable body");
            GatewayError::upstream_transport(format!("Failed to parse response: {e}"), false)
        })?;

        let parsed = UpstreamResponse::from_value(payload);
        for (field, reason) in parsed.rejected_fields() {
            warn!(field = field, reason = %reason, "Discarding malformed upstream field");
        }

        Ok(parsed)
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(
        &self,
        request: &UpstreamRequest,
        base_url: &Url,
        request_id: &str,
    ) -> Result<UpstreamResponse, GatewayError> {
        let url = route_url(base_url)?;

        debug!(
            url = %url,
            user_id = %request.user_id,
            text_chars = request.text.chars().count(),
            "Forwarding request upstream"
        );

        self.retry_policy
            .execute(|| self.send_once(&url, request, request_id))
            .await
    }
}
