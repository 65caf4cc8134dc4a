//! Prometheus metrics.

use crate::logging::TelemetryError;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;
use tracing::warn;

/// Gateway metrics, backed by a private registry
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    requests_total: IntCounterVec,
    upstream_duration: Histogram,
    upstream_errors_total: IntCounterVec,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Metrics {
    /// Create and register all gateway metrics
    ///
    /// # Errors
    /// Returns error if a metric cannot be created or registered
    pub fn new() -> Result<Self, TelemetryError> {
        let registry = Registry::new_custom(Some("gateway".to_string()), None)?;

        let requests_total = IntCounterVec::new(
            Opts::new("requests_total", "Route requests by outcome"),
            &["outcome"],
        )?;

        let upstream_duration = Histogram::with_opts(
            HistogramOpts::new(
                "upstream_duration_seconds",
                "Round-trip time of calls to the agent-routing service",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        )?;

        let upstream_errors_total = IntCounterVec::new(
            Opts::new("upstream_errors_total", "Failed upstream calls by kind"),
            &["kind"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(upstream_duration.clone()))?;
        registry.register(Box::new(upstream_errors_total.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            upstream_duration,
            upstream_errors_total,
        })
    }

    /// Count a finished route request. `outcome` is `success` or an error label.
    pub fn record_request(&self, outcome: &str) {
        self.requests_total.with_label_values(&[outcome]).inc();
    }

    /// Observe the duration of one upstream call
    pub fn record_upstream_latency(&self, duration: Duration) {
        self.upstream_duration.observe(duration.as_secs_f64());
    }

    /// Count a failed upstream call. `kind` is `status_<code>` or `transport`.
    pub fn record_upstream_error(&self, kind: &str) {
        self.upstream_errors_total.with_label_values(&[kind]).inc();
    }

    /// Number of requests recorded with `outcome`
    #[must_use]
    pub fn request_count(&self, outcome: &str) -> u64 {
        self.requests_total.with_label_values(&[outcome]).get()
    }

    /// Render all metrics in the text exposition format
    #[must_use]
    pub fn gather(&self) -> String {
        let mut buffer = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&self.registry.gather(), &mut buffer) {
            warn!(error = %e, "Failed to encode metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}
