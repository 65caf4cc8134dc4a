//! Shared application state.

use gateway_config::GatewayConfig;
use gateway_telemetry::Metrics;
use gateway_upstream::{Forwarder, HttpForwarder};
use std::sync::Arc;

use crate::error::ServerError;

/// State shared by all handlers
#[derive(Clone)]
pub struct AppState {
    /// Resolved configuration
    pub config: Arc<GatewayConfig>,
    /// Upstream client
    pub forwarder: Arc<dyn Forwarder>,
    /// Request and upstream metrics
    pub metrics: Metrics,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Start building application state
    #[must_use]
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::default()
    }
}

/// Builder for [`AppState`]
#[derive(Default)]
pub struct AppStateBuilder {
    config: Option<GatewayConfig>,
    forwarder: Option<Arc<dyn Forwarder>>,
    metrics: Option<Metrics>,
}

impl AppStateBuilder {
    /// Set the configuration
    #[must_use]
    pub fn config(mut self, config: GatewayConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use a specific forwarder instead of the HTTP one built from config
    #[must_use]
    pub fn forwarder(mut self, forwarder: Arc<dyn Forwarder>) -> Self {
        self.forwarder = Some(forwarder);
        self
    }

    /// Use an existing metrics registry
    #[must_use]
    pub fn metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the state, creating any missing pieces from the configuration
    ///
    /// # Errors
    /// Returns error if the HTTP client or the metrics registry cannot be created
    pub fn build(self) -> Result<AppState, ServerError> {
        let config = self.config.unwrap_or_default();

        let forwarder = match self.forwarder {
            Some(forwarder) => forwarder,
            None => Arc::new(
                HttpForwarder::new(&config.upstream).map_err(ServerError::Forwarder)?,
            ),
        };

        let metrics = match self.metrics {
            Some(metrics) => metrics,
            None => Metrics::new()?,
        };

        Ok(AppState {
            config: Arc::new(config),
            forwarder,
            metrics,
        })
    }
}
