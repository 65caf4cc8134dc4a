//! Configuration loading from file and environment.

use crate::config::GatewayConfig;
use crate::error::ConfigError;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use validator::Validate;

/// Primary variable holding the upstream base URL
pub const ENV_UPSTREAM_URL: &str = "GATEWAY_UPSTREAM_URL";

/// Legacy variable name used by earlier deployments
pub const ENV_UPSTREAM_URL_LEGACY: &str = "FASTAPI_URL";

/// Upstream timeout override, in whole seconds
pub const ENV_UPSTREAM_TIMEOUT: &str = "GATEWAY_UPSTREAM_TIMEOUT";

/// Bind host override
pub const ENV_HOST: &str = "GATEWAY_HOST";

/// Bind port override
pub const ENV_PORT: &str = "GATEWAY_PORT";

/// Log level override
pub const ENV_LOG_LEVEL: &str = "GATEWAY_LOG_LEVEL";

/// JSON log output override
pub const ENV_LOG_JSON: &str = "GATEWAY_LOG_JSON";

/// Layered configuration loader
#[derive(Debug, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    env: Option<HashMap<String, String>>,
}

impl ConfigLoader {
    /// Create a loader with defaults and the process environment
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a YAML file on top of the defaults
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Use the given variables instead of the process environment
    #[must_use]
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Load, merge and validate the configuration
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed, an override is
    /// malformed, or the merged result fails validation
    pub async fn load(self) -> Result<GatewayConfig, ConfigError> {
        let mut config = match &self.file {
            Some(path) => {
                info!(path = %path.display(), "Loading configuration file");
                let raw = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| ConfigError::Io {
                        path: path.clone(),
                        source,
                    })?;
                serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
                    path: path.clone(),
                    source,
                })?
            }
            None => GatewayConfig::default(),
        };

        self.apply_env(&mut config)?;
        config.validate()?;

        debug!(
            upstream_configured = config.upstream.is_configured(),
            "Configuration loaded"
        );

        Ok(config)
    }

    fn var(&self, name: &str) -> Option<String> {
        let value = match &self.env {
            Some(vars) => vars.get(name).cloned(),
            None => std::env::var(name).ok(),
        };
        value.filter(|v| !v.trim().is_empty())
    }

    fn apply_env(&self, config: &mut GatewayConfig) -> Result<(), ConfigError> {
        if let Some(url) = self
            .var(ENV_UPSTREAM_URL)
            .or_else(|| self.var(ENV_UPSTREAM_URL_LEGACY))
        {
            config.upstream.url = Some(url);
        }

        if let Some(secs) = self.var(ENV_UPSTREAM_TIMEOUT) {
            let secs: u64 = secs.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: ENV_UPSTREAM_TIMEOUT.to_string(),
                reason: format!("expected whole seconds, got '{secs}'"),
            })?;
            config.upstream.timeout = Duration::from_secs(secs);
        }

        if let Some(host) = self.var(ENV_HOST) {
            config.server.host = host;
        }

        if let Some(port) = self.var(ENV_PORT) {
            config.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: ENV_PORT.to_string(),
                reason: format!("expected a port number, got '{port}'"),
            })?;
        }

        if let Some(level) = self.var(ENV_LOG_LEVEL) {
            config.logging.level = level;
        }

        if let Some(json) = self.var(ENV_LOG_JSON) {
            config.logging.json = matches!(
                json.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }

        Ok(())
    }
}
