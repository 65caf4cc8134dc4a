//! HTTP server lifecycle.

use gateway_config::ServerSettings;
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::{error::ServerError, routes::create_router, shutdown::shutdown_signal, state::AppState};

/// Listener configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// How long in-flight requests get after a shutdown signal
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_settings(&ServerSettings::default())
    }
}

impl ServerConfig {
    /// Build from the loaded server settings
    #[must_use]
    pub fn from_settings(settings: &ServerSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            shutdown_timeout: settings.shutdown_timeout,
        }
    }

    /// Set the host
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the drain deadline
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// `host:port` string for binding
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// The gateway HTTP server
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    state: AppState,
}

impl Server {
    /// Create a server
    #[must_use]
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Bind and serve until Ctrl+C or SIGTERM
    ///
    /// # Errors
    /// Returns error if the address cannot be bound or the accept loop fails
    pub async fn run(self) -> Result<(), ServerError> {
        let address = self.config.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| ServerError::Bind { address, source })?;

        self.serve(listener, async {
            shutdown_signal().await;
        })
        .await
    }

    /// Serve on an already bound listener until `signal` completes.
    ///
    /// After the signal, in-flight requests get `shutdown_timeout` to finish
    /// before the server stops waiting for them.
    ///
    /// # Errors
    /// Returns error if the accept loop fails
    pub async fn serve<F>(self, listener: TcpListener, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr: Option<SocketAddr> = listener.local_addr().ok();
        info!(
            address = ?local_addr,
            upstream_configured = self.state.config.upstream.is_configured(),
            "Gateway listening"
        );

        let draining = Arc::new(Notify::new());
        let trigger = Arc::clone(&draining);
        let router = create_router(self.state);

        let serve = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                signal.await;
                trigger.notify_one();
            })
            .into_future();

        let grace = self.config.shutdown_timeout;
        let deadline = async move {
            draining.notified().await;
            tokio::time::sleep(grace).await;
        };

        tokio::select! {
            result = serve => {
                result.map_err(ServerError::Serve)?;
                info!("Server stopped");
            }
            () = deadline => {
                warn!(
                    timeout_secs = grace.as_secs(),
                    "Shutdown timeout elapsed with requests still in flight"
                );
            }
        }

        Ok(())
    }
}
