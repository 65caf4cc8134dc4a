//! # WisdomWealth Gateway
//!
//! Stateless gateway in front of the WisdomWealth agent-routing service.
//!
//! ## Usage
//!
//! ```bash
//! # Start with defaults, upstream taken from the environment
//! GATEWAY_UPSTREAM_URL=http://agents:8000 wisdomwealth-gateway
//!
//! # Start with a config file
//! wisdomwealth-gateway --config /etc/wisdomwealth/gateway.yaml
//!
//! # Override the listener from the command line
//! wisdomwealth-gateway --host 127.0.0.1 --port 9000 --json-logs
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use gateway_config::{ConfigLoader, GatewayConfig};
use gateway_server::{AppState, Server, ServerConfig};
use gateway_telemetry::{init_logging, LoggingConfig, Metrics};
use gateway_upstream::HttpForwarder;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

/// WisdomWealth request gateway
#[derive(Parser, Debug)]
#[command(name = "wisdomwealth-gateway")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration file
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    port: Option<u16>,

    /// Default log level when RUST_LOG is unset
    #[arg(long, value_parser = ["trace", "debug", "info", "warn", "error"])]
    log_level: Option<String>,

    /// Emit JSON log lines
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    /// Apply the flags on top of `config` and validate the result
    fn configure(&self, mut config: GatewayConfig) -> Result<GatewayConfig> {
        self.apply(&mut config);
        config
            .validate()
            .context("Invalid command-line configuration")?;
        Ok(config)
    }

    fn apply(&self, config: &mut GatewayConfig) {
        if let Some(host) = &self.host {
            config.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(level) = &self.log_level {
            config.logging.level.clone_from(level);
        }
        if self.json_logs {
            config.logging.json = true;
        }
    }
}

/// Application entry point
#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_file(path);
    }
    let config = args.configure(loader.load().await.context("Failed to load configuration")?)?;

    init_logging(
        &LoggingConfig::new()
            .with_level(config.logging.level.clone())
            .with_json(config.logging.json),
    )
    .context("Failed to initialize logging")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting WisdomWealth gateway"
    );

    run(config).await
}

/// Build the application and serve until shutdown
async fn run(config: GatewayConfig) -> Result<()> {
    info!(
        host = %config.server.host,
        port = config.server.port,
        timeout_secs = config.upstream.timeout.as_secs(),
        max_retries = config.upstream.max_retries,
        "Configuration loaded"
    );

    if !config.upstream.is_configured() {
        warn!("No upstream URL configured; route requests will fail until one is set");
    }

    let metrics = Metrics::new().context("Failed to create metrics")?;
    let forwarder =
        HttpForwarder::new(&config.upstream).context("Failed to create upstream client")?;

    let server_config = ServerConfig::from_settings(&config.server);
    let state = AppState::builder()
        .config(config)
        .forwarder(Arc::new(forwarder))
        .metrics(metrics)
        .build()?;

    Server::new(server_config, state).run().await?;

    info!("Gateway shut down");
    Ok(())
}
