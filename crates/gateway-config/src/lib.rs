//! # Gateway Config
//!
//! Configuration for the WisdomWealth gateway.
//!
//! Configuration is layered: built-in defaults, then an optional YAML file,
//! then environment variables. The upstream base URL is optional at load time
//! and only resolved when a request needs it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod loader;

pub use config::{GatewayConfig, LoggingSettings, ServerSettings, UpstreamSettings};
pub use error::ConfigError;
pub use loader::ConfigLoader;
