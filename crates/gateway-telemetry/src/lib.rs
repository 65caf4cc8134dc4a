//! # Gateway Telemetry
//!
//! Observability for the WisdomWealth gateway.
//!
//! This crate provides:
//! - Structured logging via `tracing-subscriber`
//! - Prometheus metrics for requests and upstream calls

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod logging;
pub mod metrics;

// Re-export main types
pub use logging::{init_logging, LoggingConfig, TelemetryError};
pub use metrics::Metrics;
