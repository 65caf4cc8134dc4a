//! # Gateway Server
//!
//! HTTP boundary of the WisdomWealth gateway.
//!
//! This crate provides:
//! - Axum router for `POST /route` and `POST /api/route`
//! - Permissive CORS on every response
//! - Mapping of gateway errors to `{error, message}` JSON bodies
//! - Health and Prometheus endpoints
//! - Graceful shutdown handling

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod shutdown;
pub mod state;

// Re-export main types
pub use error::{ApiError, ServerError};
pub use routes::create_router;
pub use server::{Server, ServerConfig};
pub use shutdown::shutdown_signal;
pub use state::{AppState, AppStateBuilder};
