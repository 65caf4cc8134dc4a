//! # Gateway Upstream
//!
//! Client for the agent-routing service.
//!
//! The [`Forwarder`] trait is the seam between the HTTP layer and the
//! upstream; [`HttpForwarder`] is the production implementation. It makes one
//! bounded POST to `{base}/route` per call, plus any retries the configured
//! policy allows.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod forwarder;

pub use forwarder::{extract_error_message, route_url, Forwarder, HttpForwarder};
