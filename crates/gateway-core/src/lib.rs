//! # Gateway Core
//!
//! Core types, validation and error handling for the WisdomWealth gateway.
//!
//! This crate provides the foundational pieces used throughout the gateway:
//! - Client request validation (`validate`)
//! - Upstream response parsing and sanitization (`sanitize`)
//! - The client-visible error taxonomy (`GatewayError`)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod request;
pub mod response;

// Re-export commonly used types
pub use error::{ErrorBody, ErrorCategory, GatewayError, GatewayResult};
pub use request::{validate, UpstreamRequest, ValidatedRequest, MAX_TEXT_CHARS};
pub use response::{
    sanitize, sanitize_at, FieldError, SanitizedResponse, UpstreamResponse,
    DEFAULT_RESPONSE_TEXT, DEFAULT_RISK,
};
