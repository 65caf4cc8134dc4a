//! # Gateway Resilience
//!
//! Retry policy with jittered exponential backoff for upstream calls.
//!
//! The gateway makes a single attempt unless an operator opts in to retries;
//! a policy with `max_retries = 0` runs the operation exactly once.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod retry;

// Re-export main types
pub use retry::{RetryConfig, RetryPolicy, RetryPolicyBuilder};
