//! Request types for the gateway.
//!
//! Client bodies arrive as untyped JSON. [`validate`] applies the input rules
//! in order and stops at the first failure; a body that passes becomes the
//! [`UpstreamRequest`] forwarded to the agent-routing service.

use crate::error::GatewayError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Maximum number of characters accepted in `text`
pub const MAX_TEXT_CHARS: usize = 3000;

/// Normalized payload sent to the upstream `/route` endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamRequest {
    /// Caller identifier, non-empty
    pub user_id: String,

    /// User input, non-blank and forwarded untrimmed
    pub text: String,

    /// Opaque metadata, `{}` when the client sent none
    pub meta: Value,
}

/// A client request that passed validation. It is forwarded as-is.
pub type ValidatedRequest = UpstreamRequest;

/// Validate a raw client body.
///
/// Rules, first failure wins:
/// 1. `user_id` is a non-empty string
/// 2. `text` is a string with non-whitespace content
/// 3. `text` has at most [`MAX_TEXT_CHARS`] characters
/// 4. `meta` defaults to `{}` when absent or `null`
///
/// # Errors
/// Returns the validation error for the first rule that fails
pub fn validate(body: Value) -> Result<ValidatedRequest, GatewayError> {
    let Value::Object(mut fields) = body else {
        return Err(GatewayError::InvalidUserId {
            reason: "body is not a JSON object",
        });
    };

    let user_id = match fields.remove("user_id") {
        Some(Value::String(id)) if !id.is_empty() => id,
        Some(Value::String(_)) => {
            return Err(GatewayError::InvalidUserId { reason: "empty" });
        }
        Some(Value::Null) | None => {
            return Err(GatewayError::InvalidUserId { reason: "missing" });
        }
        Some(_) => {
            return Err(GatewayError::InvalidUserId {
                reason: "not a string",
            });
        }
    };

    let text = match fields.remove("text") {
        Some(Value::String(text)) if !text.trim().is_empty() => text,
        Some(Value::String(_)) => {
            return Err(GatewayError::InvalidText { reason: "blank" });
        }
        Some(Value::Null) | None => {
            return Err(GatewayError::InvalidText { reason: "missing" });
        }
        Some(_) => {
            return Err(GatewayError::InvalidText {
                reason: "not a string",
            });
        }
    };

    let length = text.chars().count();
    if length > MAX_TEXT_CHARS {
        return Err(GatewayError::TextTooLong {
            actual: length,
            max: MAX_TEXT_CHARS,
        });
    }

    let meta = match fields.remove("meta") {
        Some(Value::Null) | None => Value::Object(Map::new()),
        Some(meta) => meta,
    };

    Ok(UpstreamRequest {
        user_id,
        text,
        meta,
    })
}
