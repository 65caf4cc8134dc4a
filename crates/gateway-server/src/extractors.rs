//! Custom Axum extractors for the gateway.

use axum::{
    async_trait,
    body::Bytes,
    extract::{
        rejection::{BytesRejection, FailedToBufferBody},
        FromRequest, FromRequestParts, Request,
    },
    http::request::Parts,
};
use serde_json::Value;
use std::convert::Infallible;
use tracing::debug;

/// Header carrying the request identifier
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request identifier.
///
/// Read from `x-request-id` (set by the request-id middleware when the
/// client sent none), or generated if the header is absent.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map_or_else(|| uuid::Uuid::new_v4().to_string(), str::to_string);

        Ok(Self(id))
    }
}

/// Largest request body the route endpoints will buffer
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Request body parsed as arbitrary JSON.
///
/// Never rejects. A body over [`MAX_BODY_BYTES`] is reported as
/// [`RawJson::TooLarge`]; an unreadable body, one that is not valid JSON, or
/// a missing body all become [`Value::Null`] and are left to field
/// validation. The `Content-Type` header is not inspected.
#[derive(Debug, Clone)]
pub enum RawJson {
    /// Body that fit within the limit
    Parsed(Value),
    /// Body exceeded the buffering limit
    TooLarge,
}

#[async_trait]
impl<S> FromRequest<S> for RawJson
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = match Bytes::from_request(req, state).await {
            Ok(bytes) => bytes,
            Err(BytesRejection::FailedToBufferBody(FailedToBufferBody::LengthLimitError(e))) => {
                debug!(error = %e, "Request body exceeds limit");
                return Ok(Self::TooLarge);
            }
            Err(e) => {
                debug!(error = %e, "Failed to read request body");
                return Ok(Self::Parsed(Value::Null));
            }
        };

        let value = serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            debug!(error = %e, "Request body is not valid JSON");
            Value::Null
        });

        Ok(Self::Parsed(value))
    }
}
