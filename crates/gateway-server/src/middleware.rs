//! HTTP middleware for the gateway.

use axum::{
    extract::Request,
    http::{header, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::info;

use crate::extractors::REQUEST_ID_HEADER;

/// Origins allowed to call the gateway
pub const CORS_ALLOW_ORIGIN: &str = "*";

/// Methods advertised to browsers
pub const CORS_ALLOW_METHODS: &str = "GET, OPTIONS, POST, PUT";

/// Request headers advertised to browsers
pub const CORS_ALLOW_HEADERS: &str = "X-Requested-With, Content-Type, Accept, Authorization";

/// Attach the CORS headers to every response, including errors and
/// preflights. Credentials are never allowed.
pub async fn cors_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(CORS_ALLOW_ORIGIN),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(CORS_ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(CORS_ALLOW_HEADERS),
    );
    headers.remove(header::ACCESS_CONTROL_ALLOW_CREDENTIALS);

    response
}

/// Make sure every request carries an `x-request-id` and echo it back
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let name = HeaderName::from_static(REQUEST_ID_HEADER);

    let request_id = match request.headers().get(&name) {
        Some(value) if !value.is_empty() => value.clone(),
        _ => HeaderValue::from_str(&uuid::Uuid::new_v4().to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("unknown")),
    };

    request.headers_mut().insert(name.clone(), request_id.clone());

    let mut response = next.run(request).await;
    response.headers_mut().insert(name, request_id);
    response
}

/// Log one line per request with status and latency
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "Request completed"
    );

    response
}
