//! Route definitions for the gateway API.

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, MethodRouter},
    Json, Router,
};
use gateway_core::GatewayError;
use gateway_telemetry::Metrics;
use std::any::Any;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::error;

use crate::{extractors::MAX_BODY_BYTES, handlers, middleware, state::AppState};

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    let panic_metrics = state.metrics.clone();

    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health_check))
        .route("/healthz", get(handlers::health_check))
        // Metrics endpoint
        .route("/metrics", get(handlers::metrics_endpoint))
        // Agent routing
        .route("/route", route_methods())
        .route("/api/route", route_methods())
        // Apply middleware, innermost first
        .layer(CatchPanicLayer::custom(move |panic| {
            handle_panic(&panic_metrics, panic)
        }))
        .layer(axum::middleware::from_fn(middleware::logging_middleware))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(axum::middleware::from_fn(middleware::cors_headers_middleware))
        // Add state
        .with_state(state)
}

/// `POST` routes, `OPTIONS` answers the preflight, everything else is 405
fn route_methods() -> MethodRouter<AppState> {
    post(handlers::route_request)
        .options(handlers::preflight)
        .fallback(handlers::method_not_allowed)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

fn handle_panic(metrics: &Metrics, panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    error!(panic = %detail, "Handler panicked");
    metrics.record_request("internal");

    let body = GatewayError::internal(detail).to_body();
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request},
    };
    use gateway_config::GatewayConfig;
    use tower::ServiceExt;

    fn create_test_state() -> AppState {
        AppState::builder()
            .config(GatewayConfig::default())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
    }

    #[tokio::test]
    async fn test_preflight_on_both_paths() {
        for path in ["/route", "/api/route"] {
            let app = create_router(create_test_state());

            let response = app
                .oneshot(
                    Request::builder()
                        .method("OPTIONS")
                        .uri(path)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        }
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/route")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
