//! End-to-end tests for the WisdomWealth gateway.
//!
//! Requests go through the full router, middleware included. The
//! agent-routing service is played by a wiremock server.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use chrono::DateTime;
use gateway_config::{GatewayConfig, UpstreamSettings};
use gateway_core::{GatewayError, UpstreamRequest, UpstreamResponse};
use gateway_server::routes::create_router;
use gateway_server::AppState;
use gateway_upstream::Forwarder;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use url::Url;
use wiremock::matchers::{body_json, header as header_matcher, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Create test application state pointing at `upstream_url`
fn create_test_state(upstream_url: Option<&str>) -> AppState {
    let mut upstream = UpstreamSettings::default();
    upstream.url = upstream_url.map(str::to_string);

    AppState::builder()
        .config(GatewayConfig {
            upstream,
            ..Default::default()
        })
        .build()
        .unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn assert_cors(response: &Response) {
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_METHODS],
        "GET, OPTIONS, POST, PUT"
    );
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
        "X-Requested-With, Content-Type, Accept, Authorization"
    );
    assert!(headers
        .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
        .is_none());
}

#[cfg(test)]
mod route_tests {
    use super::*;

    #[tokio::test]
    async fn test_successful_route_is_sanitized() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/route"))
            .and(body_json(json!({"user_id": "u1", "text": "hello", "meta": {}})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"response": "hi", "risk": "medium"})),
            )
            .expect(1)
            .mount(&upstream)
            .await;

        let app = create_router(create_test_state(Some(&upstream.uri())));
        let response = app
            .oneshot(post_json("/route", &json!({"user_id": "u1", "text": "hello"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_cors(&response);

        let json = json_body(response).await;
        assert_eq!(json["response"], "hi");
        assert_eq!(json["risk"], "medium");
        assert_eq!(json["agent_traces"], json!([]));
        assert_eq!(json["actions"], json!([]));
        assert_eq!(json["logs_id"], Value::Null);
        assert_eq!(json["confidence_score"], Value::Null);
        assert_eq!(json["family_alert_id"], Value::Null);
        let timestamp = json["timestamp"].as_str().unwrap();
        assert!(
            DateTime::parse_from_rfc3339(timestamp).is_ok(),
            "unexpected timestamp {timestamp}"
        );
    }

    #[tokio::test]
    async fn test_api_prefix_route_and_meta_passthrough() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/route"))
            .and(body_json(json!({
                "user_id": "u1",
                "text": "  is this call a scam?  ",
                "meta": {"channel": "sms", "locale": "en"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": "Likely a scam",
                "risk": "high",
                "agent_traces": [{"agent": "scam_detector"}],
                "actions": ["block_number"],
                "logs_id": "log-7",
                "confidence_score": 0.92,
                "timestamp": "2024-05-01T10:00:00Z",
                "family_alert_id": "fa-1"
            })))
            .expect(1)
            .mount(&upstream)
            .await;

        let app = create_router(create_test_state(Some(&upstream.uri())));
        let response = app
            .oneshot(post_json(
                "/api/route",
                &json!({
                    "user_id": "u1",
                    "text": "  is this call a scam?  ",
                    "meta": {"channel": "sms", "locale": "en"}
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["agent_traces"], json!([{"agent": "scam_detector"}]));
        assert_eq!(json["actions"], json!(["block_number"]));
        assert_eq!(json["logs_id"], "log-7");
        assert_eq!(json["confidence_score"], 0.92);
        assert_eq!(json["timestamp"], "2024-05-01T10:00:00Z");
        assert_eq!(json["family_alert_id"], "fa-1");
    }

    #[tokio::test]
    async fn test_malformed_upstream_fields_get_defaults() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/route"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": "",
                "risk": 3,
                "agent_traces": "scam_detector",
                "confidence_score": "high",
                "timestamp": "yesterday"
            })))
            .mount(&upstream)
            .await;

        let app = create_router(create_test_state(Some(&upstream.uri())));
        let response = app
            .oneshot(post_json("/route", &json!({"user_id": "u1", "text": "hi"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["response"], "No response from agents");
        assert_eq!(json["risk"], "low");
        assert_eq!(json["agent_traces"], json!([]));
        assert_eq!(json["confidence_score"], Value::Null);
        assert_ne!(json["timestamp"], "yesterday");
    }

    #[tokio::test]
    async fn test_request_id_is_forwarded_and_echoed() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/route"))
            .and(header_matcher("x-request-id", "req-abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "ok"})))
            .expect(1)
            .mount(&upstream)
            .await;

        let app = create_router(create_test_state(Some(&upstream.uri())));
        let mut request = post_json("/route", &json!({"user_id": "u1", "text": "hi"}));
        request
            .headers_mut()
            .insert("x-request-id", "req-abc".parse().unwrap());

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-request-id"], "req-abc");
    }

    #[tokio::test]
    async fn test_request_id_generated_when_absent() {
        let app = create_router(create_test_state(None));
        let response = app
            .oneshot(post_json("/route", &json!({"user_id": "", "text": "hi"})))
            .await
            .unwrap();

        let id = response.headers()["x-request-id"].to_str().unwrap();
        assert!(!id.is_empty());
    }
}

#[cfg(test)]
mod validation_tests {
    use super::*;

    async fn rejected(body: Body) -> (StatusCode, Value) {
        let app = create_router(create_test_state(Some("http://127.0.0.1:1")));
        let request = Request::builder()
            .method(Method::POST)
            .uri("/route")
            .body(body)
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_cors(&response);
        let status = response.status();
        (status, json_body(response).await)
    }

    #[tokio::test]
    async fn test_empty_user_id() {
        let (status, json) =
            rejected(Body::from(json!({"user_id": "", "text": "hello"}).to_string())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid user_id");
        assert_eq!(json["message"], "user_id is required and must be a string");
    }

    #[tokio::test]
    async fn test_blank_text() {
        let (status, json) =
            rejected(Body::from(json!({"user_id": "u1", "text": " \n\t "}).to_string())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid text");
    }

    #[tokio::test]
    async fn test_text_too_long() {
        let text = "a".repeat(3001);
        let (status, json) =
            rejected(Body::from(json!({"user_id": "u1", "text": text}).to_string())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Text too long");
        assert_eq!(json["message"], "text must be less than 3000 characters");
    }

    #[tokio::test]
    async fn test_text_over_body_limit() {
        let text = "a".repeat(3 * 1024 * 1024);
        let (status, json) =
            rejected(Body::from(json!({"user_id": "u1", "text": text}).to_string())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Text too long");
        assert_eq!(json["message"], "text must be less than 3000 characters");
    }

    #[tokio::test]
    async fn test_invalid_json_body() {
        let (status, json) = rejected(Body::from("{\"user_id\": ")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid user_id");
    }

    #[tokio::test]
    async fn test_empty_body() {
        let (status, json) = rejected(Body::empty()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid user_id");
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_upstream() {
        let app = create_router(create_test_state(Some("http://127.0.0.1:1")));
        let response = app
            .oneshot(post_json("/route", &json!({"user_id": "u1", "text": "hello"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_cors(&response);
        let json = json_body(response).await;
        assert_eq!(json["error"], "Backend error");
        assert_eq!(json["message"], "Backend service error");
    }

    #[tokio::test]
    async fn test_upstream_detail_is_relayed_with_500() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/route"))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(json!({"detail": "Unknown user"})),
            )
            .mount(&upstream)
            .await;

        let app = create_router(create_test_state(Some(&upstream.uri())));
        let response = app
            .oneshot(post_json("/route", &json!({"user_id": "u1", "text": "hello"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert_eq!(json["error"], "Backend error");
        assert_eq!(json["message"], "Unknown user");
    }

    #[tokio::test]
    async fn test_missing_upstream_url() {
        let app = create_router(create_test_state(None));
        let response = app
            .oneshot(post_json("/route", &json!({"user_id": "u1", "text": "hello"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert_eq!(json["error"], "Configuration error");
        assert_eq!(json["message"], "Backend service not configured");
    }

    #[tokio::test]
    async fn test_validation_runs_before_configuration() {
        let app = create_router(create_test_state(None));
        let response = app
            .oneshot(post_json("/route", &json!({"text": "hello"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Invalid user_id");
    }

    struct PanickingForwarder;

    #[async_trait]
    impl Forwarder for PanickingForwarder {
        async fn forward(
            &self,
            _request: &UpstreamRequest,
            _base_url: &Url,
            _request_id: &str,
        ) -> Result<UpstreamResponse, GatewayError> {
            panic!("forwarder exploded");
        }
    }

    #[tokio::test]
    async fn test_panic_becomes_internal_error() {
        let state = AppState::builder()
            .config(GatewayConfig {
                upstream: UpstreamSettings::default().with_url("http://agents:8000"),
                ..Default::default()
            })
            .forwarder(Arc::new(PanickingForwarder))
            .build()
            .unwrap();
        let metrics = state.metrics.clone();

        let app = create_router(state);
        let response = app
            .oneshot(post_json("/route", &json!({"user_id": "u1", "text": "hello"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_cors(&response);
        let json = json_body(response).await;
        assert_eq!(json["error"], "Internal server error");
        assert_eq!(
            json["message"],
            "An unexpected error occurred. Please try again."
        );
        assert_eq!(metrics.request_count("internal"), 1);
    }
}

#[cfg(test)]
mod method_tests {
    use super::*;

    #[tokio::test]
    async fn test_options_preflight() {
        let app = create_router(create_test_state(None));
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/route")
            .header("origin", "https://wisdomwealth.app")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_cors(&response);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_other_methods_are_rejected() {
        for verb in [Method::GET, Method::PUT, Method::DELETE, Method::PATCH] {
            let app = create_router(create_test_state(None));
            let request = Request::builder()
                .method(verb.clone())
                .uri("/api/route")
                .body(Body::empty())
                .unwrap();

            let response = app.oneshot(request).await.unwrap();

            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{verb}");
            assert_cors(&response);
            let json = json_body(response).await;
            assert_eq!(
                json,
                json!({"error": "Method not allowed", "message": "Only POST requests are supported"})
            );
        }
    }
}

#[cfg(test)]
mod ops_endpoint_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_reports_upstream_configuration() {
        for (url, configured) in [(None, false), (Some("http://agents:8000"), true)] {
            let app = create_router(create_test_state(url));
            let request = Request::builder()
                .method(Method::GET)
                .uri("/healthz")
                .body(Body::empty())
                .unwrap();

            let response = app.oneshot(request).await.unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let json = json_body(response).await;
            assert_eq!(json["status"], "healthy");
            assert_eq!(json["upstream_configured"], configured);
        }
    }

    #[tokio::test]
    async fn test_metrics_count_outcomes() {
        let state = create_test_state(None);
        let app = create_router(state.clone());

        app.clone()
            .oneshot(post_json("/route", &json!({"user_id": "", "text": "hi"})))
            .await
            .unwrap();
        app.clone()
            .oneshot(post_json("/route", &json!({"user_id": "u1", "text": "hi"})))
            .await
            .unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(body.to_vec()).unwrap();

        assert!(text.contains("gateway_requests_total{outcome=\"validation\"} 1"));
        assert!(text.contains("gateway_requests_total{outcome=\"configuration\"} 1"));
    }
}
