//! Route Integration Tests
//!
//! These tests drive the full router with `tower::ServiceExt::oneshot`
//! against mock upstreams and verify the outward contract:
//! - success records merged into the envelope with status 200
//! - missing or invalid input rejected with 400 before any upstream call
//! - not-found mapped to 404, upstream failures to 500
//! - the per-request deadline
//! - screenshot bytes served as `image/png`

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use scrapegate::{AppState, ServerConfig, router};
use scrapegate_extract::render::{PNG_SIGNATURE, RenderBackend, RenderSession};
use scrapegate_extract::{Endpoints, ScrapeConfig};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> ServerConfig {
    ServerConfig {
        scrape: ScrapeConfig {
            timeout_seconds: 5,
            endpoints: Endpoints::rebased(&server.uri()),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn app(config: &ServerConfig) -> Router {
    router(AppState::with_render_backend(config, None).expect("state"))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>, Option<String>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, body.to_vec(), content_type)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let (status, body, _) = get(app, uri).await;
    (status, serde_json::from_slice(&body).expect("json body"))
}

// ────────────────────────────────────────────────────────────────────────────
// Static Routes
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn banner_names_creator() {
    let server = MockServer::start().await;
    let (status, body, _) = get(app(&config(&server)), "/").await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).expect("utf8");
    assert!(text.starts_with("API by Gabimaru is live!"));
    assert!(text.contains("/bibleverse?verse="));
}

#[tokio::test]
async fn health_is_ok() {
    let server = MockServer::start().await;
    let (status, body) = get_json(app(&config(&server)), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let server = MockServer::start().await;
    let (status, body) = get_json(app(&config(&server)), "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
}

// ────────────────────────────────────────────────────────────────────────────
// Validation
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_verse_is_bad_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

    let (status, body) = get_json(app(&config(&server)), "/bibleverse").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "status": "error",
            "message": "Please provide a verse, e.g., /bibleverse?verse=John:3+16",
            "creator": "Gabimaru"
        })
    );
}

#[tokio::test]
async fn blank_parameters_are_bad_request() {
    let server = MockServer::start().await;
    let app = app(&config(&server));
    for uri in [
        "/ipinfo?ip=",
        "/ytsearch?query=%20%20",
        "/ytdl",
        "/tiktok?query=",
        "/character",
        "/chat?message=",
        "/screenshot",
    ] {
        let (status, body) = get_json(app.clone(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(
            body["message"].as_str().expect("message").starts_with("Please provide"),
            "{uri}"
        );
    }
}

#[tokio::test]
async fn repeated_parameter_is_json_bad_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

    let app = app(&config(&server));
    for uri in ["/bibleverse?verse=a&verse=b", "/chat?message=hi&message=yo"] {
        let (status, body, content_type) = get(app.clone(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(content_type.as_deref(), Some("application/json"), "{uri}");
        let body: Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(body["status"], "error", "{uri}");
        assert_eq!(body["creator"], "Gabimaru", "{uri}");
        assert!(
            body["message"].as_str().expect("message").contains("duplicate field"),
            "{uri}"
        );
    }
}

#[tokio::test]
async fn invalid_download_url_is_rejected_before_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

    let (status, body) = get_json(
        app(&config(&server)),
        "/ytdl?url=https%3A%2F%2Fexample.com%2Fwatch",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid YouTube URL");
}

#[tokio::test]
async fn non_http_screenshot_target_is_bad_request() {
    let server = MockServer::start().await;
    let (status, body) = get_json(
        app(&config(&server)),
        "/screenshot?url=file%3A%2F%2F%2Fetc%2Fpasswd",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().expect("message").contains("unsupported scheme"));
}

// ────────────────────────────────────────────────────────────────────────────
// Outcome Mapping
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn quote_success_is_merged_into_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/random"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<span class="text">“Simplicity is prerequisite for reliability.”</span>
               <small class="author">Edsger W. Dijkstra</small>"#,
        ))
        .mount(&server)
        .await;

    let (status, body) = get_json(app(&config(&server)), "/quote").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": "success",
            "creator": "Gabimaru",
            "quote": "“Simplicity is prerequisite for reliability.”",
            "author": "Edsger W. Dijkstra"
        })
    );
}

#[tokio::test]
async fn geoip_fail_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/192.168.0.1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "fail", "message": "private range"})),
        )
        .mount(&server)
        .await;

    let (status, body) = get_json(app(&config(&server)), "/ipinfo?ip=192.168.0.1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "IP address not found: private range");
}

#[tokio::test]
async fn upstream_error_is_internal_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/passage/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (status, body) = get_json(app(&config(&server)), "/bibleverse?verse=John+3:16").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["message"],
        "Failed to fetch Bible verse: upstream returned HTTP 503"
    );
    assert_eq!(body["creator"], "Gabimaru");
}

#[tokio::test]
async fn request_deadline_is_enforced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/simtalk"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"message": "too late"}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = ServerConfig {
        request_deadline_seconds: 1,
        ..config(&server)
    };
    let (status, body) = get_json(app(&config), "/chat?message=hello").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Request exceeded 1s deadline");
}

#[tokio::test]
async fn cors_is_permissive() {
    let server = MockServer::start().await;
    let response = app(&config(&server))
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "https://example.com")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

// ────────────────────────────────────────────────────────────────────────────
// Screenshots
// ────────────────────────────────────────────────────────────────────────────

struct StubBackend;

struct StubSession;

#[async_trait]
impl RenderBackend for StubBackend {
    fn name(&self) -> &str {
        "stub"
    }

    async fn launch(&self) -> scrapegate_extract::Result<Box<dyn RenderSession>> {
        Ok(Box::new(StubSession))
    }
}

#[async_trait]
impl RenderSession for StubSession {
    async fn navigate(&mut self, _url: &Url) -> scrapegate_extract::Result<()> {
        Ok(())
    }

    async fn wait_for_network_idle(&mut self) -> scrapegate_extract::Result<()> {
        Ok(())
    }

    async fn capture_png(&mut self) -> scrapegate_extract::Result<Vec<u8>> {
        Ok(PNG_SIGNATURE.to_vec())
    }

    async fn release(self: Box<Self>) -> scrapegate_extract::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn screenshot_serves_png() {
    let server = MockServer::start().await;
    let config = config(&server);
    let app = router(
        AppState::with_render_backend(&config, Some(Arc::new(StubBackend))).expect("state"),
    );

    let (status, body, content_type) =
        get(app, "/screenshot?url=https%3A%2F%2Fexample.com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/png"));
    assert!(body.starts_with(PNG_SIGNATURE));
}

#[tokio::test]
async fn screenshot_without_browser_is_internal_error() {
    let server = MockServer::start().await;
    let (status, body) = get_json(
        app(&config(&server)),
        "/screenshot?url=https%3A%2F%2Fexample.com",
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");
}
