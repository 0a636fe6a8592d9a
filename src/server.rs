//! HTTP surface: one GET route per adapter.
//!
//! ## Endpoints
//!
//! - `GET /` - banner listing the routes
//! - `GET /health` - liveness probe
//! - `GET /bibleverse?verse=` - Bible verse
//! - `GET /quote` - random quote
//! - `GET /ipinfo?ip=` - geo-IP lookup
//! - `GET /ytsearch?query=` - video search
//! - `GET /ytdl?url=` - video download links
//! - `GET /tiktok?query=` - short-video search
//! - `GET /character?name=` - character lookup
//! - `GET /chat?message=` - chat reply
//! - `GET /screenshot?url=` - PNG screenshot of a page
//!
//! JSON routes answer with the extraction envelope: 200 on success, 400 for
//! missing or invalid input, 404 for not found and 500 for upstream
//! failures.

use crate::config::ServerConfig;
use crate::error::Result;
use crate::keepalive::Keepalive;
use axum::Router;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::get;
use scrapegate_extract::adapters::{Adapters, ScreenshotAdapter, screenshot, video_download};
use scrapegate_extract::{
    ChromiumBackend, ExtractionResult, Fetcher, RenderBackend, ResponseEnvelope, ScrapeError,
    SourceAdapter,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

const BANNER: &str = "<p>/bibleverse?verse= - Get a Bible scripture</p>\
<p>/quote - Get a random quote</p>\
<p>/ipinfo?ip= - Locate an IP address</p>\
<p>/ytsearch?query= - Search videos</p>\
<p>/ytdl?url= - Get video download links</p>\
<p>/tiktok?query= - Search short videos</p>\
<p>/character?name= - Look up an anime character</p>\
<p>/chat?message= - Get a chat reply</p>\
<p>/screenshot?url= - Capture a web page</p>";

const NO_RENDERER_MESSAGE: &str = "Failed to capture screenshot: no headless browser available";

// ---------------------------------------------------------------------------
// Shared application state
// ---------------------------------------------------------------------------

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    fetcher: Fetcher,
    adapters: Adapters,
    screenshots: Option<ScreenshotAdapter>,
    creator: String,
    deadline: Duration,
}

impl AppState {
    /// Build state from config, locating a headless browser on the way.
    ///
    /// A missing browser is not fatal: the screenshot route then answers
    /// with a 500 envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetcher cannot be built.
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let backend: Option<Arc<dyn RenderBackend>> =
            match ChromiumBackend::new(&config.scrape.render) {
                Ok(backend) => Some(Arc::new(backend)),
                Err(e) => {
                    warn!(error = %e, "screenshots disabled");
                    None
                }
            };
        Self::with_render_backend(config, backend)
    }

    /// Build state with an explicit render backend (or none).
    ///
    /// # Errors
    ///
    /// Returns an error if the fetcher cannot be built.
    pub fn with_render_backend(
        config: &ServerConfig,
        backend: Option<Arc<dyn RenderBackend>>,
    ) -> Result<Self> {
        let deadline = Duration::from_secs(config.request_deadline_seconds);
        let inner = Inner {
            fetcher: Fetcher::new(&config.scrape)?,
            adapters: Adapters::new(&config.scrape.endpoints),
            screenshots: backend.map(|b| ScreenshotAdapter::new(b, deadline)),
            creator: config.creator.clone(),
            deadline,
        };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    fn envelope<T: serde::Serialize>(&self, result: ExtractionResult<T>) -> Response {
        envelope_response(ResponseEnvelope::from_result(result, &self.inner.creator))
    }

    fn invalid(&self, message: &str) -> Response {
        envelope_response(ResponseEnvelope::invalid(message, &self.inner.creator))
    }

    /// Run `adapter` under the request deadline and wrap the outcome.
    async fn run<A: SourceAdapter>(&self, adapter: &A, input: &str) -> Response {
        let run = adapter.run(&self.inner.fetcher, input);
        let result = match tokio::time::timeout(self.inner.deadline, run).await {
            Ok(result) => result,
            Err(_) => {
                warn!(adapter = adapter.name(), "request deadline exceeded");
                ExtractionResult::UpstreamFailure(format!(
                    "Request exceeded {}s deadline",
                    self.inner.deadline.as_secs()
                ))
            }
        };
        self.envelope(result)
    }
}

fn envelope_response(envelope: ResponseEnvelope) -> Response {
    let (status, body) = envelope.into_parts();
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(body)).into_response()
}

/// Unwrap query parameters, answering a malformed query string with a 400
/// envelope.
fn query_params<P>(
    state: &AppState,
    query: std::result::Result<Query<P>, QueryRejection>,
) -> std::result::Result<P, Response> {
    match query {
        Ok(Query(params)) => Ok(params),
        Err(rejection) => {
            warn!(error = %rejection, "rejected query string");
            Err(state.invalid(&rejection.body_text()))
        }
    }
}

/// Trimmed, non-empty query value.
fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Router and server lifecycle
// ---------------------------------------------------------------------------

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_banner))
        .route("/health", get(handle_health))
        .route("/bibleverse", get(handle_verse))
        .route("/quote", get(handle_quote))
        .route("/ipinfo", get(handle_ipinfo))
        .route("/ytsearch", get(handle_video_search))
        .route("/ytdl", get(handle_video_download))
        .route("/tiktok", get(handle_short_video))
        .route("/character", get(handle_character))
        .route("/chat", get(handle_chat))
        .route("/screenshot", get(handle_screenshot))
        .fallback(handle_not_found)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind, start the keep-alive pinger if configured, and serve until
/// Ctrl-C.
///
/// # Errors
///
/// Returns an error if the state cannot be built or the address cannot be
/// bound.
pub async fn serve(config: &ServerConfig) -> Result<()> {
    let app = router(AppState::new(config)?);

    let listener = TcpListener::bind(config.bind_addr()).await?;
    let addr: SocketAddr = listener.local_addr()?;
    info!("scrapegate listening on http://{addr}");

    let keepalive = match config.keepalive {
        Some(ref keepalive) => Some(Keepalive::new(keepalive)?.spawn()),
        None => None,
    };

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Some(keepalive) = keepalive {
        keepalive.abort();
    }
    served?;
    info!("scrapegate shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C, serving until killed");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct VerseParams {
    verse: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IpParams {
    ip: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    query: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UrlParams {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NameParams {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageParams {
    message: Option<String>,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

async fn handle_banner(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        "API by {} is live!{BANNER}",
        state.inner.creator
    ))
}

async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn handle_not_found(State(state): State<AppState>) -> Response {
    envelope_response(ResponseEnvelope::error(
        StatusCode::NOT_FOUND.as_u16(),
        "Route not found",
        &state.inner.creator,
    ))
}

async fn handle_verse(
    State(state): State<AppState>,
    query: std::result::Result<Query<VerseParams>, QueryRejection>,
) -> Response {
    let params = match query_params(&state, query) {
        Ok(params) => params,
        Err(response) => return response,
    };
    let Some(verse) = required(params.verse) else {
        return state.invalid("Please provide a verse, e.g., /bibleverse?verse=John:3+16");
    };
    state.run(&state.inner.adapters.verse, &verse).await
}

async fn handle_quote(State(state): State<AppState>) -> Response {
    state.run(&state.inner.adapters.quote, "").await
}

async fn handle_ipinfo(
    State(state): State<AppState>,
    query: std::result::Result<Query<IpParams>, QueryRejection>,
) -> Response {
    let params = match query_params(&state, query) {
        Ok(params) => params,
        Err(response) => return response,
    };
    let Some(ip) = required(params.ip) else {
        return state.invalid("Please provide an IP address, e.g., /ipinfo?ip=8.8.8.8");
    };
    state.run(&state.inner.adapters.geoip, &ip).await
}

async fn handle_video_search(
    State(state): State<AppState>,
    query: std::result::Result<Query<SearchParams>, QueryRejection>,
) -> Response {
    let params = match query_params(&state, query) {
        Ok(params) => params,
        Err(response) => return response,
    };
    let Some(query) = required(params.query) else {
        return state.invalid("Please provide a search query, e.g., /ytsearch?query=lofi+beats");
    };
    state.run(&state.inner.adapters.video_search, &query).await
}

async fn handle_video_download(
    State(state): State<AppState>,
    query: std::result::Result<Query<UrlParams>, QueryRejection>,
) -> Response {
    let params = match query_params(&state, query) {
        Ok(params) => params,
        Err(response) => return response,
    };
    let Some(url) = required(params.url) else {
        return state.invalid(
            "Please provide a YouTube URL, e.g., /ytdl?url=https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        );
    };
    if video_download::parse_video_id(&url).is_err() {
        return state.invalid("Invalid YouTube URL");
    }
    state.run(&state.inner.adapters.video_download, &url).await
}

async fn handle_short_video(
    State(state): State<AppState>,
    query: std::result::Result<Query<SearchParams>, QueryRejection>,
) -> Response {
    let params = match query_params(&state, query) {
        Ok(params) => params,
        Err(response) => return response,
    };
    let Some(query) = required(params.query) else {
        return state.invalid("Please provide a search query, e.g., /tiktok?query=cats");
    };
    state.run(&state.inner.adapters.short_video, &query).await
}

async fn handle_character(
    State(state): State<AppState>,
    query: std::result::Result<Query<NameParams>, QueryRejection>,
) -> Response {
    let params = match query_params(&state, query) {
        Ok(params) => params,
        Err(response) => return response,
    };
    let Some(name) = required(params.name) else {
        return state.invalid("Please provide a character name, e.g., /character?name=Naruto");
    };
    state.run(&state.inner.adapters.character, &name).await
}

async fn handle_chat(
    State(state): State<AppState>,
    query: std::result::Result<Query<MessageParams>, QueryRejection>,
) -> Response {
    let params = match query_params(&state, query) {
        Ok(params) => params,
        Err(response) => return response,
    };
    let Some(message) = required(params.message) else {
        return state.invalid("Please provide a message, e.g., /chat?message=hello");
    };
    state.run(&state.inner.adapters.chat, &message).await
}

async fn handle_screenshot(
    State(state): State<AppState>,
    query: std::result::Result<Query<UrlParams>, QueryRejection>,
) -> Response {
    let params = match query_params(&state, query) {
        Ok(params) => params,
        Err(response) => return response,
    };
    let Some(raw) = required(params.url) else {
        return state.invalid("Please provide a URL, e.g., /screenshot?url=https://example.com");
    };
    let target = match screenshot::parse_target(&raw) {
        Ok(target) => target,
        Err(ScrapeError::InvalidInput(message)) => return state.invalid(&message),
        Err(e) => return state.invalid(&e.to_string()),
    };
    let Some(ref screenshots) = state.inner.screenshots else {
        return state.envelope::<()>(ExtractionResult::UpstreamFailure(
            NO_RENDERER_MESSAGE.to_owned(),
        ));
    };

    match screenshots.capture(&target).await {
        ExtractionResult::Success(shot) => {
            ([(header::CONTENT_TYPE, shot.content_type)], shot.bytes).into_response()
        }
        failed => state.envelope(failed.map(|_| ())),
    }
}
