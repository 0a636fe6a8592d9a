//! Page screenshots through a [`RenderBackend`].
//!
//! Every capture acquires one session and releases it exactly once, on
//! navigation failure, capture failure, deadline expiry and success alike.

use crate::error::{Result, ScrapeError};
use crate::render::RenderBackend;
use crate::result::ExtractionResult;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Content type of captured images.
pub const PNG_CONTENT_TYPE: &str = "image/png";

const FAILURE_CONTEXT: &str = "Failed to capture screenshot";

/// A captured page image.
#[derive(Debug, Clone, PartialEq)]
pub struct Screenshot {
    /// Encoded image.
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`.
    pub content_type: &'static str,
}

/// Validate a caller-supplied capture target.
///
/// # Errors
///
/// Returns [`ScrapeError::InvalidInput`] unless `raw` is an absolute
/// http or https URL.
pub fn parse_target(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ScrapeError::InvalidInput(format!("Invalid URL: {e}")))?;
    match url.scheme() {
        "http" | "https" if url.host().is_some() => Ok(url),
        "http" | "https" => Err(ScrapeError::InvalidInput("Invalid URL: missing host".into())),
        other => Err(ScrapeError::InvalidInput(format!(
            "Invalid URL: unsupported scheme {other}"
        ))),
    }
}

/// Screenshot adapter over a shared render backend.
#[derive(Clone)]
pub struct ScreenshotAdapter {
    backend: Arc<dyn RenderBackend>,
    deadline: Duration,
}

impl std::fmt::Debug for ScreenshotAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenshotAdapter")
            .field("backend", &self.backend.name())
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl ScreenshotAdapter {
    /// Create an adapter whose session steps must finish within `deadline`.
    pub fn new(backend: Arc<dyn RenderBackend>, deadline: Duration) -> Self {
        Self { backend, deadline }
    }

    /// Name of the backend in use.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Capture `target` as a PNG.
    pub async fn capture(&self, target: &Url) -> ExtractionResult<Screenshot> {
        tracing::trace!(url = %target, backend = self.backend.name(), "screenshot");
        let mut session = match self.backend.launch().await {
            Ok(session) => session,
            Err(err) => return ExtractionResult::failure(FAILURE_CONTEXT, &err),
        };

        let steps = async {
            session.navigate(target).await?;
            session.wait_for_network_idle().await?;
            session.capture_png().await
        };
        let outcome = match tokio::time::timeout(self.deadline, steps).await {
            Ok(result) => result,
            Err(_) => Err(ScrapeError::Timeout(format!(
                "screenshot exceeded {}s deadline",
                self.deadline.as_secs()
            ))),
        };

        if let Err(err) = session.release().await {
            tracing::warn!(error = %err, "render session release failed");
        }

        match outcome {
            Ok(bytes) => ExtractionResult::Success(Screenshot {
                bytes,
                content_type: PNG_CONTENT_TYPE,
            }),
            Err(err) => ExtractionResult::failure(FAILURE_CONTEXT, &err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{PNG_SIGNATURE, RenderSession};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Fail {
        Never,
        Navigate,
        Capture,
        Hang,
    }

    #[derive(Default)]
    struct Counters {
        launched: AtomicUsize,
        released: AtomicUsize,
    }

    struct MockBackend {
        fail: Fail,
        counters: Arc<Counters>,
    }

    struct MockSession {
        fail: Fail,
        counters: Arc<Counters>,
    }

    #[async_trait]
    impl RenderBackend for MockBackend {
        fn name(&self) -> &str {
            "mock"
        }

        async fn launch(&self) -> Result<Box<dyn RenderSession>> {
            self.counters.launched.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(MockSession {
                fail: self.fail,
                counters: Arc::clone(&self.counters),
            }))
        }
    }

    #[async_trait]
    impl RenderSession for MockSession {
        async fn navigate(&mut self, _url: &Url) -> Result<()> {
            if self.fail == Fail::Navigate {
                return Err(ScrapeError::Render("net::ERR_NAME_NOT_RESOLVED".into()));
            }
            Ok(())
        }

        async fn wait_for_network_idle(&mut self) -> Result<()> {
            if self.fail == Fail::Hang {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            Ok(())
        }

        async fn capture_png(&mut self) -> Result<Vec<u8>> {
            if self.fail == Fail::Capture {
                return Err(ScrapeError::Render("capture failed".into()));
            }
            let mut png = PNG_SIGNATURE.to_vec();
            png.extend_from_slice(b"IHDR");
            Ok(png)
        }

        async fn release(self: Box<Self>) -> Result<()> {
            self.counters.released.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    async fn run(fail: Fail, deadline: Duration) -> (ExtractionResult<Screenshot>, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        let backend = MockBackend {
            fail,
            counters: Arc::clone(&counters),
        };
        let adapter = ScreenshotAdapter::new(Arc::new(backend), deadline);
        let target = Url::parse("https://example.com").expect("url");
        (adapter.capture(&target).await, counters)
    }

    fn assert_released_once(counters: &Counters) {
        assert_eq!(counters.launched.load(Ordering::SeqCst), 1);
        assert_eq!(counters.released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn success_returns_png_and_releases() {
        let (result, counters) = run(Fail::Never, Duration::from_secs(5)).await;
        let shot = result.success().expect("captured");
        assert!(shot.bytes.starts_with(PNG_SIGNATURE));
        assert_eq!(shot.content_type, "image/png");
        assert_released_once(&counters);
    }

    #[tokio::test]
    async fn navigation_failure_releases() {
        let (result, counters) = run(Fail::Navigate, Duration::from_secs(5)).await;
        let reason = result.reason().expect("failed").to_owned();
        assert!(matches!(result, ExtractionResult::UpstreamFailure(_)));
        assert!(reason.starts_with("Failed to capture screenshot"));
        assert_released_once(&counters);
    }

    #[tokio::test]
    async fn capture_failure_releases() {
        let (result, counters) = run(Fail::Capture, Duration::from_secs(5)).await;
        assert!(matches!(result, ExtractionResult::UpstreamFailure(_)));
        assert_released_once(&counters);
    }

    #[tokio::test]
    async fn deadline_expiry_releases() {
        let (result, counters) = run(Fail::Hang, Duration::from_millis(50)).await;
        assert!(result.reason().expect("failed").contains("deadline"));
        assert_released_once(&counters);
    }

    #[test]
    fn parse_target_accepts_http_and_https() {
        assert!(parse_target("https://example.com/page").is_ok());
        assert!(parse_target(" http://example.com ").is_ok());
    }

    #[test]
    fn parse_target_rejects_other_input() {
        for raw in ["ftp://example.com", "file:///etc/hosts", "example.com", "not a url"] {
            let err = parse_target(raw).unwrap_err();
            assert!(matches!(err, ScrapeError::InvalidInput(_)), "{raw}");
        }
    }
}
