//! Headless page rendering behind a scoped session contract.
//!
//! A [`RenderBackend`] hands out single-use [`RenderSession`]s. Callers
//! navigate, wait for network idle, capture, and then must call
//! [`RenderSession::release`] exactly once, whatever happened before. The
//! screenshot adapter owns that discipline; backends add `Drop` cleanup as a
//! backstop.
//!
//! [`ChromiumBackend`] drives a headless Chromium binary through
//! `tokio::process`. Chromium renders a page in one invocation, so the
//! session records the target on navigation and the idle budget on the wait,
//! and performs the actual load during capture.

use crate::config::RenderConfig;
use crate::error::{Result, ScrapeError};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use url::Url;

/// PNG file signature.
pub const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// Binary names tried on `PATH` when no explicit browser is configured.
const CHROMIUM_CANDIDATES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome-headless-shell",
];

/// Source of render sessions.
#[async_trait]
pub trait RenderBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Acquire a fresh session.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Render`] if no session can be started.
    async fn launch(&self) -> Result<Box<dyn RenderSession>>;
}

/// A single-use rendering context.
#[async_trait]
pub trait RenderSession: Send {
    /// Point the session at `url`.
    async fn navigate(&mut self, url: &Url) -> Result<()>;

    /// Wait until the page's network activity settles.
    async fn wait_for_network_idle(&mut self) -> Result<()>;

    /// Capture the viewport as PNG bytes.
    async fn capture_png(&mut self) -> Result<Vec<u8>>;

    /// Release every resource held by the session.
    async fn release(self: Box<Self>) -> Result<()>;
}

/// Headless Chromium driven as a child process.
#[derive(Debug, Clone)]
pub struct ChromiumBackend {
    binary: PathBuf,
    config: RenderConfig,
}

impl ChromiumBackend {
    /// Locate the browser binary and build a backend.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Render`] if no Chromium binary can be found.
    pub fn new(config: &RenderConfig) -> Result<Self> {
        let binary = match config.chromium_path {
            Some(ref path) => which::which(path)
                .map_err(|e| ScrapeError::Render(format!("browser {path} not usable: {e}")))?,
            None => CHROMIUM_CANDIDATES
                .iter()
                .find_map(|name| which::which(name).ok())
                .ok_or_else(|| ScrapeError::Render("no Chromium binary found on PATH".into()))?,
        };
        tracing::debug!(binary = %binary.display(), "headless browser located");
        Ok(Self {
            binary,
            config: config.clone(),
        })
    }

    /// Path of the browser binary in use.
    pub fn binary(&self) -> &std::path::Path {
        &self.binary
    }
}

#[async_trait]
impl RenderBackend for ChromiumBackend {
    fn name(&self) -> &str {
        "chromium"
    }

    async fn launch(&self) -> Result<Box<dyn RenderSession>> {
        let profile = tempfile::Builder::new()
            .prefix("scrapegate-render-")
            .tempdir()
            .map_err(|e| ScrapeError::Render(format!("failed to create profile dir: {e}")))?;
        Ok(Box::new(ChromiumSession {
            binary: self.binary.clone(),
            config: self.config.clone(),
            profile: Some(profile),
            target: None,
            idle_budget_ms: None,
        }))
    }
}

/// One Chromium render. Dropping it removes the profile directory.
struct ChromiumSession {
    binary: PathBuf,
    config: RenderConfig,
    profile: Option<tempfile::TempDir>,
    target: Option<Url>,
    idle_budget_ms: Option<u64>,
}

impl ChromiumSession {
    fn args(&self, profile: &std::path::Path, output: &std::path::Path, target: &Url) -> Vec<String> {
        let mut args = vec![
            "--headless=new".to_owned(),
            "--disable-gpu".to_owned(),
            "--no-sandbox".to_owned(),
            "--no-first-run".to_owned(),
            "--hide-scrollbars".to_owned(),
            "--mute-audio".to_owned(),
            format!("--user-data-dir={}", profile.display()),
            format!(
                "--window-size={},{}",
                self.config.window_width, self.config.window_height
            ),
            format!("--screenshot={}", output.display()),
        ];
        if let Some(budget) = self.idle_budget_ms {
            args.push(format!("--virtual-time-budget={budget}"));
        }
        args.push(target.as_str().to_owned());
        args
    }
}

#[async_trait]
impl RenderSession for ChromiumSession {
    async fn navigate(&mut self, url: &Url) -> Result<()> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ScrapeError::Render(format!(
                "cannot navigate to {} URL",
                url.scheme()
            )));
        }
        self.target = Some(url.clone());
        Ok(())
    }

    async fn wait_for_network_idle(&mut self) -> Result<()> {
        self.idle_budget_ms = Some(self.config.idle_budget_ms);
        Ok(())
    }

    async fn capture_png(&mut self) -> Result<Vec<u8>> {
        let target = self
            .target
            .as_ref()
            .ok_or_else(|| ScrapeError::Render("capture requested before navigation".into()))?;
        let profile = self
            .profile
            .as_ref()
            .ok_or_else(|| ScrapeError::Render("session already released".into()))?
            .path();
        let output = profile.join("capture.png");

        let child = tokio::process::Command::new(&self.binary)
            .args(self.args(profile, &output, target))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ScrapeError::Render(format!("failed to spawn browser: {e}")))?;

        let limit = Duration::from_secs(self.config.timeout_seconds);
        let result = tokio::time::timeout(limit, child.wait_with_output())
            .await
            .map_err(|_| {
                ScrapeError::Timeout(format!("render exceeded {}s limit", limit.as_secs()))
            })?
            .map_err(|e| ScrapeError::Render(format!("browser did not exit cleanly: {e}")))?;

        if !result.status.success() {
            let code = result.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&result.stderr);
            let first_line = stderr.lines().next().unwrap_or_default();
            return Err(ScrapeError::Render(format!(
                "browser exited with code {code}: {first_line}"
            )));
        }

        let bytes = tokio::fs::read(&output)
            .await
            .map_err(|e| ScrapeError::Render(format!("no screenshot written: {e}")))?;
        if !bytes.starts_with(PNG_SIGNATURE) {
            return Err(ScrapeError::Render("browser output is not a PNG".into()));
        }
        tracing::debug!(bytes = bytes.len(), url = %target, "page captured");
        Ok(bytes)
    }

    async fn release(mut self: Box<Self>) -> Result<()> {
        match self.profile.take() {
            Some(dir) => dir
                .close()
                .map_err(|e| ScrapeError::Render(format!("failed to remove profile dir: {e}"))),
            None => Ok(()),
        }
    }
}
