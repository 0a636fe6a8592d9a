//! Fetch collaborator: a shared HTTP client with User-Agent rotation.
//!
//! [`Fetcher`] performs exactly one attempt per call and turns the response
//! into a [`SourceDocument`]. Every call runs under the configured deadline;
//! non-2xx statuses are errors.

use crate::config::ScrapeConfig;
use crate::document::{ContentKind, SourceDocument};
use crate::error::{Result, ScrapeError};
use rand::seq::SliceRandom;
use std::time::Duration;

/// Realistic browser User-Agent strings, rotated per client.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0",
];

/// Build a [`reqwest::Client`] configured for scraping upstream pages.
///
/// The client has:
/// - Cookie store enabled (consent pages set cookies before redirecting)
/// - Timeout from config, applied to every request
/// - Random User-Agent from built-in rotation list (or custom if configured)
/// - Brotli and gzip decompression
///
/// # Errors
///
/// Returns [`ScrapeError::Http`] if the client cannot be constructed.
pub fn build_client(config: &ScrapeConfig) -> Result<reqwest::Client> {
    let ua = match config.user_agent {
        Some(ref custom) => custom.clone(),
        None => random_user_agent().to_owned(),
    };

    reqwest::Client::builder()
        .cookie_store(true)
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(ua)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| ScrapeError::Http(format!("failed to build HTTP client: {e}")))
}

/// Select a random User-Agent string from the rotation list.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS
        .choose(&mut rng)
        .copied()
        // SAFETY: USER_AGENTS is a non-empty const array, choose only returns None on empty slices
        .unwrap_or(USER_AGENTS[0])
}

/// Single-attempt fetcher shared across requests.
///
/// Cloning is cheap; the underlying client is reference counted.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    deadline: Duration,
}

impl Fetcher {
    /// Build a fetcher from config.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Config`] for invalid config or
    /// [`ScrapeError::Http`] if the client cannot be built.
    pub fn new(config: &ScrapeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            client: build_client(config)?,
            deadline: Duration::from_secs(config.timeout_seconds),
        })
    }

    /// `GET url` and wrap the body as a document of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Http`], [`ScrapeError::Status`] or
    /// [`ScrapeError::Timeout`].
    pub async fn get(&self, url: &str, kind: ContentKind) -> Result<SourceDocument> {
        tracing::trace!(url, %kind, "GET upstream");
        let request = self.client.get(url).header(reqwest::header::ACCEPT, accept_for(kind));
        self.send(request, kind).await
    }

    /// `POST url` with a urlencoded form and wrap the body as `kind`.
    ///
    /// # Errors
    ///
    /// Same as [`Fetcher::get`].
    pub async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
        kind: ContentKind,
    ) -> Result<SourceDocument> {
        tracing::trace!(url, %kind, "POST form upstream");
        let request = self
            .client
            .post(url)
            .form(form)
            .header(reqwest::header::ACCEPT, accept_for(kind));
        self.send(request, kind).await
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        kind: ContentKind,
    ) -> Result<SourceDocument> {
        let exchange = async {
            let response = request
                .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
                .send()
                .await?;
            let status = response.status();
            if !status.is_success() {
                return Err(ScrapeError::Status(status.as_u16()));
            }
            let body = response.bytes().await?;
            tracing::trace!(bytes = body.len(), "upstream response received");
            Ok(SourceDocument::new(kind, body))
        };

        tokio::time::timeout(self.deadline, exchange)
            .await
            .map_err(|_| {
                ScrapeError::Timeout(format!("exceeded {}s limit", self.deadline.as_secs()))
            })?
    }
}

fn accept_for(kind: ContentKind) -> &'static str {
    match kind {
        ContentKind::Html => "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8",
        ContentKind::Json => "application/json,text/plain;q=0.9,*/*;q=0.8",
        ContentKind::Binary => "*/*",
    }
}
