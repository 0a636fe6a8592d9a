//! Error types for the scrapegate-extract crate.
//!
//! All errors use stable, short string messages. They end up in the
//! `message` field of error envelopes, so they never carry response bodies
//! or internal detail beyond a one-line cause.

/// Errors raised while fetching or extracting upstream content.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The upstream answered with a non-2xx status.
    #[error("upstream returned HTTP {0}")]
    Status(u16),

    /// The per-request deadline elapsed before the upstream answered.
    #[error("timed out: {0}")]
    Timeout(String),

    /// The upstream payload could not be parsed or lacks its expected root.
    #[error("parse error: {0}")]
    Parse(String),

    /// A strategy was applied to a document of the wrong kind.
    #[error("document kind mismatch: expected {expected}, found {found}")]
    KindMismatch {
        /// Kind the strategy needs.
        expected: &'static str,
        /// Kind the document actually has.
        found: &'static str,
    },

    /// Caller input failed validation (reported as HTTP 400).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Headless rendering failed.
    #[error("render error: {0}")]
    Render(String),

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience type alias for scrapegate-extract results.
pub type Result<T> = std::result::Result<T, ScrapeError>;

impl From<reqwest::Error> for ScrapeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout("upstream did not answer in time".into());
        }
        if let Some(status) = err.status() {
            return Self::Status(status.as_u16());
        }
        // Strip the URL so query strings never leak into messages.
        Self::Http(err.without_url().to_string())
    }
}
