//! Error types for the scrapegate server.

/// Top-level error type for server setup and lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error (config file, socket bind).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Extraction layer error raised during setup.
    #[error("scrape error: {0}")]
    Scrape(#[from] scrapegate_extract::ScrapeError),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ServerError>;
