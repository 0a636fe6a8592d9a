//! Short-video search listing from anchor links.
//!
//! Every anchor whose `href` contains the video path marker becomes a
//! result. There is no not-found predicate: an empty listing is still a
//! success with zero results.

use crate::adapter::SourceAdapter;
use crate::document::{ContentKind, SourceDocument};
use crate::error::{Result, ScrapeError};
use crate::field::parse_selector;
use crate::http::Fetcher;
use crate::result::ExtractionResult;
use serde::{Deserialize, Serialize};
use url::Url;

/// Path fragment that identifies video links.
pub const VIDEO_PATH_MARKER: &str = "/video/";

/// Maximum number of results returned.
pub const MAX_RESULTS: usize = 10;

const FAILURE_CONTEXT: &str = "Failed to search short videos";

/// One short video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortVideo {
    /// Anchor text.
    pub title: String,
    /// Absolute video URL.
    pub url: String,
}

/// Short-video listing record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortVideoRecord {
    /// The search query.
    pub query: String,
    /// Number of results.
    pub count: usize,
    /// Results in page order, at most [`MAX_RESULTS`].
    pub results: Vec<ShortVideo>,
}

/// Short-video search page adapter.
#[derive(Debug, Clone)]
pub struct ShortVideoAdapter {
    endpoint: String,
}

impl ShortVideoAdapter {
    /// Create an adapter for the search page at `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    fn request_url(&self, query: &str) -> Result<Url> {
        Url::parse_with_params(&self.endpoint, &[("q", query)])
            .map_err(|e| ScrapeError::Config(format!("invalid short video endpoint: {e}")))
    }
}

impl SourceAdapter for ShortVideoAdapter {
    type Record = ShortVideoRecord;

    fn name(&self) -> &'static str {
        "short_video"
    }

    async fn run(&self, fetcher: &Fetcher, query: &str) -> ExtractionResult<ShortVideoRecord> {
        tracing::trace!(query, "short video search");
        let outcome = async {
            let url = self.request_url(query)?;
            let document = fetcher.get(url.as_str(), ContentKind::Html).await?;
            extract_short_videos(&document, &url)
        }
        .await;

        match outcome {
            Ok(results) => ExtractionResult::Success(ShortVideoRecord {
                query: query.to_owned(),
                count: results.len(),
                results,
            }),
            Err(err) => ExtractionResult::failure(FAILURE_CONTEXT, &err),
        }
    }
}

/// Extract up to [`MAX_RESULTS`] video links from a search page.
///
/// Relative links are resolved against `page_url`. Anchors with empty text
/// or an unresolvable `href` are skipped.
///
/// # Errors
///
/// Returns [`ScrapeError::KindMismatch`] if `document` is not HTML.
pub fn extract_short_videos(document: &SourceDocument, page_url: &Url) -> Result<Vec<ShortVideo>> {
    let html = document.parse_html()?;
    let anchor_sel = parse_selector("a[href]")?;

    let results: Vec<ShortVideo> = html
        .select(&anchor_sel)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?.trim();
            if href.is_empty() || !href.contains(VIDEO_PATH_MARKER) {
                return None;
            }
            let text = anchor.text().collect::<String>();
            let title = text.trim();
            if title.is_empty() {
                return None;
            }
            let url = page_url.join(href).ok()?;
            Some(ShortVideo {
                title: title.to_owned(),
                url: url.into(),
            })
        })
        .take(MAX_RESULTS)
        .collect();

    tracing::debug!(count = results.len(), "short video results parsed");
    Ok(results)
}
