//! Download-link resolution through a form-POST analysis endpoint.
//!
//! The video id comes from the caller's URL (`?v=<id>` or `/shorts/<id>`).
//! The endpoint answers with JSON whose `result` field is an HTML fragment
//! holding a table of formats. Link selection scans every row:
//!
//! 1. video: first row whose format cell contains `mp4` and quality cell
//!    contains `720p`; audio: first row whose format cell contains `mp3`.
//! 2. only if no 720p row matched: first row whose format contains `mp4`.
//!
//! One missing link is reported as a placeholder; both missing is an
//! upstream failure.

use crate::adapter::SourceAdapter;
use crate::document::{ContentKind, Source, SourceDocument};
use crate::error::{Result, ScrapeError};
use crate::field::{collapse_whitespace, parse_selector, FieldSpec, Strategy};
use crate::http::Fetcher;
use crate::json_path::{self, Segment::Key};
use crate::result::ExtractionResult;
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};

/// Placeholder for a link that was not offered.
pub const UNAVAILABLE: &str = "Not available";

/// Message when neither a video nor an audio link was found.
pub const NO_FORMATS_MESSAGE: &str = "No downloadable formats found";

/// Preferred video quality.
const PREFERRED_QUALITY: &str = "720p";

const FAILURE_CONTEXT: &str = "Failed to fetch download links";

/// Length of a video id.
const VIDEO_ID_LEN: usize = 11;

/// Resolved download links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadRecord {
    /// Video id.
    pub id: String,
    /// Title, `"Unknown Title"` when the fragment has none.
    pub title: String,
    /// Thumbnail built from the id.
    pub thumbnail: String,
    /// Video link or [`UNAVAILABLE`].
    pub video: String,
    /// Audio link or [`UNAVAILABLE`].
    pub audio: String,
}

/// Links picked from the format table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectedLinks {
    /// Chosen video link.
    pub video: Option<String>,
    /// Chosen audio link.
    pub audio: Option<String>,
}

/// One row of the format table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatRow {
    /// Quality cell text, e.g. `720p (HD)`.
    pub quality: String,
    /// Format cell text, e.g. `MP4`.
    pub format: String,
    /// Download link, if the row has one.
    pub link: Option<String>,
}

/// Analysis-endpoint adapter.
#[derive(Debug, Clone)]
pub struct VideoDownloadAdapter {
    endpoint: String,
}

impl VideoDownloadAdapter {
    /// Create an adapter for the analysis endpoint at `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl SourceAdapter for VideoDownloadAdapter {
    type Record = DownloadRecord;

    fn name(&self) -> &'static str {
        "video_download"
    }

    /// Callers should validate `video_url` with [`parse_video_id`] first so
    /// bad input is reported as a 400; here it degrades to a failure.
    async fn run(&self, fetcher: &Fetcher, video_url: &str) -> ExtractionResult<DownloadRecord> {
        let outcome = async {
            let id = parse_video_id(video_url)?;
            tracing::trace!(%id, "resolving download links");
            let form = [
                ("k_query", video_url),
                ("k_page", "home"),
                ("hl", "en"),
                ("q_auto", "0"),
            ];
            let document = fetcher
                .post_form(&self.endpoint, &form, ContentKind::Json)
                .await?;
            extract_download(&document, &id)
        }
        .await;
        ExtractionResult::from_outcome(FAILURE_CONTEXT, outcome)
    }
}

/// Derive the 11-character video id from a watch or shorts URL.
///
/// Accepts URLs with or without a scheme.
///
/// # Errors
///
/// Returns [`ScrapeError::InvalidInput`] when neither pattern matches.
pub fn parse_video_id(video_url: &str) -> Result<String> {
    let trimmed = video_url.trim();
    let parsed = url::Url::parse(trimmed)
        .or_else(|_| url::Url::parse(&format!("https://{trimmed}")))
        .map_err(|_| ScrapeError::InvalidInput("not a valid video URL".into()))?;

    let from_query = parsed
        .query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned());

    let from_shorts = || {
        let mut segments = parsed.path_segments()?;
        segments.find(|s| *s == "shorts")?;
        segments.next().map(str::to_owned)
    };

    from_query
        .or_else(from_shorts)
        .filter(|id| is_video_id(id))
        .ok_or_else(|| ScrapeError::InvalidInput("not a valid video URL".into()))
}

fn is_video_id(id: &str) -> bool {
    id.len() == VIDEO_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Thumbnail URL for a video id.
pub fn thumbnail_url(id: &str) -> String {
    format!("https://i.ytimg.com/vi/{id}/hqdefault.jpg")
}

/// Extract links from the analysis endpoint's JSON envelope.
///
/// # Errors
///
/// Returns [`ScrapeError::Parse`] if the envelope is not JSON or its
/// `result` field is not an HTML string.
pub fn extract_download(
    document: &SourceDocument,
    id: &str,
) -> Result<ExtractionResult<DownloadRecord>> {
    let envelope = document.parse_json()?;
    let fragment = json_path::get(&envelope, &[Key("result")])
        .and_then(|v| v.as_str())
        .ok_or_else(|| ScrapeError::Parse("analysis response has no HTML result".into()))?;

    let html = Html::parse_fragment(fragment);
    let title = FieldSpec::new("title", Strategy::first_text(".caption b"))
        .or(Strategy::first_text(".caption"))
        .or(Strategy::fixed_str("Unknown Title"))
        .extract_text(Source::Html(&html))?
        .unwrap_or_default();

    let rows = format_rows(&html)?;
    let links = select_links(&rows);
    tracing::debug!(rows = rows.len(), ?links, "format table scanned");

    if links.video.is_none() && links.audio.is_none() {
        return Ok(ExtractionResult::UpstreamFailure(NO_FORMATS_MESSAGE.into()));
    }

    Ok(ExtractionResult::Success(DownloadRecord {
        id: id.to_owned(),
        title,
        thumbnail: thumbnail_url(id),
        video: links.video.unwrap_or_else(|| UNAVAILABLE.to_owned()),
        audio: links.audio.unwrap_or_else(|| UNAVAILABLE.to_owned()),
    }))
}

/// Read every table row with at least a quality and a format cell.
///
/// # Errors
///
/// Returns [`ScrapeError::Parse`] only for an invalid built-in selector.
pub fn format_rows(html: &Html) -> Result<Vec<FormatRow>> {
    let row_sel = parse_selector("table tr")?;
    let cell_sel = parse_selector("td")?;
    let link_sel = parse_selector("a[href], [data-href]")?;

    let rows = html
        .select(&row_sel)
        .filter_map(|row| {
            let mut cells = row.select(&cell_sel);
            let quality = cell_text(cells.next()?);
            let format = cell_text(cells.next()?).to_lowercase();
            let link = row.select(&link_sel).find_map(|a| {
                let value = a.value();
                value
                    .attr("href")
                    .or_else(|| value.attr("data-href"))
                    .map(str::trim)
                    .filter(|href| !href.is_empty() && *href != "#")
                    .map(str::to_owned)
            });
            Some(FormatRow {
                quality,
                format,
                link,
            })
        })
        .collect();
    Ok(rows)
}

fn cell_text(cell: ElementRef<'_>) -> String {
    collapse_whitespace(&cell.text().collect::<String>())
}

/// Apply the two-pass link selection over the format rows.
pub fn select_links(rows: &[FormatRow]) -> SelectedLinks {
    let mut links = SelectedLinks::default();

    for row in rows {
        let Some(ref link) = row.link else {
            continue;
        };
        if links.video.is_none()
            && row.format.contains("mp4")
            && row.quality.contains(PREFERRED_QUALITY)
        {
            links.video = Some(link.clone());
        }
        if links.audio.is_none() && row.format.contains("mp3") {
            links.audio = Some(link.clone());
        }
    }

    if links.video.is_none() {
        links.video = rows
            .iter()
            .find(|row| row.format.contains("mp4"))
            .and_then(|row| row.link.clone());
    }

    links
}
