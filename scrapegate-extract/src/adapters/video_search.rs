//! Video search listing from the `ytInitialData` blob of a results page.
//!
//! Two phases: the JSON literal assigned to the marker is pulled out of the
//! first inline script that mentions it, then a deeply optional path leads
//! to the result items. Items without a `videoRenderer` (shelves, ads,
//! channel cards) are skipped. An empty listing is an upstream failure, not
//! a not-found.

use crate::adapter::SourceAdapter;
use crate::document::{ContentKind, Source, SourceDocument};
use crate::error::{Result, ScrapeError};
use crate::field::{FieldSpec, Strategy};
use crate::http::Fetcher;
use crate::json_path::{
    self,
    Segment::{self, Index, Key, Last},
};
use crate::result::ExtractionResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Marker of the script blob carrying search results.
pub const MARKER: &str = "ytInitialData";

/// Prefix for watch URLs built from video ids.
pub const WATCH_URL_BASE: &str = "https://www.youtube.com/watch?v=";

/// Message when the listing holds no video items.
pub const EMPTY_MESSAGE: &str = "No videos found";

const FAILURE_CONTEXT: &str = "Failed to search videos";

/// Path from the blob root to the result items.
const ITEMS_PATH: &[Segment] = &[
    Key("contents"),
    Key("twoColumnSearchResultsRenderer"),
    Key("primaryContents"),
    Key("sectionListRenderer"),
    Key("contents"),
    Index(0),
    Key("itemSectionRenderer"),
    Key("contents"),
];

/// One video in the listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoItem {
    /// Video title.
    pub title: String,
    /// Watch URL.
    pub url: String,
    /// Channel name, `"Unknown"` when absent.
    pub channel: String,
    /// Duration text, `"LIVE"` when absent (live streams and premieres).
    pub duration: String,
    /// Largest thumbnail URL, empty when absent.
    pub thumbnail: String,
}

/// Search listing record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSearchRecord {
    /// The search query.
    pub query: String,
    /// Videos in source order.
    pub results: Vec<VideoItem>,
}

/// Search results page adapter.
#[derive(Debug, Clone)]
pub struct VideoSearchAdapter {
    endpoint: String,
}

impl VideoSearchAdapter {
    /// Create an adapter for the results page at `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    fn request_url(&self, query: &str) -> Result<String> {
        url::Url::parse_with_params(&self.endpoint, &[("search_query", query)])
            .map(String::from)
            .map_err(|e| ScrapeError::Config(format!("invalid video search endpoint: {e}")))
    }
}

impl SourceAdapter for VideoSearchAdapter {
    type Record = VideoSearchRecord;

    fn name(&self) -> &'static str {
        "video_search"
    }

    async fn run(&self, fetcher: &Fetcher, query: &str) -> ExtractionResult<VideoSearchRecord> {
        tracing::trace!(query, "video search");
        let outcome = async {
            let url = self.request_url(query)?;
            let document = fetcher.get(&url, ContentKind::Html).await?;
            extract_videos(&document)
        }
        .await;

        match outcome {
            Ok(results) if results.is_empty() => {
                ExtractionResult::UpstreamFailure(EMPTY_MESSAGE.into())
            }
            Ok(results) => ExtractionResult::Success(VideoSearchRecord {
                query: query.to_owned(),
                results,
            }),
            Err(err) => ExtractionResult::failure(FAILURE_CONTEXT, &err),
        }
    }
}

/// Per-item field chains, evaluated against a `videoRenderer` node.
struct ItemSpecs {
    title: FieldSpec,
    video_id: FieldSpec,
    channel: FieldSpec,
    duration: FieldSpec,
    thumbnail: FieldSpec,
}

impl ItemSpecs {
    fn new() -> Self {
        Self {
            title: FieldSpec::new(
                "title",
                Strategy::Path(&[Key("title"), Key("runs"), Index(0), Key("text")]),
            )
            .or(Strategy::Path(&[Key("title"), Key("simpleText")]))
            .or(Strategy::fixed_str("")),
            video_id: FieldSpec::new("videoId", Strategy::Path(&[Key("videoId")])),
            channel: FieldSpec::new(
                "channel",
                Strategy::Path(&[Key("ownerText"), Key("runs"), Index(0), Key("text")]),
            )
            .or(Strategy::Path(&[
                Key("longBylineText"),
                Key("runs"),
                Index(0),
                Key("text"),
            ]))
            .or(Strategy::fixed_str("Unknown")),
            duration: FieldSpec::new(
                "duration",
                Strategy::Path(&[Key("lengthText"), Key("simpleText")]),
            )
            .or(Strategy::fixed_str("LIVE")),
            thumbnail: FieldSpec::new(
                "thumbnail",
                Strategy::Path(&[Key("thumbnail"), Key("thumbnails"), Last, Key("url")]),
            )
            .or(Strategy::fixed_str("")),
        }
    }

    fn item(&self, renderer: &Value) -> Result<Option<VideoItem>> {
        let source = Source::Json(renderer);
        let Some(video_id) = self.video_id.extract_text(source)? else {
            return Ok(None);
        };
        Ok(Some(VideoItem {
            title: self.title.extract_text(source)?.unwrap_or_default(),
            url: format!("{WATCH_URL_BASE}{video_id}"),
            channel: self.channel.extract_text(source)?.unwrap_or_default(),
            duration: self.duration.extract_text(source)?.unwrap_or_default(),
            thumbnail: self.thumbnail.extract_text(source)?.unwrap_or_default(),
        }))
    }
}

/// Extract the video listing from a results page.
///
/// Returns the items in source order; an empty vector means the page had
/// no video items.
///
/// # Errors
///
/// Returns [`ScrapeError::Parse`] if no script carries the marker, the
/// embedded literal is malformed, or the items path is missing.
pub fn extract_videos(document: &SourceDocument) -> Result<Vec<VideoItem>> {
    let html = document.parse_html()?;
    let blob = Strategy::ScriptJson {
        marker: MARKER,
        path: &[],
    };
    let root = blob
        .evaluate(Source::Html(&html))?
        .ok_or_else(|| ScrapeError::Parse(format!("{MARKER} not found in page")))?;

    let items = json_path::get(&root, ITEMS_PATH)
        .and_then(Value::as_array)
        .ok_or_else(|| {
            ScrapeError::Parse(format!(
                "results missing at {}",
                json_path::display(ITEMS_PATH)
            ))
        })?;

    let specs = ItemSpecs::new();
    let mut results = Vec::with_capacity(items.len());
    for item in items {
        let Some(renderer) = json_path::get_present(item, &[Key("videoRenderer")]) else {
            continue;
        };
        if let Some(video) = specs.item(renderer)? {
            results.push(video);
        }
    }

    tracing::debug!(
        count = results.len(),
        skipped = items.len() - results.len(),
        "video results parsed"
    );
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn video(id: &str, title: &str) -> Value {
        json!({
            "videoRenderer": {
                "videoId": id,
                "title": {"runs": [{"text": title}, {"text": " (ignored)"}]},
                "ownerText": {"runs": [{"text": "Rust Channel"}]},
                "lengthText": {"simpleText": "12:34"},
                "thumbnail": {"thumbnails": [
                    {"url": "https://i.ytimg.com/small.jpg"},
                    {"url": "https://i.ytimg.com/large.jpg"}
                ]}
            }
        })
    }

    fn page(items: Value) -> String {
        let data = json!({
            "contents": {"twoColumnSearchResultsRenderer": {"primaryContents": {
                "sectionListRenderer": {"contents": [
                    {"itemSectionRenderer": {"contents": items}}
                ]}
            }}}
        });
        format!(
            "<html><head><script>var ytcfg = {{}};</script>\
             <script>var {MARKER} = {data};</script></head><body></body></html>"
        )
    }

    #[test]
    fn two_videos_and_one_shelf_yield_two_results_in_order() {
        let items = json!([
            video("aaaaaaaaaaa", "First"),
            {"shelfRenderer": {"title": {"simpleText": "People also watched"}}},
            video("bbbbbbbbbbb", "Second")
        ]);
        let results = extract_videos(&SourceDocument::html(page(items))).expect("parses");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "First");
        assert_eq!(results[0].url, "https://www.youtube.com/watch?v=aaaaaaaaaaa");
        assert_eq!(results[0].channel, "Rust Channel");
        assert_eq!(results[0].duration, "12:34");
        assert_eq!(results[0].thumbnail, "https://i.ytimg.com/large.jpg");
        assert_eq!(results[1].title, "Second");
    }

    #[test]
    fn optional_fields_use_fallbacks() {
        let items = json!([
            {"videoRenderer": {
                "videoId": "ccccccccccc",
                "title": {"simpleText": "Live now"},
                "longBylineText": {"runs": [{"text": "Byline"}]}
            }},
            {"videoRenderer": {"videoId": "ddddddddddd"}}
        ]);
        let results = extract_videos(&SourceDocument::html(page(items))).expect("parses");
        assert_eq!(results[0].title, "Live now");
        assert_eq!(results[0].channel, "Byline");
        assert_eq!(results[0].duration, "LIVE");
        assert_eq!(results[0].thumbnail, "");
        assert_eq!(results[1].title, "");
        assert_eq!(results[1].channel, "Unknown");
    }

    #[test]
    fn renderer_without_id_is_skipped() {
        let items = json!([{"videoRenderer": {"title": {"simpleText": "no id"}}}]);
        let results = extract_videos(&SourceDocument::html(page(items))).expect("parses");
        assert!(results.is_empty());
    }

    #[test]
    fn nested_braces_in_strings_do_not_truncate() {
        let items = json!([video("eeeeeeeeeee", "Braces }{ ]; </b> inside")]);
        let results = extract_videos(&SourceDocument::html(page(items))).expect("parses");
        assert_eq!(results[0].title, "Braces }{ ]; </b> inside");
    }

    #[test]
    fn missing_marker_is_parse_error() {
        let err = extract_videos(&SourceDocument::html("<script>var x = {};</script>")).unwrap_err();
        assert!(err.to_string().contains("ytInitialData not found"));
    }

    #[test]
    fn malformed_blob_is_parse_error() {
        let html = "<script>var ytInitialData = {\"contents\": nope};</script>";
        let err = extract_videos(&SourceDocument::html(html)).unwrap_err();
        assert!(matches!(err, ScrapeError::Parse(_)));
    }

    #[test]
    fn missing_items_path_is_parse_error() {
        let html = "<script>var ytInitialData = {\"contents\": {}};</script>";
        let err = extract_videos(&SourceDocument::html(html)).unwrap_err();
        assert!(err.to_string().contains("results missing"));
    }

    #[test]
    fn request_url_encodes_query() {
        let adapter = VideoSearchAdapter::new("https://www.youtube.com/results");
        assert_eq!(
            adapter.request_url("rust async").expect("url"),
            "https://www.youtube.com/results?search_query=rust+async"
        );
    }
}
