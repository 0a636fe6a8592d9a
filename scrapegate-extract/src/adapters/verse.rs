//! Bible verse lookup from a passage page.
//!
//! The reference is sent upstream as supplied. For display, `+` (the
//! conventional space placeholder in references like `John+3:16`) becomes a
//! space. An empty passage container is reported as not found.

use crate::adapter::SourceAdapter;
use crate::document::{ContentKind, SourceDocument};
use crate::error::{Result, ScrapeError};
use crate::field::{FieldSpec, Strategy, TextMode};
use crate::http::Fetcher;
use crate::result::ExtractionResult;
use serde::{Deserialize, Serialize};

/// Translation requested from upstream and reported in records.
pub const VERSION: &str = "KJV";

/// Message for references with no passage text.
pub const NOT_FOUND_MESSAGE: &str = "Verse not found or invalid reference";

const FAILURE_CONTEXT: &str = "Failed to fetch Bible verse";

/// A resolved verse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerseRecord {
    /// Reference with `+` replaced by spaces.
    pub verse: String,
    /// Passage text, whitespace-normalised.
    pub text: String,
    /// Translation.
    pub version: String,
}

/// Passage-page adapter.
#[derive(Debug, Clone)]
pub struct VerseAdapter {
    endpoint: String,
}

impl VerseAdapter {
    /// Create an adapter for the passage page at `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    fn request_url(&self, reference: &str) -> Result<String> {
        url::Url::parse_with_params(&self.endpoint, &[("search", reference), ("version", VERSION)])
            .map(String::from)
            .map_err(|e| ScrapeError::Config(format!("invalid verse endpoint: {e}")))
    }
}

impl SourceAdapter for VerseAdapter {
    type Record = VerseRecord;

    fn name(&self) -> &'static str {
        "verse"
    }

    async fn run(&self, fetcher: &Fetcher, reference: &str) -> ExtractionResult<VerseRecord> {
        tracing::trace!(reference, "verse lookup");
        let outcome = async {
            let url = self.request_url(reference)?;
            let document = fetcher.get(&url, ContentKind::Html).await?;
            extract_verse(&document, reference)
        }
        .await;
        ExtractionResult::from_outcome(FAILURE_CONTEXT, outcome)
    }
}

/// Passage text: every text node under the passage container, whitespace
/// collapsed and trimmed.
fn text_spec() -> FieldSpec {
    FieldSpec::new(
        "text",
        Strategy::Text {
            selector: ".passage-text .text",
            mode: TextMode::Collapsed,
        },
    )
}

/// Extract a verse record from a passage page.
///
/// Extracted as a separate function for testability with fixture HTML.
///
/// # Errors
///
/// Returns [`ScrapeError::KindMismatch`] if `document` is not HTML.
pub fn extract_verse(
    document: &SourceDocument,
    reference: &str,
) -> Result<ExtractionResult<VerseRecord>> {
    let html = document.parse_html()?;
    let text = text_spec()
        .extract_text(crate::document::Source::Html(&html))?
        .unwrap_or_default();

    if text.is_empty() {
        tracing::debug!(reference, "passage container empty");
        return Ok(ExtractionResult::NotFound(NOT_FOUND_MESSAGE.into()));
    }

    Ok(ExtractionResult::Success(VerseRecord {
        verse: display_reference(reference),
        text,
        version: VERSION.to_owned(),
    }))
}

/// Replace the `+` space placeholder for display.
pub fn display_reference(reference: &str) -> String {
    reference.replace('+', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSAGE_HTML: &str = r#"<!DOCTYPE html>
<html><body>
<div class="passage-text">
  <div class="version-KJV result-text-style-normal">
    <p class="verse">
      <span class="text John-3-16"><sup class="versenum">16&nbsp;</sup>For God so loved the world,
        that he gave his only begotten Son,   that whosoever believeth in him
        should not perish, but have everlasting life.</span>
    </p>
  </div>
</div>
<div class="footer"><span class="text">outside the passage</span></div>
</body></html>"#;

    const EMPTY_PASSAGE_HTML: &str = r#"<html><body>
<div class="passage-text"><p>   </p></div>
</body></html>"#;

    #[test]
    fn extracts_and_normalises_passage() {
        let doc = SourceDocument::html(PASSAGE_HTML);
        let record = extract_verse(&doc, "John+3:16")
            .expect("extracts")
            .success()
            .expect("verse found");
        assert_eq!(record.verse, "John 3:16");
        assert_eq!(record.version, "KJV");
        assert!(record.text.starts_with("16"));
        assert!(record.text.contains("For God so loved the world, that he gave"));
        assert!(record.text.ends_with("everlasting life."));
        assert!(!record.text.contains("outside the passage"));
    }

    #[test]
    fn text_has_no_double_spaces_or_edges() {
        let fixtures = [
            "<div class=\"passage-text\"><span class=\"text\">\n\t a  b \n</span></div>",
            "<div class=\"passage-text\"><span class=\"text\">x</span><span class=\"text\">  y  </span></div>",
            PASSAGE_HTML,
        ];
        for html in fixtures {
            let doc = SourceDocument::html(html);
            let record = extract_verse(&doc, "ref")
                .expect("extracts")
                .success()
                .expect("present");
            assert!(!record.text.contains("  "), "double space in {:?}", record.text);
            assert_eq!(record.text, record.text.trim());
        }
    }

    #[test]
    fn empty_container_is_not_found() {
        let doc = SourceDocument::html(EMPTY_PASSAGE_HTML);
        let result = extract_verse(&doc, "Nowhere 99:99").expect("extracts");
        assert_eq!(result, ExtractionResult::NotFound(NOT_FOUND_MESSAGE.into()));
    }

    #[test]
    fn json_document_is_contract_violation() {
        let doc = SourceDocument::json("{}");
        assert!(extract_verse(&doc, "John 3:16").is_err());
    }

    #[test]
    fn request_url_carries_reference_and_version() {
        let adapter = VerseAdapter::new("https://www.biblegateway.com/passage/");
        let url = adapter.request_url("John 3:16").expect("url");
        assert_eq!(
            url,
            "https://www.biblegateway.com/passage/?search=John+3%3A16&version=KJV"
        );
    }

    #[test]
    fn display_reference_replaces_plus() {
        assert_eq!(display_reference("1+John+4:8"), "1 John 4:8");
        assert_eq!(display_reference("Genesis 1:1"), "Genesis 1:1");
    }
}
