//! Random quote scraper.
//!
//! This adapter has no not-found predicate: a page without quote or author
//! markup still succeeds, with empty strings for the missing fields.

use crate::adapter::SourceAdapter;
use crate::document::{ContentKind, Source, SourceDocument};
use crate::error::Result;
use crate::field::{FieldSpec, Strategy, TextMode};
use crate::http::Fetcher;
use crate::result::ExtractionResult;
use serde::{Deserialize, Serialize};

const FAILURE_CONTEXT: &str = "Failed to fetch quote";

/// A quote and its author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    /// Quote text as shown on the page.
    pub quote: String,
    /// Author name.
    pub author: String,
}

/// Random-quote page adapter. Ignores its input.
#[derive(Debug, Clone)]
pub struct QuoteAdapter {
    endpoint: String,
}

impl QuoteAdapter {
    /// Create an adapter for the quote page at `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl SourceAdapter for QuoteAdapter {
    type Record = QuoteRecord;

    fn name(&self) -> &'static str {
        "quote"
    }

    async fn run(&self, fetcher: &Fetcher, _input: &str) -> ExtractionResult<QuoteRecord> {
        let outcome = async {
            let document = fetcher.get(&self.endpoint, ContentKind::Html).await?;
            extract_quote(&document).map(ExtractionResult::Success)
        }
        .await;
        ExtractionResult::from_outcome(FAILURE_CONTEXT, outcome)
    }
}

fn all_text(name: &'static str, selector: &'static str) -> FieldSpec {
    FieldSpec::new(
        name,
        Strategy::Text {
            selector,
            mode: TextMode::All,
        },
    )
}

/// Extract the quote and author from a quote page.
///
/// # Errors
///
/// Returns [`crate::ScrapeError::KindMismatch`] if `document` is not HTML.
pub fn extract_quote(document: &SourceDocument) -> Result<QuoteRecord> {
    let html = document.parse_html()?;
    let source = Source::Html(&html);
    let quote = all_text("quote", ".text").extract_text(source)?;
    let author = all_text("author", ".author").extract_text(source)?;
    Ok(QuoteRecord {
        quote: quote.unwrap_or_default(),
        author: author.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUOTE_HTML: &str = r#"<html><body>
<div class="quote" itemscope itemtype="http://schema.org/CreativeWork">
    <span class="text" itemprop="text">“The world as we have created it is a process of our thinking.”</span>
    <span>by <small class="author" itemprop="author">Albert Einstein</small>
    <a href="/author/Albert-Einstein">(about)</a></span>
</div>
</body></html>"#;

    #[test]
    fn extracts_quote_and_author() {
        let record = extract_quote(&SourceDocument::html(QUOTE_HTML)).expect("extracts");
        assert_eq!(
            record.quote,
            "“The world as we have created it is a process of our thinking.”"
        );
        assert_eq!(record.author, "Albert Einstein");
    }

    #[test]
    fn missing_markup_yields_empty_strings() {
        let record =
            extract_quote(&SourceDocument::html("<html><body></body></html>")).expect("extracts");
        assert_eq!(
            record,
            QuoteRecord {
                quote: String::new(),
                author: String::new(),
            }
        );
    }

    #[test]
    fn adapter_name() {
        assert_eq!(QuoteAdapter::new("https://quotes.toscrape.com/random").name(), "quote");
    }
}
