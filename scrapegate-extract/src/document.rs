//! Fetched upstream content and its parsed forms.
//!
//! A [`SourceDocument`] is the immutable result of one fetch. Adapters parse
//! it once into a [`ParsedDocument`] and evaluate field strategies against
//! the borrowed [`Source`] view.

use crate::error::{Result, ScrapeError};
use bytes::Bytes;
use scraper::Html;
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

/// What kind of content a document holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// HTML markup.
    Html,
    /// JSON text.
    Json,
    /// Opaque bytes (images).
    Binary,
}

impl ContentKind {
    /// Lowercase name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Json => "json",
            Self::Binary => "binary",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw fetched content plus its kind tag. Immutable once built.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    kind: ContentKind,
    raw: Bytes,
}

impl SourceDocument {
    /// Wrap raw bytes of the given kind.
    pub fn new(kind: ContentKind, raw: impl Into<Bytes>) -> Self {
        Self {
            kind,
            raw: raw.into(),
        }
    }

    /// Convenience constructor for HTML text.
    pub fn html(text: impl Into<String>) -> Self {
        Self::new(ContentKind::Html, text.into())
    }

    /// Convenience constructor for JSON text.
    pub fn json(text: impl Into<String>) -> Self {
        Self::new(ContentKind::Json, text.into())
    }

    /// The content kind tag.
    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    /// The raw bytes as fetched.
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// The content decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.raw)
    }

    /// Parse into the tree matching this document's kind.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Parse`] if a JSON document is not valid JSON.
    /// HTML parsing is lenient and never fails.
    pub fn parse(&self) -> Result<ParsedDocument> {
        match self.kind {
            ContentKind::Html => Ok(ParsedDocument::Html(Html::parse_document(&self.text()))),
            ContentKind::Json => serde_json::from_slice(&self.raw)
                .map(ParsedDocument::Json)
                .map_err(|e| ScrapeError::Parse(format!("invalid JSON payload: {e}"))),
            ContentKind::Binary => Ok(ParsedDocument::Binary(self.raw.clone())),
        }
    }

    /// Parse as HTML, failing if this is not an HTML document.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::KindMismatch`] for non-HTML documents.
    pub fn parse_html(&self) -> Result<Html> {
        self.expect_kind(ContentKind::Html)?;
        Ok(Html::parse_document(&self.text()))
    }

    /// Parse as JSON, failing if this is not a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::KindMismatch`] for non-JSON documents and
    /// [`ScrapeError::Parse`] for malformed JSON.
    pub fn parse_json(&self) -> Result<Value> {
        self.expect_kind(ContentKind::Json)?;
        serde_json::from_slice(&self.raw)
            .map_err(|e| ScrapeError::Parse(format!("invalid JSON payload: {e}")))
    }

    fn expect_kind(&self, expected: ContentKind) -> Result<()> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(ScrapeError::KindMismatch {
                expected: expected.name(),
                found: self.kind.name(),
            })
        }
    }
}

/// A parsed document. Not `Send`: keep it out of `.await` points.
pub enum ParsedDocument {
    /// Parsed HTML tree.
    Html(Html),
    /// Parsed JSON value.
    Json(Value),
    /// Untouched bytes.
    Binary(Bytes),
}

impl ParsedDocument {
    /// Borrow as a strategy source.
    pub fn source(&self) -> Source<'_> {
        match self {
            Self::Html(html) => Source::Html(html),
            Self::Json(value) => Source::Json(value),
            Self::Binary(_) => Source::Binary,
        }
    }
}

/// Borrowed view that field strategies evaluate against.
///
/// Besides whole documents, a `Source` can wrap a JSON sub-node so the same
/// field specs run over each item of a listing.
#[derive(Clone, Copy)]
pub enum Source<'a> {
    /// An HTML tree.
    Html(&'a Html),
    /// A JSON value (document root or sub-node).
    Json(&'a Value),
    /// Binary content; no strategy applies.
    Binary,
}

impl Source<'_> {
    /// Kind of the underlying content.
    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Html(_) => ContentKind::Html,
            Self::Json(_) => ContentKind::Json,
            Self::Binary => ContentKind::Binary,
        }
    }
}
