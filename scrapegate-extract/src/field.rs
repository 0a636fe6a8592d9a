//! Field extraction with ordered fallback strategies.
//!
//! A [`FieldSpec`] names one output field and lists the [`Strategy`] values
//! that may produce it. Strategies run left to right and the first
//! non-absent value wins. An empty string counts as absent whichever
//! strategy produced it, so a later fallback can still apply.

use crate::document::Source;
use crate::embedded;
use crate::error::{Result, ScrapeError};
use crate::json_path::{self, Segment};
use scraper::{Html, Selector};
use serde_json::Value;

/// How matched elements are turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMode {
    /// Text of the first matching element, trimmed.
    First,
    /// Text of every matching element concatenated, untouched.
    All,
    /// Text of every matching element concatenated, whitespace runs
    /// collapsed to one space and trimmed.
    Collapsed,
}

/// One way of deriving a field value.
#[derive(Debug, Clone)]
pub enum Strategy {
    /// CSS selector plus text extraction.
    Text {
        /// CSS selector.
        selector: &'static str,
        /// How to join matched text.
        mode: TextMode,
    },
    /// JSON literal assigned to `marker` inside an inline script, then an
    /// optional path into it. An empty path yields the whole literal.
    ScriptJson {
        /// Marker token the script body must contain.
        marker: &'static str,
        /// Path inside the parsed literal.
        path: &'static [Segment],
    },
    /// Optional-chain traversal of a JSON source.
    Path(&'static [Segment]),
    /// A constant.
    Fixed(Value),
}

impl Strategy {
    /// Shorthand for a [`Strategy::Text`] in [`TextMode::First`].
    pub const fn first_text(selector: &'static str) -> Self {
        Self::Text {
            selector,
            mode: TextMode::First,
        }
    }

    /// Shorthand for a constant string fallback.
    pub fn fixed_str(value: &str) -> Self {
        Self::Fixed(Value::String(value.to_owned()))
    }

    /// Evaluate against `source`. `Ok(None)` means absent.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::KindMismatch`] when the strategy does not
    /// apply to the source kind, [`ScrapeError::Parse`] for an invalid CSS
    /// selector or a malformed embedded JSON literal.
    pub fn evaluate(&self, source: Source<'_>) -> Result<Option<Value>> {
        match self {
            Self::Text { selector, mode } => {
                let html = expect_html(source)?;
                let text = select_text(html, selector, *mode)?;
                Ok(text.filter(|t| !t.is_empty()).map(Value::String))
            }
            Self::ScriptJson { marker, path } => {
                let html = expect_html(source)?;
                let Some(root) = embedded::extract_script_json(html, marker)? else {
                    return Ok(None);
                };
                Ok(json_path::get_present(&root, path).and_then(non_empty))
            }
            Self::Path(path) => {
                let Source::Json(value) = source else {
                    return Err(mismatch("json", source));
                };
                Ok(json_path::get_present(value, path).and_then(non_empty))
            }
            Self::Fixed(value) => Ok(Some(value.clone())),
        }
    }
}

/// A named output field and its ordered strategy chain.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Output field name.
    pub name: &'static str,
    /// Strategies in evaluation order.
    pub strategies: Vec<Strategy>,
}

impl FieldSpec {
    /// Create a spec with a primary strategy.
    pub fn new(name: &'static str, primary: Strategy) -> Self {
        Self {
            name,
            strategies: vec![primary],
        }
    }

    /// Append a fallback strategy.
    #[must_use]
    pub fn or(mut self, fallback: Strategy) -> Self {
        self.strategies.push(fallback);
        self
    }

    /// Run the strategy chain. The first non-absent value wins.
    ///
    /// # Errors
    ///
    /// Propagates the first contract violation raised by a strategy.
    pub fn extract(&self, source: Source<'_>) -> Result<Option<Value>> {
        for (index, strategy) in self.strategies.iter().enumerate() {
            if let Some(value) = strategy.evaluate(source)? {
                if index > 0 {
                    tracing::trace!(field = self.name, index, "fallback strategy used");
                }
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    /// Run the chain and render the result as text.
    ///
    /// Scalars render in their JSON form; absent, null and composite values
    /// yield `None`.
    ///
    /// # Errors
    ///
    /// Same as [`FieldSpec::extract`].
    pub fn extract_text(&self, source: Source<'_>) -> Result<Option<String>> {
        Ok(self
            .extract(source)?
            .as_ref()
            .and_then(json_path::value_to_text))
    }
}

fn non_empty(value: &Value) -> Option<Value> {
    match value {
        Value::String(s) if s.is_empty() => None,
        other => Some(other.clone()),
    }
}

/// Collapse every whitespace run to one space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a CSS selector, mapping failures to [`ScrapeError::Parse`].
pub fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| ScrapeError::Parse(format!("invalid selector {selector:?}: {e:?}")))
}

fn select_text(html: &Html, selector: &str, mode: TextMode) -> Result<Option<String>> {
    let sel = parse_selector(selector)?;
    let mut matches = html.select(&sel).peekable();
    if matches.peek().is_none() {
        return Ok(None);
    }
    let text = match mode {
        TextMode::First => matches
            .next()
            .map(|el| el.text().collect::<String>().trim().to_owned()),
        TextMode::All => Some(matches.flat_map(|el| el.text()).collect::<String>()),
        TextMode::Collapsed => Some(collapse_whitespace(
            &matches.flat_map(|el| el.text()).collect::<String>(),
        )),
    };
    Ok(text)
}

fn expect_html<'a>(source: Source<'a>) -> Result<&'a Html> {
    match source {
        Source::Html(html) => Ok(html),
        other => Err(mismatch("html", other)),
    }
}

fn mismatch(expected: &'static str, found: Source<'_>) -> ScrapeError {
    ScrapeError::KindMismatch {
        expected,
        found: found.kind().name(),
    }
}
