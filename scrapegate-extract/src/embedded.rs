//! JSON literals embedded in inline `<script>` blocks.
//!
//! Pages such as video search results ship their data as
//! `var ytInitialData = {...};`. Extraction is two steps: locate the first
//! script whose body contains the marker, then slice the literal assigned to
//! it with a balanced-delimiter scan. The scan tracks string literals and
//! escapes, so braces inside strings or nested objects never truncate it.

use crate::error::{Result, ScrapeError};
use scraper::{Html, Selector};
use serde_json::Value;

/// Characters allowed between a marker and its `=`, covering both
/// `var marker =` and `window["marker"] =`.
const ASSIGNMENT_GAP: &[char] = &[' ', '\t', '"', '\'', ']'];

/// Body of the first `<script>` element whose text contains `marker`.
pub fn find_marked_script(document: &Html, marker: &str) -> Option<String> {
    let selector = Selector::parse("script").ok()?;
    document
        .select(&selector)
        .map(|el| el.text().collect::<String>())
        .find(|body| body.contains(marker))
}

/// Slice the JSON object or array literal assigned to `marker` in `body`.
///
/// Returns `None` if the marker is empty, no occurrence of it is followed
/// by an assignment of an object/array literal, or the literal never closes.
pub fn slice_assigned_literal<'a>(body: &'a str, marker: &str) -> Option<&'a str> {
    if marker.is_empty() {
        return None;
    }
    let mut search_from = 0;
    while let Some(offset) = body[search_from..].find(marker) {
        let after_marker = search_from + offset + marker.len();
        search_from = after_marker;

        let rest = &body[after_marker..];
        let gap = rest.trim_start_matches(ASSIGNMENT_GAP);
        let Some(value_part) = gap.strip_prefix('=') else {
            continue;
        };
        // Skip `==` comparisons.
        if value_part.starts_with('=') {
            continue;
        }
        let literal = value_part.trim_start();
        if let Some(end) = balanced_end(literal) {
            return Some(&literal[..end]);
        }
        return None;
    }
    None
}

/// Length of the balanced `{...}` or `[...]` literal at the start of `s`.
///
/// Returns `None` if `s` does not start with `{`/`[` or is unbalanced.
pub fn balanced_end(s: &str) -> Option<usize> {
    let first = s.chars().next()?;
    if first != '{' && first != '[' {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + c.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

/// Locate, slice and parse the JSON literal assigned to `marker`.
///
/// Returns `Ok(None)` when no script mentions the marker.
///
/// # Errors
///
/// Returns [`ScrapeError::Parse`] if the marked script has no sliceable
/// literal or the literal is not valid JSON.
pub fn extract_script_json(document: &Html, marker: &str) -> Result<Option<Value>> {
    let Some(body) = find_marked_script(document, marker) else {
        return Ok(None);
    };
    let literal = slice_assigned_literal(&body, marker).ok_or_else(|| {
        ScrapeError::Parse(format!("no JSON literal assigned to {marker}"))
    })?;
    tracing::trace!(marker, bytes = literal.len(), "embedded JSON literal sliced");
    serde_json::from_str(literal)
        .map(Some)
        .map_err(|e| ScrapeError::Parse(format!("embedded {marker} is not valid JSON: {e}")))
}
