//! Optional-chain traversal over JSON values.
//!
//! Upstream JSON shapes drift. A [`Segment`] path walks a
//! [`serde_json::Value`] and yields `None` at the first missing key,
//! out-of-range index or type mismatch instead of failing.

use serde_json::Value;

/// One step of a JSON path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// Object member by key.
    Key(&'static str),
    /// Array element by position.
    Index(usize),
    /// Last element of an array.
    Last,
}

/// Follow `path` from `root`. Missing segments yield `None`.
pub fn get<'v>(root: &'v Value, path: &[Segment]) -> Option<&'v Value> {
    path.iter().try_fold(root, |node, segment| match segment {
        Segment::Key(key) => node.as_object()?.get(*key),
        Segment::Index(i) => node.as_array()?.get(*i),
        Segment::Last => node.as_array()?.last(),
    })
}

/// Follow `path` and return the value only if it is not JSON `null`.
pub fn get_present<'v>(root: &'v Value, path: &[Segment]) -> Option<&'v Value> {
    get(root, path).filter(|v| !v.is_null())
}

/// Follow `path` and render the target as text.
///
/// Strings are returned as-is, numbers and booleans in their JSON form.
/// Objects, arrays and `null` count as absent.
pub fn get_str(root: &Value, path: &[Segment]) -> Option<String> {
    get(root, path).and_then(value_to_text)
}

/// Render a scalar JSON value as text.
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Render a path for log messages, e.g. `contents[0].title`.
pub fn display(path: &[Segment]) -> String {
    let mut out = String::new();
    for segment in path {
        match segment {
            Segment::Key(key) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(key);
            }
            Segment::Index(i) => out.push_str(&format!("[{i}]")),
            Segment::Last => out.push_str("[-1]"),
        }
    }
    out
}
