//! Chat reply lookup against a JSON API.
//!
//! The reply key differs between upstream revisions, so the record field is
//! a fallback chain over every shape seen in the wild.

use crate::adapter::SourceAdapter;
use crate::document::{ContentKind, Source, SourceDocument};
use crate::error::{Result, ScrapeError};
use crate::field::{FieldSpec, Strategy};
use crate::http::Fetcher;
use crate::json_path::Segment::Key;
use crate::result::ExtractionResult;
use serde::{Deserialize, Serialize};

/// Message when the payload carries no reply under any known key.
pub const NO_REPLY_MESSAGE: &str = "Upstream returned no reply";

const FAILURE_CONTEXT: &str = "Failed to fetch chat reply";

/// A message and the upstream's reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRecord {
    /// The caller's message.
    pub message: String,
    /// The reply text.
    pub reply: String,
}

/// Chat reply API adapter.
#[derive(Debug, Clone)]
pub struct ChatAdapter {
    endpoint: String,
}

impl ChatAdapter {
    /// Create an adapter for the API at `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    fn request_url(&self, message: &str) -> Result<String> {
        url::Url::parse_with_params(&self.endpoint, &[("text", message), ("lc", "en")])
            .map(String::from)
            .map_err(|e| ScrapeError::Config(format!("invalid chat endpoint: {e}")))
    }
}

impl SourceAdapter for ChatAdapter {
    type Record = ChatRecord;

    fn name(&self) -> &'static str {
        "chat"
    }

    async fn run(&self, fetcher: &Fetcher, message: &str) -> ExtractionResult<ChatRecord> {
        tracing::trace!(message, "chat reply");
        let outcome = async {
            let url = self.request_url(message)?;
            let document = fetcher.get(&url, ContentKind::Json).await?;
            extract_reply(&document)
        }
        .await;

        match outcome {
            Ok(Some(reply)) => ExtractionResult::Success(ChatRecord {
                message: message.to_owned(),
                reply,
            }),
            Ok(None) => {
                tracing::warn!("chat upstream answered without a reply field");
                ExtractionResult::UpstreamFailure(NO_REPLY_MESSAGE.into())
            }
            Err(err) => ExtractionResult::failure(FAILURE_CONTEXT, &err),
        }
    }
}

fn reply_spec() -> FieldSpec {
    FieldSpec::new("reply", Strategy::Path(&[Key("response")]))
        .or(Strategy::Path(&[Key("reply")]))
        .or(Strategy::Path(&[Key("message")]))
        .or(Strategy::Path(&[Key("result"), Key("reply")]))
        .or(Strategy::Path(&[Key("data"), Key("reply")]))
}

/// Extract the reply text, or `None` if no known key carries one.
///
/// # Errors
///
/// Returns [`ScrapeError::Parse`] for invalid JSON.
pub fn extract_reply(document: &SourceDocument) -> Result<Option<String>> {
    let root = document.parse_json()?;
    reply_spec().extract_text(Source::Json(&root))
}
