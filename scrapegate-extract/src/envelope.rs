//! Outward response envelope.
//!
//! Success records are merged field-for-field into
//! `{"status": "success", "creator": ...}`. Failures become
//! `{"status": "error", "message": ..., "creator": ...}`. The merge never
//! rewrites record values.

use crate::result::ExtractionResult;
use serde::Serialize;
use serde_json::{Map, Value};

/// HTTP status for a success envelope.
pub const HTTP_OK: u16 = 200;
/// HTTP status for invalid or missing caller input.
pub const HTTP_BAD_REQUEST: u16 = 400;
/// HTTP status for [`ExtractionResult::NotFound`].
pub const HTTP_NOT_FOUND: u16 = 404;
/// HTTP status for [`ExtractionResult::UpstreamFailure`].
pub const HTTP_INTERNAL_ERROR: u16 = 500;

/// Key a non-object success record is stored under.
const NON_OBJECT_KEY: &str = "result";

/// A response body plus the HTTP status it maps to.
///
/// Serializes as the flat JSON object; the status code is carried alongside.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope {
    #[serde(skip)]
    http_status: u16,
    #[serde(flatten)]
    body: Map<String, Value>,
}

impl ResponseEnvelope {
    /// Build the envelope for an adapter outcome.
    pub fn from_result<T: Serialize>(result: ExtractionResult<T>, creator: &str) -> Self {
        match result {
            ExtractionResult::Success(record) => Self::success(&record, creator),
            ExtractionResult::NotFound(reason) => Self::error(HTTP_NOT_FOUND, &reason, creator),
            ExtractionResult::UpstreamFailure(reason) => {
                Self::error(HTTP_INTERNAL_ERROR, &reason, creator)
            }
        }
    }

    /// Merge `record` into a success envelope.
    ///
    /// Object records contribute their fields directly; any other JSON shape
    /// is stored under `"result"`. A record that cannot be serialized
    /// degrades to a 500 error envelope.
    pub fn success<T: Serialize + ?Sized>(record: &T, creator: &str) -> Self {
        let mut body = match serde_json::to_value(record) {
            Ok(Value::Object(fields)) => fields,
            Ok(other) => {
                let mut fields = Map::new();
                fields.insert(NON_OBJECT_KEY.to_owned(), other);
                fields
            }
            Err(e) => {
                tracing::error!(error = %e, "success record failed to serialize");
                return Self::error(HTTP_INTERNAL_ERROR, "Failed to encode response", creator);
            }
        };
        body.insert("status".to_owned(), Value::from("success"));
        body.insert("creator".to_owned(), Value::from(creator));
        Self {
            http_status: HTTP_OK,
            body,
        }
    }

    /// A 400 envelope for missing or invalid caller input.
    pub fn invalid(message: &str, creator: &str) -> Self {
        Self::error(HTTP_BAD_REQUEST, message, creator)
    }

    /// An error envelope with an explicit HTTP status.
    pub fn error(http_status: u16, message: &str, creator: &str) -> Self {
        let mut body = Map::new();
        body.insert("status".to_owned(), Value::from("error"));
        body.insert("message".to_owned(), Value::from(message));
        body.insert("creator".to_owned(), Value::from(creator));
        Self { http_status, body }
    }

    /// HTTP status this envelope maps to.
    pub fn http_status(&self) -> u16 {
        self.http_status
    }

    /// Whether this is a success envelope.
    pub fn is_success(&self) -> bool {
        self.http_status == HTTP_OK
    }

    /// The flat JSON body.
    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    /// Split into status code and JSON body.
    pub fn into_parts(self) -> (u16, Value) {
        (self.http_status, Value::Object(self.body))
    }
}
