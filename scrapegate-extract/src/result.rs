//! Tagged outcome of one adapter run.

use crate::error::ScrapeError;

/// Outcome of running a source adapter. Exactly one variant per request.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionResult<T> {
    /// The record was extracted.
    Success(T),
    /// The upstream answered, but the requested entity does not exist.
    NotFound(String),
    /// Network error, non-2xx status, unparsable payload or a broken
    /// adapter invariant.
    UpstreamFailure(String),
}

impl<T> ExtractionResult<T> {
    /// Build an [`ExtractionResult::UpstreamFailure`] that prefixes the
    /// short cause with adapter context, e.g. `"Failed to fetch quote: HTTP error: ..."`.
    pub fn failure(context: &str, err: &ScrapeError) -> Self {
        tracing::warn!(context, error = %err, "upstream failure");
        Self::UpstreamFailure(format!("{context}: {err}"))
    }

    /// Fold a fallible extraction into a result, mapping errors to
    /// [`ExtractionResult::UpstreamFailure`] with `context`.
    pub fn from_outcome(context: &str, outcome: Result<Self, ScrapeError>) -> Self {
        outcome.unwrap_or_else(|err| Self::failure(context, &err))
    }

    /// Transform the success record.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ExtractionResult<U> {
        match self {
            Self::Success(record) => ExtractionResult::Success(f(record)),
            Self::NotFound(reason) => ExtractionResult::NotFound(reason),
            Self::UpstreamFailure(reason) => ExtractionResult::UpstreamFailure(reason),
        }
    }

    /// Whether this is a success.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The success record, if any.
    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(record) => Some(record),
            Self::NotFound(_) | Self::UpstreamFailure(_) => None,
        }
    }

    /// The not-found or failure reason, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::NotFound(reason) | Self::UpstreamFailure(reason) => Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_prefixes_context() {
        let result: ExtractionResult<()> =
            ExtractionResult::failure("Failed to fetch quote", &ScrapeError::Status(502));
        assert_eq!(
            result,
            ExtractionResult::UpstreamFailure(
                "Failed to fetch quote: upstream returned HTTP 502".into()
            )
        );
    }

    #[test]
    fn from_outcome_keeps_explicit_not_found() {
        let result: ExtractionResult<u8> =
            ExtractionResult::from_outcome("ctx", Ok(ExtractionResult::NotFound("gone".into())));
        assert_eq!(result.reason(), Some("gone"));
    }

    #[test]
    fn from_outcome_maps_errors() {
        let result: ExtractionResult<u8> =
            ExtractionResult::from_outcome("ctx", Err(ScrapeError::Parse("bad".into())));
        assert!(matches!(result, ExtractionResult::UpstreamFailure(ref m) if m == "ctx: parse error: bad"));
    }

    #[test]
    fn map_only_touches_success() {
        let ok = ExtractionResult::Success(2).map(|n| n * 10);
        assert_eq!(ok.success(), Some(20));

        let missing: ExtractionResult<i32> = ExtractionResult::NotFound("x".into());
        assert!(!missing.map(|n| n * 10).is_success());
    }
}
