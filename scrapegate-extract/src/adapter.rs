//! Trait definition for per-upstream source adapters.
//!
//! Each upstream (verse pages, quotes, geo-IP, video search, ...) implements
//! [`SourceAdapter`] to provide a uniform interface: fetch once, compose
//! field extractors into a record, and classify the outcome.

use crate::http::Fetcher;
use crate::result::ExtractionResult;
use serde::Serialize;

/// A pluggable upstream adapter.
///
/// Implementors handle their own:
///
/// - URL construction with query encoding
/// - a single fetch attempt per upstream call
/// - record extraction through [`crate::field::FieldSpec`] chains
/// - their "not found" and "malformed" predicates
///
/// All implementations must be `Send + Sync` so one instance can serve
/// concurrent requests.
pub trait SourceAdapter: Send + Sync {
    /// Record produced on success.
    type Record: Serialize + Send;

    /// Short adapter name for logs.
    fn name(&self) -> &'static str;

    /// Run the adapter for one caller input.
    ///
    /// Never fails outright: transport and parse errors become
    /// [`ExtractionResult::UpstreamFailure`].
    fn run(
        &self,
        fetcher: &Fetcher,
        input: &str,
    ) -> impl std::future::Future<Output = ExtractionResult<Self::Record>> + Send;
}
