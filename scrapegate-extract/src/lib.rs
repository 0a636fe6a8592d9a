//! # scrapegate-extract
//!
//! Turns scraped HTML pages and loosely-typed upstream JSON into normalised
//! records for the scrapegate HTTP service.
//!
//! ## Design
//!
//! - One [`SourceAdapter`] per upstream: URL construction, a single fetch,
//!   record extraction and the adapter's own not-found predicate
//! - Records are built from ordered [`field::FieldSpec`] fallback chains
//!   over CSS selectors, embedded script JSON and JSON paths
//! - Every run ends in exactly one [`ExtractionResult`], never a panic or a
//!   bare error
//! - [`ResponseEnvelope`] maps results to the outward JSON shape and HTTP
//!   status
//! - Page screenshots go through a scoped [`render::RenderBackend`] session
//!   that is always released
//!
//! ## Security
//!
//! - Upstream bodies never reach error messages; failures carry a one-line
//!   cause only
//! - Caller input is logged only at trace level
//! - Screenshot targets are restricted to http and https
//!
//! # Examples
//!
//! ```no_run
//! use scrapegate_extract::{Fetcher, ScrapeConfig, SourceAdapter};
//! use scrapegate_extract::adapters::Adapters;
//!
//! # async fn example() -> scrapegate_extract::Result<()> {
//! let config = ScrapeConfig::default();
//! let fetcher = Fetcher::new(&config)?;
//! let adapters = Adapters::new(&config.endpoints);
//! let result = adapters.quote.run(&fetcher, "").await;
//! if let Some(quote) = result.success() {
//!     println!("{} ({})", quote.quote, quote.author);
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod adapters;
pub mod config;
pub mod document;
pub mod embedded;
pub mod envelope;
pub mod error;
pub mod field;
pub mod http;
pub mod json_path;
pub mod render;
pub mod result;

pub use adapter::SourceAdapter;
pub use config::{Endpoints, RenderConfig, ScrapeConfig};
pub use document::{ContentKind, SourceDocument};
pub use envelope::ResponseEnvelope;
pub use error::{Result, ScrapeError};
pub use http::Fetcher;
pub use render::{ChromiumBackend, RenderBackend, RenderSession};
pub use result::ExtractionResult;
