//! Character lookup: a search call followed by a details call.
//!
//! The first search hit's id keys the details request. An empty search is
//! not found; a details payload without a name is an upstream failure.

use crate::adapter::SourceAdapter;
use crate::document::{ContentKind, Source, SourceDocument};
use crate::error::{Result, ScrapeError};
use crate::field::{FieldSpec, Strategy};
use crate::http::Fetcher;
use crate::json_path::{
    self,
    Segment::{Index, Key},
};
use crate::result::ExtractionResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message when the search returns no characters.
pub const NOT_FOUND_MESSAGE: &str = "Character not found";

const FAILURE_CONTEXT: &str = "Failed to fetch character";

/// Character details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterRecord {
    /// Upstream id.
    pub id: u64,
    /// Romanised name.
    pub name: String,
    /// Name in kanji, empty when absent.
    pub name_kanji: String,
    /// Known nicknames.
    pub nicknames: Vec<String>,
    /// Biography.
    pub about: String,
    /// Portrait URL, empty when absent.
    pub image: String,
    /// Profile page URL.
    pub url: String,
    /// Favourite count.
    pub favorites: u64,
    /// Title of the first associated series, `"Unknown"` when absent.
    pub anime: String,
}

/// Character API adapter.
#[derive(Debug, Clone)]
pub struct CharacterAdapter {
    endpoint: String,
}

impl CharacterAdapter {
    /// Create an adapter for the API rooted at `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    fn base(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }

    fn search_url(&self, name: &str) -> Result<String> {
        url::Url::parse_with_params(
            &format!("{}/characters", self.base()),
            &[("q", name), ("limit", "1")],
        )
        .map(String::from)
        .map_err(|e| ScrapeError::Config(format!("invalid character endpoint: {e}")))
    }

    fn details_url(&self, id: u64) -> String {
        format!("{}/characters/{id}/full", self.base())
    }
}

impl SourceAdapter for CharacterAdapter {
    type Record = CharacterRecord;

    fn name(&self) -> &'static str {
        "character"
    }

    async fn run(&self, fetcher: &Fetcher, name: &str) -> ExtractionResult<CharacterRecord> {
        tracing::trace!(name, "character lookup");
        let outcome = async {
            let search = fetcher.get(&self.search_url(name)?, ContentKind::Json).await?;
            let Some(id) = first_search_id(&search)? else {
                return Ok(ExtractionResult::NotFound(NOT_FOUND_MESSAGE.into()));
            };
            tracing::debug!(id, "character search hit");
            let details = fetcher.get(&self.details_url(id), ContentKind::Json).await?;
            extract_character(&details, id).map(ExtractionResult::Success)
        }
        .await;
        ExtractionResult::from_outcome(FAILURE_CONTEXT, outcome)
    }
}

/// Id of the first search hit, or `None` for an empty search.
///
/// # Errors
///
/// Returns [`ScrapeError::Parse`] if the first hit has no numeric id.
pub fn first_search_id(document: &SourceDocument) -> Result<Option<u64>> {
    let root = document.parse_json()?;
    let Some(first) = json_path::get_present(&root, &[Key("data"), Index(0)]) else {
        return Ok(None);
    };
    json_path::get(first, &[Key("mal_id")])
        .and_then(Value::as_u64)
        .map(Some)
        .ok_or_else(|| ScrapeError::Parse("search hit has no id".into()))
}

/// Extract character details from the details payload.
///
/// # Errors
///
/// Returns [`ScrapeError::Parse`] if the payload has no `data.name`.
pub fn extract_character(document: &SourceDocument, id: u64) -> Result<CharacterRecord> {
    let root = document.parse_json()?;
    let data = json_path::get_present(&root, &[Key("data")])
        .ok_or_else(|| ScrapeError::Parse("details payload has no data".into()))?;
    let source = Source::Json(data);

    let name = FieldSpec::new("name", Strategy::Path(&[Key("name")]))
        .extract_text(source)?
        .ok_or_else(|| ScrapeError::Parse("details payload has no name".into()))?;
    let name_kanji = FieldSpec::new("name_kanji", Strategy::Path(&[Key("name_kanji")]))
        .extract_text(source)?
        .unwrap_or_default();
    let about = FieldSpec::new("about", Strategy::Path(&[Key("about")]))
        .or(Strategy::fixed_str("No description available"))
        .extract_text(source)?
        .unwrap_or_default();
    let image = FieldSpec::new(
        "image",
        Strategy::Path(&[Key("images"), Key("jpg"), Key("image_url")]),
    )
    .extract_text(source)?
    .unwrap_or_default();
    let url = FieldSpec::new("url", Strategy::Path(&[Key("url")]))
        .extract_text(source)?
        .unwrap_or_default();
    let anime = FieldSpec::new(
        "anime",
        Strategy::Path(&[Key("anime"), Index(0), Key("anime"), Key("title")]),
    )
    .or(Strategy::fixed_str("Unknown"))
    .extract_text(source)?
    .unwrap_or_default();

    let nicknames = FieldSpec::new("nicknames", Strategy::Path(&[Key("nicknames")]))
        .extract(source)?
        .as_ref()
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(json_path::value_to_text)
                .collect()
        })
        .unwrap_or_default();
    let favorites = FieldSpec::new("favorites", Strategy::Path(&[Key("favorites")]))
        .extract(source)?
        .as_ref()
        .and_then(Value::as_u64)
        .unwrap_or(0);

    Ok(CharacterRecord {
        id,
        name,
        name_kanji,
        nicknames,
        about,
        image,
        url,
        favorites,
        anime,
    })
}
