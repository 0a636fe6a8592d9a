//! Geo-IP lookup against a JSON API.
//!
//! The upstream signals unknown or reserved addresses with
//! `"status": "fail"`. That is reported as not found, whatever other fields
//! the payload carries.

use crate::adapter::SourceAdapter;
use crate::document::{ContentKind, Source, SourceDocument};
use crate::error::{Result, ScrapeError};
use crate::field::{FieldSpec, Strategy};
use crate::http::Fetcher;
use crate::json_path::{self, Segment, Segment::Key};
use crate::result::ExtractionResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const FAILURE_CONTEXT: &str = "Failed to fetch IP information";

/// Upstream status literal for failed lookups.
const FAIL_STATUS: &str = "fail";

/// Location details for one IP address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoRecord {
    /// The address the upstream resolved.
    pub ip: String,
    /// Country name.
    pub country: String,
    /// Region or state name.
    pub region: String,
    /// City name.
    pub city: String,
    /// Internet service provider.
    pub isp: String,
    /// IANA time zone.
    pub timezone: String,
    /// Latitude, `null` when absent.
    pub lat: Value,
    /// Longitude, `null` when absent.
    pub lon: Value,
}

/// Geo-IP API adapter.
#[derive(Debug, Clone)]
pub struct GeoIpAdapter {
    endpoint: String,
}

impl GeoIpAdapter {
    /// Create an adapter for the API rooted at `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    fn request_url(&self, ip: &str) -> Result<String> {
        let mut url = url::Url::parse(&self.endpoint)
            .map_err(|e| ScrapeError::Config(format!("invalid geo-IP endpoint: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| ScrapeError::Config("geo-IP endpoint cannot take a path".into()))?
            .pop_if_empty()
            .push(ip);
        Ok(url.into())
    }
}

impl SourceAdapter for GeoIpAdapter {
    type Record = GeoRecord;

    fn name(&self) -> &'static str {
        "geoip"
    }

    async fn run(&self, fetcher: &Fetcher, ip: &str) -> ExtractionResult<GeoRecord> {
        tracing::trace!(ip, "geo-IP lookup");
        let outcome = async {
            let url = self.request_url(ip)?;
            let document = fetcher.get(&url, ContentKind::Json).await?;
            extract_geo(&document)
        }
        .await;
        ExtractionResult::from_outcome(FAILURE_CONTEXT, outcome)
    }
}

fn path_spec(name: &'static str, path: &'static [Segment]) -> FieldSpec {
    FieldSpec::new(name, Strategy::Path(path))
}

/// Extract a geo record from the API payload.
///
/// # Errors
///
/// Returns [`ScrapeError::Parse`] for invalid JSON or a non-object root.
pub fn extract_geo(document: &SourceDocument) -> Result<ExtractionResult<GeoRecord>> {
    let root = document.parse_json()?;
    if !root.is_object() {
        return Err(ScrapeError::Parse("geo-IP payload is not an object".into()));
    }

    if json_path::get_str(&root, &[Key("status")]).as_deref() == Some(FAIL_STATUS) {
        let message = json_path::get_str(&root, &[Key("message")]);
        tracing::debug!(?message, "geo-IP upstream reported failure");
        let reason = match message {
            Some(m) => format!("IP address not found: {m}"),
            None => "IP address not found".to_owned(),
        };
        return Ok(ExtractionResult::NotFound(reason));
    }

    let source = Source::Json(&root);
    let text = |name: &'static str, path: &'static [Segment]| -> Result<String> {
        Ok(path_spec(name, path).extract_text(source)?.unwrap_or_default())
    };
    let number = |name: &'static str, path: &'static [Segment]| -> Result<Value> {
        Ok(path_spec(name, path).extract(source)?.unwrap_or(Value::Null))
    };

    Ok(ExtractionResult::Success(GeoRecord {
        ip: text("ip", &[Key("query")])?,
        country: text("country", &[Key("country")])?,
        region: text("region", &[Key("regionName")])?,
        city: text("city", &[Key("city")])?,
        isp: text("isp", &[Key("isp")])?,
        timezone: text("timezone", &[Key("timezone")])?,
        lat: number("lat", &[Key("lat")])?,
        lon: number("lon", &[Key("lon")])?,
    }))
}
