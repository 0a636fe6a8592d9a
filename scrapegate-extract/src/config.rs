//! Extraction configuration with sensible defaults.
//!
//! [`ScrapeConfig`] controls upstream endpoints, fetch deadlines, the
//! User-Agent and headless rendering. Every upstream base URL is
//! overridable so tests can point adapters at a local mock server.

use crate::error::ScrapeError;
use serde::{Deserialize, Serialize};

/// Configuration shared by every adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Per-fetch HTTP deadline in seconds.
    pub timeout_seconds: u64,
    /// Custom User-Agent string. If `None`, rotates through a built-in list
    /// of realistic browser User-Agents.
    pub user_agent: Option<String>,
    /// Upstream base URLs.
    pub endpoints: Endpoints,
    /// Headless rendering settings for the screenshot adapter.
    pub render: RenderConfig,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 8,
            user_agent: None,
            endpoints: Endpoints::default(),
            render: RenderConfig::default(),
        }
    }
}

/// Upstream base URLs, one per adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// Passage page for the verse adapter.
    pub verse_url: String,
    /// Random quote page.
    pub quote_url: String,
    /// Geo-IP JSON API; the IP literal is appended as a path segment.
    pub geoip_url: String,
    /// Video search results page.
    pub video_search_url: String,
    /// Form-POST analysis endpoint for download links.
    pub download_url: String,
    /// Short-video search page.
    pub short_video_url: String,
    /// Character database API root.
    pub character_url: String,
    /// Chat reply JSON API.
    pub chat_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            verse_url: "https://www.biblegateway.com/passage/".into(),
            quote_url: "https://quotes.toscrape.com/random".into(),
            geoip_url: "http://ip-api.com/json".into(),
            video_search_url: "https://www.youtube.com/results".into(),
            download_url: "https://www.y2mate.com/mates/analyzeV2/ajax".into(),
            short_video_url: "https://www.tiktok.com/search".into(),
            character_url: "https://api.jikan.moe/v4".into(),
            chat_url: "https://api.simsimi.vn/v1/simtalk".into(),
        }
    }
}

impl Endpoints {
    /// Point every endpoint at `base`, keeping each default path.
    ///
    /// Used to route all adapters to a single mock server in tests.
    pub fn rebased(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            verse_url: format!("{base}/passage/"),
            quote_url: format!("{base}/random"),
            geoip_url: format!("{base}/json"),
            video_search_url: format!("{base}/results"),
            download_url: format!("{base}/mates/analyzeV2/ajax"),
            short_video_url: format!("{base}/search"),
            character_url: format!("{base}/v4"),
            chat_url: format!("{base}/v1/simtalk"),
        }
    }

    fn all(&self) -> [(&'static str, &str); 8] {
        [
            ("verse_url", &self.verse_url),
            ("quote_url", &self.quote_url),
            ("geoip_url", &self.geoip_url),
            ("video_search_url", &self.video_search_url),
            ("download_url", &self.download_url),
            ("short_video_url", &self.short_video_url),
            ("character_url", &self.character_url),
            ("chat_url", &self.chat_url),
        ]
    }
}

/// Headless browser settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Explicit browser binary. If `None`, common Chromium names are
    /// looked up on `PATH`.
    pub chromium_path: Option<String>,
    /// Viewport width in pixels.
    pub window_width: u32,
    /// Viewport height in pixels.
    pub window_height: u32,
    /// Virtual time budget granted to the page before capture, in
    /// milliseconds. Chromium only advances virtual time while the network
    /// is idle, so this bounds the wait for network idle.
    pub idle_budget_ms: u64,
    /// Hard deadline for one render, in seconds.
    pub timeout_seconds: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            chromium_path: None,
            window_width: 1280,
            window_height: 720,
            idle_budget_ms: 5_000,
            timeout_seconds: 30,
        }
    }
}

impl ScrapeConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `timeout_seconds` and `render.timeout_seconds` must be greater than 0
    /// - every endpoint must be an absolute `http`/`https` URL
    /// - the render viewport must be non-empty
    pub fn validate(&self) -> Result<(), ScrapeError> {
        if self.timeout_seconds == 0 {
            return Err(ScrapeError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.render.timeout_seconds == 0 {
            return Err(ScrapeError::Config(
                "render.timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.render.window_width == 0 || self.render.window_height == 0 {
            return Err(ScrapeError::Config(
                "render window size must be non-zero".into(),
            ));
        }
        for (name, value) in self.endpoints.all() {
            let parsed = url::Url::parse(value)
                .map_err(|e| ScrapeError::Config(format!("{name} is not a valid URL: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ScrapeError::Config(format!(
                    "{name} must use http or https"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sensible_values() {
        let config = ScrapeConfig::default();
        assert_eq!(config.timeout_seconds, 8);
        assert!(config.user_agent.is_none());
        assert_eq!(config.render.window_width, 1280);
        assert_eq!(config.render.idle_budget_ms, 5_000);
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(ScrapeConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = ScrapeConfig {
            timeout_seconds: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout_seconds"));
    }

    #[test]
    fn relative_endpoint_rejected() {
        let mut config = ScrapeConfig::default();
        config.endpoints.quote_url = "/random".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("quote_url"));
    }

    #[test]
    fn non_http_endpoint_rejected() {
        let mut config = ScrapeConfig::default();
        config.endpoints.chat_url = "ftp://example.com/chat".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("http"));
    }

    #[test]
    fn rebased_endpoints_share_one_host() {
        let endpoints = Endpoints::rebased("http://127.0.0.1:9999/");
        assert_eq!(endpoints.geoip_url, "http://127.0.0.1:9999/json");
        assert_eq!(endpoints.character_url, "http://127.0.0.1:9999/v4");
        let config = ScrapeConfig {
            endpoints,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_like_input_keeps_defaults() {
        let config: ScrapeConfig =
            serde_json::from_str(r#"{"timeout_seconds": 3}"#).expect("deserialize");
        assert_eq!(config.timeout_seconds, 3);
        assert_eq!(
            config.endpoints.quote_url,
            "https://quotes.toscrape.com/random"
        );
    }
}
