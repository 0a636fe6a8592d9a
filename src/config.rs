//! Server configuration loaded from TOML.
//!
//! Every field has a default, so a missing or partial file still yields a
//! runnable server. The `PORT` environment variable overrides the port.

use crate::error::{Result, ServerError};
use scrapegate_extract::ScrapeConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "SCRAPEGATE_CONFIG";

/// Environment variable overriding the listen port.
pub const PORT_ENV: &str = "PORT";

/// Top-level server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Attribution value stamped on every JSON envelope.
    pub creator: String,
    /// Upper bound on one request's whole adapter run, in seconds.
    pub request_deadline_seconds: u64,
    /// Optional self-ping to keep a hosted instance awake.
    pub keepalive: Option<KeepaliveConfig>,
    /// Extraction layer settings.
    pub scrape: ScrapeConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 3000,
            creator: "Gabimaru".to_owned(),
            request_deadline_seconds: 20,
            keepalive: None,
            scrape: ScrapeConfig::default(),
        }
    }
}

/// Keep-alive pinger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeepaliveConfig {
    /// URL fetched on every tick.
    pub url: String,
    /// Seconds between pings.
    #[serde(default = "default_keepalive_interval")]
    pub interval_seconds: u64,
}

fn default_keepalive_interval() -> u64 {
    300
}

impl ServerConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Returns the default config file path: `~/.config/scrapegate/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("scrapegate").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("scrapegate")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/scrapegate-config/config.toml")
        }
    }

    /// Load from `$SCRAPEGATE_CONFIG`, else the default path if it exists,
    /// else built-in defaults. `$PORT` is applied last.
    ///
    /// # Errors
    ///
    /// Returns an error if a named file cannot be read or parsed, if `$PORT`
    /// is not a port number, or if validation fails.
    pub fn load() -> Result<Self> {
        let config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(std::path::Path::new(&path))?,
            None => {
                let path = Self::default_config_path();
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    tracing::debug!(path = %path.display(), "no config file, using defaults");
                    Self::default()
                }
            }
        };
        let port = std::env::var(PORT_ENV).ok();
        let config = config.with_port_override(port.as_deref())?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the port with `raw` when it is set.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] if `raw` is not a valid port.
    pub fn with_port_override(mut self, raw: Option<&str>) -> Result<Self> {
        if let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) {
            self.port = raw
                .parse()
                .map_err(|e| ServerError::Config(format!("{PORT_ENV}={raw:?} is not a port: {e}")))?;
        }
        Ok(self)
    }

    /// Validates this configuration, returning an error if any field is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.creator.trim().is_empty() {
            return Err(ServerError::Config("creator must not be empty".into()));
        }
        if self.request_deadline_seconds == 0 {
            return Err(ServerError::Config(
                "request_deadline_seconds must be greater than 0".into(),
            ));
        }
        if let Some(ref keepalive) = self.keepalive {
            if keepalive.interval_seconds == 0 {
                return Err(ServerError::Config(
                    "keepalive.interval_seconds must be greater than 0".into(),
                ));
            }
            let url = url::Url::parse(&keepalive.url)
                .map_err(|e| ServerError::Config(format!("keepalive.url is not a valid URL: {e}")))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ServerError::Config("keepalive.url must use http or https".into()));
            }
        }
        self.scrape.validate()?;
        Ok(())
    }

    /// `host:port` string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
