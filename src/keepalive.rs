//! Background self-ping that keeps a hosted instance from idling out.
//!
//! Failures are logged at debug level and otherwise ignored.

use crate::config::KeepaliveConfig;
use crate::error::{Result, ServerError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Per-ping request timeout.
const PING_TIMEOUT: Duration = Duration::from_secs(10);

/// Periodic GET of a fixed URL.
#[derive(Debug, Clone)]
pub struct Keepalive {
    client: reqwest::Client,
    url: String,
    interval: Duration,
}

impl Keepalive {
    /// Build a pinger from config.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &KeepaliveConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(PING_TIMEOUT)
            .build()
            .map_err(|e| ServerError::Config(format!("keepalive client: {e}")))?;
        Ok(Self {
            client,
            url: config.url.clone(),
            interval: Duration::from_secs(config.interval_seconds),
        })
    }

    /// Send one ping. Returns whether the upstream answered with 2xx.
    pub async fn ping(&self) -> bool {
        match self.client.get(&self.url).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(url = %self.url, "keepalive ping ok");
                true
            }
            Ok(response) => {
                debug!(url = %self.url, status = %response.status(), "keepalive ping rejected");
                false
            }
            Err(e) => {
                debug!(url = %self.url, error = %e, "keepalive ping failed");
                false
            }
        }
    }

    /// Start the ping loop. The first ping fires one interval after start.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(url = %self.url, every_secs = self.interval.as_secs(), "keepalive started");
            let start = tokio::time::Instant::now() + self.interval;
            let mut interval = tokio::time::interval_at(start, self.interval);
            loop {
                interval.tick().await;
                self.ping().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(url: String) -> KeepaliveConfig {
        KeepaliveConfig {
            url,
            interval_seconds: 1,
        }
    }

    #[tokio::test]
    async fn ping_reports_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let keepalive = Keepalive::new(&config(format!("{}/", server.uri()))).unwrap();
        assert!(keepalive.ping().await);
    }

    #[tokio::test]
    async fn ping_failures_are_swallowed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let keepalive = Keepalive::new(&config(server.uri())).unwrap();
        assert!(!keepalive.ping().await);

        let unreachable = Keepalive::new(&config("http://127.0.0.1:9".into())).unwrap();
        assert!(!unreachable.ping().await);
    }

    #[tokio::test]
    async fn loop_pings_after_interval() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let handle = Keepalive::new(&config(server.uri())).unwrap().spawn();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        handle.abort();

        let received = server.received_requests().await.unwrap();
        assert_eq!(received.len(), 1);
    }
}
