//! scrapegate HTTP server binary.
//!
//! Reads `$SCRAPEGATE_CONFIG` (or `~/.config/scrapegate/config.toml`),
//! applies `$PORT`, and serves until Ctrl-C.

use scrapegate::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("scrapegate=info,scrapegate_extract=info,tower_http=info")
            }),
        )
        .init();

    tracing::info!("scrapegate-server starting");

    let config = ServerConfig::load().map_err(|e| {
        tracing::error!(error = %e, "invalid configuration");
        anyhow::anyhow!("scrapegate-server failed to load config: {e}")
    })?;

    scrapegate::serve(&config).await.map_err(|e| {
        tracing::error!(error = %e, "scrapegate-server exited with error");
        anyhow::anyhow!("scrapegate-server failed: {e}")
    })?;

    Ok(())
}
