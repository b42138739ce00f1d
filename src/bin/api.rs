use horoscope_proxy::{api::start_server, config::Config, upstream::AstroApiClient};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load environment variables
    let config = Config::from_env()?;

    info!("🚀 Horoscope Proxy - API Server");
    info!("📍 Port: {}", config.port);
    info!("🔭 Upstream: {}", config.base_url);
    info!("⏱️  Upstream timeout: {:?}", config.timeout);

    let upstream = Arc::new(AstroApiClient::new(&config)?);

    info!("📡 Starting API server...");

    start_server(upstream, config.port).await?;

    Ok(())
}
