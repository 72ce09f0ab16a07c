mod blacklist;
mod cache;
mod card;
mod config;
mod error;
mod github;
mod handler;
mod locale;
mod params;
mod stats;

use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use github::GithubClient;
use handler::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    let client = GithubClient::new(config.access_token.clone())?;

    let state = Arc::new(AppState {
        fetcher: Arc::new(client),
        cache_override: config.cache_seconds,
    });
    let app = handler::router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(port = config.port, "serving stats cards");
    axum::serve(listener, app).await?;

    Ok(())
}
