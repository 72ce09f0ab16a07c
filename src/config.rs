//! Environment configuration, read once at startup.

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// GitHub token used for the GraphQL and search APIs.
    pub access_token: String,
    /// Optional `CACHE_SECONDS` override for the card cache duration.
    pub cache_seconds: Option<u32>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let access_token =
            std::env::var("ACCESS_TOKEN").context("ACCESS_TOKEN environment variable not set")?;
        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);
        let cache_seconds = std::env::var("CACHE_SECONDS")
            .ok()
            .and_then(|v| v.trim().parse().ok());

        Ok(Self {
            port,
            access_token,
            cache_seconds,
        })
    }
}
