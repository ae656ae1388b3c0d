use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Absent key means the similarity service is not configured.
    pub gemini_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    /// Bounded worker pool size for the Scoring stage.
    pub match_concurrency: usize,
    pub match_timeout: Duration,
    pub retry_base_delay: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            gemini_api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            match_concurrency: parse_env::<usize>("MATCH_CONCURRENCY", 2)?.max(1),
            match_timeout: Duration::from_secs(parse_env("MATCH_TIMEOUT_SECS", 300)?),
            retry_base_delay: Duration::from_millis(parse_env("MATCH_RETRY_BASE_MS", 1000)?),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .ok()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
