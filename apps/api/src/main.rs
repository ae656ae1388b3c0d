mod config;
mod db;
mod errors;
mod llm_client;
mod matchmaker;
mod models;
mod retry;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::matchmaker::gateway::PgGateway;
use crate::matchmaker::pipeline::Matchmaker;
use crate::matchmaker::similarity::{
    LlmSimilarityService, SimilarityBatchClient, SimilarityService, UnconfiguredSimilarityService,
};
use crate::retry::RetryPolicy;
use crate::routes::build_router;
use crate::state::AppState;

const SIMILARITY_MAX_ATTEMPTS: u32 = 3;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Matchmaker API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    let gateway = Arc::new(PgGateway::new(db));

    // Initialize similarity service
    let similarity: Arc<dyn SimilarityService> = match &config.gemini_api_key {
        Some(key) => {
            let llm = LlmClient::new(key.clone());
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Arc::new(LlmSimilarityService::new(llm))
        }
        None => {
            warn!("GEMINI_API_KEY not set; matching will use exact skill matches only");
            Arc::new(UnconfiguredSimilarityService)
        }
    };

    let batch_client = SimilarityBatchClient::new(
        similarity.clone(),
        RetryPolicy::new(SIMILARITY_MAX_ATTEMPTS, config.retry_base_delay),
    );
    let matchmaker = Arc::new(Matchmaker::new(
        gateway,
        batch_client,
        config.match_concurrency,
    ));
    info!(
        "Matchmaker initialized ({} workers, {}s run timeout)",
        config.match_concurrency,
        config.match_timeout.as_secs()
    );

    // Build app state
    let state = AppState {
        matchmaker,
        similarity,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
