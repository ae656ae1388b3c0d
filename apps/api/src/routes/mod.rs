pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::matchmaker::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/health", get(health::similarity_health_handler))
        // Matchmaker API
        .route(
            "/api/matchmaker/jd-to-cv",
            post(handlers::handle_match_jd_to_cv),
        )
        .route(
            "/api/matchmaker/health",
            get(handlers::handle_matchmaker_health),
        )
        .with_state(state)
}
