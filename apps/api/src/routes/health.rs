use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Liveness only: the process is up and serving.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "matchmaker-api"
    }))
}

/// GET /api/health
/// Reports whether the similarity service is configured. When it is not,
/// matching still runs on exact matches only.
pub async fn similarity_health_handler(State(state): State<AppState>) -> Json<Value> {
    let available = state.similarity.is_configured();
    Json(json!({
        "status": if available { "healthy" } else { "degraded" },
        "similarity_available": available,
        "model": state.similarity.model()
    }))
}
