use std::sync::Arc;

use crate::config::Config;
use crate::matchmaker::pipeline::Matchmaker;
use crate::matchmaker::similarity::SimilarityService;

/// Shared application state injected into all route handlers via Axum extractors.
/// Everything here is constructed once in `main` and passed down explicitly.
#[derive(Clone)]
pub struct AppState {
    pub matchmaker: Arc<Matchmaker>,
    /// Same service the matchmaker uses; read by the health probe.
    pub similarity: Arc<dyn SimilarityService>,
    pub config: Config,
}
