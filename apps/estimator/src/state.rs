use crate::config::Config;
use crate::inference::Predictor;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Owns the generation client, both embedding caches, the feature schema
    /// and the two quantile models. All of it is read-only after startup.
    pub predictor: Predictor,
}
