pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::inference::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/predict", post(handlers::handle_predict))
        .route("/api/v1/features", post(handlers::handle_features))
        .with_state(state)
}
