use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::features::FeatureError;
use crate::inference::{PredictError, ScoringError};
use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Generation service unavailable: {0}")]
    LlmUnavailable(LlmError),

    #[error("Feature error: {0}")]
    Feature(#[from] FeatureError),

    #[error("Scoring error: {0}")]
    Scoring(#[from] ScoringError),
}

impl From<PredictError> for AppError {
    fn from(err: PredictError) -> Self {
        match err {
            PredictError::LlmUnavailable(e) => AppError::LlmUnavailable(e),
            PredictError::Feature(e) => AppError::Feature(e),
            PredictError::Scoring(e) => AppError::Scoring(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::LlmUnavailable(e) => {
                tracing::error!("Generation service unavailable: {e}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "LLM_UNAVAILABLE",
                    "Could not reach the text-generation server. \
                     Please restart the Ollama server and make sure the model is available."
                        .to_string(),
                )
            }
            AppError::Feature(e) => {
                tracing::error!("Feature assembly error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "FEATURE_ERROR",
                    "Feature assembly failed".to_string(),
                )
            }
            AppError::Scoring(e) => {
                tracing::error!("Scoring error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "SCORING_ERROR",
                    "The salary model could not produce a prediction".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
