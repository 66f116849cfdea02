use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::features::{FeatureRecord, FeatureSchema, FeatureValue};

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Scoring service error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Scoring service returned {found} prediction(s) for {expected} row(s)")]
    RowCount { expected: usize, found: usize },

    #[error("Model produced a non-finite prediction: {0}")]
    NonFinite(f64),
}

/// An opaque regression model mapping a feature row to a log-salary.
#[async_trait]
pub trait SalaryModel: Send + Sync {
    /// One log-scale prediction per record, in input order.
    async fn predict_log(
        &self,
        schema: &FeatureSchema,
        records: &[FeatureRecord],
    ) -> Result<Vec<f64>, ScoringError>;
}

/// Converts a log-scale prediction to dollars. Negative results clamp to 0.
pub fn to_dollars(log_salary: f64) -> Result<f64, ScoringError> {
    if !log_salary.is_finite() {
        return Err(ScoringError::NonFinite(log_salary));
    }
    let dollars = log_salary.exp_m1();
    if !dollars.is_finite() {
        return Err(ScoringError::NonFinite(dollars));
    }
    Ok(dollars.max(0.0))
}

#[derive(Debug, Serialize)]
struct ScoreRequest<'a> {
    columns: &'a [String],
    categorical_columns: &'a [&'static str],
    rows: Vec<Vec<&'a FeatureValue>>,
}

#[derive(Debug, Deserialize)]
struct ScoreResponse {
    predictions: Vec<f64>,
}

/// A model served over HTTP. Rows are sent column-ordered by the schema.
#[derive(Clone)]
pub struct HttpSalaryModel {
    client: Client,
    url: String,
}

impl HttpSalaryModel {
    pub fn new(url: impl Into<String>) -> Result<Self, ScoringError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()?,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SalaryModel for HttpSalaryModel {
    async fn predict_log(
        &self,
        schema: &FeatureSchema,
        records: &[FeatureRecord],
    ) -> Result<Vec<f64>, ScoringError> {
        let body = ScoreRequest {
            columns: schema.names(),
            categorical_columns: schema.categorical(),
            rows: records.iter().map(|r| r.values().collect()).collect(),
        };

        let response = self.client.post(&self.url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ScoringError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ScoreResponse = response.json().await?;
        if parsed.predictions.len() != records.len() {
            return Err(ScoringError::RowCount {
                expected: records.len(),
                found: parsed.predictions.len(),
            });
        }

        debug!("Scored {} row(s) at {}", records.len(), self.url);
        Ok(parsed.predictions)
    }
}
