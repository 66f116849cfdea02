use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::embeddings::EmbeddingCache;
use crate::extraction::{get_job_details, JobDetails, JobPosting};
use crate::features::{assemble_features, FeatureError, FeatureRecord, FeatureSchema};
use crate::inference::scoring::{to_dollars, SalaryModel, ScoringError};
use crate::llm_client::{LlmError, TextGeneration};

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("Generation service unavailable: {0}")]
    LlmUnavailable(LlmError),

    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

/// Predicted annual salary bounds in dollars.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SalaryRange {
    pub lower: f64,
    pub upper: f64,
}

/// Single-record inference: probe, extract, assemble, score.
///
/// Everything it holds is read-only and shared, so one predictor serves
/// concurrent requests.
#[derive(Clone)]
pub struct Predictor {
    llm: Arc<dyn TextGeneration>,
    decoder_model: String,
    job_function_cache: Arc<EmbeddingCache>,
    skill_cache: Arc<EmbeddingCache>,
    schema: FeatureSchema,
    lower: Arc<dyn SalaryModel>,
    upper: Arc<dyn SalaryModel>,
}

impl Predictor {
    pub fn new(
        llm: Arc<dyn TextGeneration>,
        decoder_model: impl Into<String>,
        job_function_cache: Arc<EmbeddingCache>,
        skill_cache: Arc<EmbeddingCache>,
        schema: FeatureSchema,
        lower: Arc<dyn SalaryModel>,
        upper: Arc<dyn SalaryModel>,
    ) -> Self {
        Self {
            llm,
            decoder_model: decoder_model.into(),
            job_function_cache,
            skill_cache,
            schema,
            lower,
            upper,
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Builds the feature record for one posting. Fails fast when the
    /// generation service cannot be reached; extraction problems past that
    /// point degrade instead of failing.
    pub async fn compute_features(
        &self,
        posting: &JobPosting,
    ) -> Result<(FeatureRecord, JobDetails), PredictError> {
        self.llm.probe().await.map_err(|e| {
            warn!("Generation service probe failed: {e}");
            PredictError::LlmUnavailable(e)
        })?;

        let details = get_job_details(
            posting.description.as_deref(),
            self.llm.as_ref(),
            &self.decoder_model,
        )
        .await;

        let record = assemble_features(
            posting,
            &details,
            &self.job_function_cache,
            &self.skill_cache,
            &self.schema,
        )?;
        Ok((record, details))
    }

    /// Scores an already assembled record with one model, in dollars.
    pub async fn score(
        &self,
        record: &FeatureRecord,
        model: &dyn SalaryModel,
    ) -> Result<f64, PredictError> {
        let predictions = model
            .predict_log(&self.schema, std::slice::from_ref(record))
            .await?;
        let log_salary = predictions
            .first()
            .copied()
            .ok_or(ScoringError::RowCount {
                expected: 1,
                found: 0,
            })?;
        Ok(to_dollars(log_salary)?)
    }

    /// Dollar prediction of one model for one posting.
    pub async fn predict_salary(
        &self,
        posting: &JobPosting,
        model: &dyn SalaryModel,
    ) -> Result<f64, PredictError> {
        let (record, _) = self.compute_features(posting).await?;
        self.score(&record, model).await
    }

    /// Lower and upper bound for one posting. Features are assembled once and
    /// both quantile models are queried concurrently.
    pub async fn predict_range(&self, posting: &JobPosting) -> Result<SalaryRange, PredictError> {
        let (record, _) = self.compute_features(posting).await?;
        self.range_for(&record).await
    }

    pub async fn range_for(&self, record: &FeatureRecord) -> Result<SalaryRange, PredictError> {
        let (lower, upper) = tokio::try_join!(
            self.score(record, self.lower.as_ref()),
            self.score(record, self.upper.as_ref())
        )?;

        let range = if lower <= upper {
            SalaryRange { lower, upper }
        } else {
            warn!("Quantile models crossed ({lower:.0} > {upper:.0}), swapping bounds");
            SalaryRange {
                lower: upper,
                upper: lower,
            }
        };
        info!("Predicted salary range: ${:.0} - ${:.0}", range.lower, range.upper);
        Ok(range)
    }
}
