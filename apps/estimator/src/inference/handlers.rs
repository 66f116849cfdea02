use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::{JobDetails, JobPosting};
use crate::features::FeatureRecord;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub title: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub location: String,
    pub description: String,
}

impl PredictRequest {
    /// Title and description carry most of the signal; both are required.
    fn into_posting(self) -> Result<JobPosting, AppError> {
        if self.title.trim().is_empty() || self.description.trim().is_empty() {
            return Err(AppError::Validation(
                "Please fill in at least the 'title' and 'description' fields.".to_string(),
            ));
        }
        Ok(JobPosting {
            index: None,
            title: Some(self.title),
            company_name: Some(self.company_name),
            location: Some(self.location),
            description: Some(self.description),
            normalized_salary: None,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction_id: Uuid,
    pub lower: f64,
    pub upper: f64,
    /// Both bounds rounded to the nearest hundred, e.g. `$120,000 - $160,000`.
    pub display: String,
    pub details: JobDetails,
}

#[derive(Debug, Serialize)]
pub struct FeaturesResponse {
    pub features: FeatureRecord,
    pub details: JobDetails,
}

/// POST /api/v1/predict
pub async fn handle_predict(
    State(state): State<AppState>,
    Json(req): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, AppError> {
    let posting = req.into_posting()?;
    let (record, details) = state.predictor.compute_features(&posting).await?;
    let range = state.predictor.range_for(&record).await?;

    Ok(Json(PredictResponse {
        prediction_id: Uuid::new_v4(),
        lower: range.lower,
        upper: range.upper,
        display: format!(
            "{} - {}",
            format_dollars(range.lower),
            format_dollars(range.upper)
        ),
        details,
    }))
}

/// POST /api/v1/features
pub async fn handle_features(
    State(state): State<AppState>,
    Json(req): Json<PredictRequest>,
) -> Result<Json<FeaturesResponse>, AppError> {
    let posting = req.into_posting()?;
    let (features, details) = state.predictor.compute_features(&posting).await?;
    Ok(Json(FeaturesResponse { features, details }))
}

/// `$123,400` style rendering, rounded to the nearest hundred.
pub fn format_dollars(amount: f64) -> String {
    let rounded = ((amount / 100.0).round() * 100.0).max(0.0) as u64;
    let digits = rounded.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    format!("${out}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_dollars_rounds_to_hundreds() {
        assert_eq!(format_dollars(123_449.0), "$123,400");
        assert_eq!(format_dollars(99_950.0), "$100,000");
        assert_eq!(format_dollars(0.0), "$0");
        assert_eq!(format_dollars(1_234_567.0), "$1,234,600");
    }

    #[test]
    fn test_blank_title_is_rejected() {
        let req = PredictRequest {
            title: "  ".into(),
            company_name: String::new(),
            location: String::new(),
            description: "A long enough description of the role.".into(),
        };
        assert!(matches!(req.into_posting(), Err(AppError::Validation(_))));
    }
}
