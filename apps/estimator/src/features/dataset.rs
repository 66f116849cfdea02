use serde::Serialize;
use tracing::info;

use crate::embeddings::EmbeddingCache;
use crate::extraction::JoinedRow;
use crate::features::assembler::{assemble_features, FeatureError, FeatureRecord};
use crate::features::schema::FeatureSchema;

/// Salaries outside this open interval are treated as data-entry noise.
pub const MIN_SALARY: f64 = 10_000.0;
pub const MAX_SALARY: f64 = 500_000.0;

/// One training row: the feature record plus its log-scale target.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetRow {
    pub index: u64,
    #[serde(flatten)]
    pub features: FeatureRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_salary: Option<f64>,
}

/// Assembles features for every joined row through the same path as online
/// prediction. Rows whose salary falls outside the plausible range are
/// dropped; rows without a salary keep `target_salary = None`.
pub fn build_dataset_features(
    rows: &[JoinedRow],
    job_function_cache: &EmbeddingCache,
    skill_cache: &EmbeddingCache,
    schema: &FeatureSchema,
) -> Result<Vec<DatasetRow>, FeatureError> {
    let mut out = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;

    for row in rows {
        let target_salary = match row.posting.normalized_salary {
            Some(salary) if salary <= MIN_SALARY || salary >= MAX_SALARY || !salary.is_finite() => {
                dropped += 1;
                continue;
            }
            Some(salary) => Some(salary.ln_1p()),
            None => None,
        };

        let features = assemble_features(
            &row.posting,
            &row.details,
            job_function_cache,
            skill_cache,
            schema,
        )?;
        out.push(DatasetRow {
            index: row.index,
            features,
            target_salary,
        });
    }

    info!(
        "Built features for {} row(s), dropped {dropped} with implausible salaries",
        out.len()
    );
    Ok(out)
}
