//! Structured job-detail extraction from a free-text job description.
//!
//! Policy: a description shorter than `MIN_DESCRIPTION_CHARS` (after trimming)
//! never reaches the service. Unusable service output is retried; once the
//! attempts are spent the caller gets the degraded record and a warning is
//! logged. Prediction must still produce an answer for any input.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::extraction::prompts::{
    DOMAIN_SKILLS_DESCRIPTION, EDUCATION_DESCRIPTION, EXPERIENCE_DESCRIPTION,
    JOB_DETAILS_PROMPT_TEMPLATE, JOB_DETAILS_SYSTEM, SOFT_SKILLS_DESCRIPTION,
    TECHNICAL_SKILLS_DESCRIPTION,
};
use crate::llm_client::prompts::NO_INVENTION_INSTRUCTION;
use crate::llm_client::{LlmError, StructuredRequest, TextGeneration};

/// Descriptions shorter than this are treated as malformed.
pub const MIN_DESCRIPTION_CHARS: usize = 20;
/// Structured-call attempts before degrading.
pub const MAX_EXTRACTION_ATTEMPTS: u32 = 3;
/// Experience value the model uses for "not stated".
pub const EXPERIENCE_NOT_STATED: i64 = -1;

/// Education values the model may return.
pub const EDUCATION_VOCABULARY: &[&str] = &[
    "High School",
    "Associate's",
    "Bachelor's",
    "Master's",
    "PhD",
    "Unspecified",
];

/// Structured details extracted from one job description.
///
/// The degraded record (`JobDetails::default()`) has empty skill lists and
/// `None` for both scalar fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobDetails {
    pub technical_skills: Vec<String>,
    pub soft_skills: Vec<String>,
    pub domain_skills: Vec<String>,
    /// Deduplicated union of the three skill lists.
    pub skills: Vec<String>,
    /// `Some(-1)` when the description states no requirement.
    pub experience_years_required: Option<i64>,
    pub education_level: Option<String>,
}

impl JobDetails {
    /// The neutral record used whenever extraction is impossible.
    pub fn degraded() -> Self {
        Self::default()
    }

    fn from_parts(
        technical_skills: Vec<String>,
        soft_skills: Vec<String>,
        domain_skills: Vec<String>,
        experience_years_required: i64,
        education_level: String,
    ) -> Self {
        let skills = technical_skills
            .iter()
            .chain(&soft_skills)
            .chain(&domain_skills)
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Self {
            technical_skills,
            soft_skills,
            domain_skills,
            skills,
            experience_years_required: Some(experience_years_required),
            education_level: Some(education_level),
        }
    }
}

static JOB_DETAILS_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    let string_list = |description: &str| {
        json!({
            "type": "array",
            "items": { "type": "string" },
            "description": description,
        })
    };

    json!({
        "type": "object",
        "properties": {
            "technical_skills": string_list(TECHNICAL_SKILLS_DESCRIPTION),
            "soft_skills": string_list(SOFT_SKILLS_DESCRIPTION),
            "domain_skills": string_list(DOMAIN_SKILLS_DESCRIPTION),
            "experience_years_required": {
                "type": "integer",
                "description": EXPERIENCE_DESCRIPTION,
            },
            "education_level": {
                "type": "string",
                "enum": EDUCATION_VOCABULARY,
                "description": EDUCATION_DESCRIPTION,
            },
        },
        "required": [
            "technical_skills",
            "soft_skills",
            "domain_skills",
            "experience_years_required",
            "education_level",
        ],
        "additionalProperties": false,
    })
});

/// The declared output schema sent with every extraction request.
pub fn job_details_schema() -> &'static Value {
    &JOB_DETAILS_SCHEMA
}

/// Wire shape of the model's answer, before validation.
#[derive(Debug, Deserialize)]
struct RawJobDetails {
    technical_skills: Vec<String>,
    soft_skills: Vec<String>,
    domain_skills: Vec<String>,
    experience_years_required: serde_json::Number,
    education_level: String,
}

/// Validates a model answer against the declared field shapes.
pub fn parse_job_details(value: Value) -> Result<JobDetails, LlmError> {
    let raw: RawJobDetails = serde_json::from_value(value)
        .map_err(|e| LlmError::Schema(format!("job details: {e}")))?;

    let experience = match raw.experience_years_required.as_i64() {
        Some(years) => years,
        // Decimals are rounded to the nearest whole year.
        None => raw
            .experience_years_required
            .as_f64()
            .map(|years| years.round() as i64)
            .ok_or_else(|| LlmError::Schema("experience_years_required is not a number".into()))?,
    };
    if experience < EXPERIENCE_NOT_STATED {
        return Err(LlmError::Schema(format!(
            "experience_years_required must be >= -1, got {experience}"
        )));
    }

    let education = EDUCATION_VOCABULARY
        .iter()
        .find(|allowed| allowed.eq_ignore_ascii_case(raw.education_level.trim()))
        .ok_or_else(|| {
            LlmError::Schema(format!(
                "education_level '{}' is outside the allowed vocabulary",
                raw.education_level
            ))
        })?;

    Ok(JobDetails::from_parts(
        clean_list(raw.technical_skills),
        clean_list(raw.soft_skills),
        clean_list(raw.domain_skills),
        experience,
        (*education).to_string(),
    ))
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Extracts `JobDetails` from a description through the generation service.
///
/// Never fails: short or missing descriptions and exhausted retries both yield
/// `JobDetails::degraded()`.
pub async fn get_job_details(
    description: Option<&str>,
    llm: &dyn TextGeneration,
    decoder_model: &str,
) -> JobDetails {
    let Some(description) = description.filter(|d| d.trim().chars().count() >= MIN_DESCRIPTION_CHARS)
    else {
        debug!("Invalid description, skipping extraction");
        return JobDetails::degraded();
    };

    let prompt = format!(
        "{}\n\n{}",
        JOB_DETAILS_PROMPT_TEMPLATE.replace("{description}", description),
        NO_INVENTION_INSTRUCTION
    );
    let request = StructuredRequest {
        model: decoder_model,
        system: JOB_DETAILS_SYSTEM,
        prompt: &prompt,
        schema_name: "job_details",
        schema: job_details_schema(),
    };

    let mut attempt = 0;
    loop {
        attempt += 1;
        let result = llm
            .generate_structured(&request)
            .await
            .and_then(parse_job_details);

        match result {
            Ok(details) => return details,
            Err(e) if e.is_output_error() && attempt < MAX_EXTRACTION_ATTEMPTS => {
                warn!("Job details attempt {attempt} unusable, retrying: {e}");
            }
            Err(e) => {
                warn!("Job details extraction failed after {attempt} attempt(s): {e}");
                return JobDetails::degraded();
            }
        }
    }
}
