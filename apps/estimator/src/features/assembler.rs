use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::embeddings::{
    aggregate_skills, EmbeddingCache, JOB_FUNCTION_EMB_PREFIX, MAX_SKILL_EMB_PREFIX,
    MEAN_SKILL_EMB_PREFIX,
};
use crate::extraction::{JobDetails, JobPosting};
use crate::features::schema::{self, FeatureSchema};
use crate::normalize::{
    clean_skill_list, extract_job_function, extract_seniority, normalize_education,
    normalize_location,
};

/// Stands in for a missing company name or experience value inside
/// interaction strings.
const MISSING: &str = "unknown";
const NO_EXPERIENCE: &str = "none";

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("Feature record does not match the schema (missing: {missing:?}, unexpected: {unexpected:?})")]
    SchemaMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("{cache} cache has {found} dimensions but the schema expects {expected}")]
    CacheDimension {
        cache: &'static str,
        expected: usize,
        found: usize,
    },
}

/// One feature value. Serializes as a bare string or number; a missing
/// numeric (`NaN`) serializes as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Categorical(String),
    Numeric(f64),
}

impl FeatureValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FeatureValue::Categorical(s) => Some(s),
            FeatureValue::Numeric(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Numeric(v) => Some(*v),
            FeatureValue::Categorical(_) => None,
        }
    }
}

/// A feature name to value map whose keys equal its schema's names.
/// Only `assemble_features` builds one, so holding a record means it was
/// validated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureRecord(BTreeMap<String, FeatureValue>);

impl FeatureRecord {
    fn validated(
        values: BTreeMap<String, FeatureValue>,
        schema: &FeatureSchema,
    ) -> Result<Self, FeatureError> {
        let (missing, unexpected) = schema.diff(values.keys().map(String::as_str));
        if !missing.is_empty() || !unexpected.is_empty() {
            return Err(FeatureError::SchemaMismatch {
                missing,
                unexpected,
            });
        }
        Ok(Self(values))
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FeatureValue)> {
        self.0.iter()
    }

    /// Values in sorted-name order, which is the schema's column order.
    pub fn values(&self) -> impl Iterator<Item = &FeatureValue> {
        self.0.values()
    }
}

fn check_dimension(
    cache: &'static str,
    embeddings: &EmbeddingCache,
    schema: &FeatureSchema,
) -> Result<(), FeatureError> {
    if embeddings.dimension() == schema.embedding_dim() {
        Ok(())
    } else {
        Err(FeatureError::CacheDimension {
            cache,
            expected: schema.embedding_dim(),
            found: embeddings.dimension(),
        })
    }
}

fn explode(values: &mut BTreeMap<String, FeatureValue>, prefix: &str, vector: &[f32]) {
    for (i, v) in vector.iter().enumerate() {
        values.insert(format!("{prefix}{i}"), FeatureValue::Numeric(f64::from(*v)));
    }
}

/// Builds the canonical feature record for one posting and its extracted
/// details. Training and inference both go through here.
pub fn assemble_features(
    posting: &JobPosting,
    details: &JobDetails,
    job_function_cache: &EmbeddingCache,
    skill_cache: &EmbeddingCache,
    schema: &FeatureSchema,
) -> Result<FeatureRecord, FeatureError> {
    check_dimension("job function", job_function_cache, schema)?;
    check_dimension("skill", skill_cache, schema)?;

    let location = normalize_location(posting.location.as_deref());
    let seniority = extract_seniority(posting.title.as_deref());
    let job_function = extract_job_function(posting.title.as_deref());
    let education = normalize_education(details.education_level.as_deref());
    let company = posting.company_name.as_deref().unwrap_or(MISSING);

    let experience = details.experience_years_required;
    let experience_label = experience
        .map(|years| years.to_string())
        .unwrap_or_else(|| NO_EXPERIENCE.to_string());

    // Cleaning can fold case variants together; each skill counts once.
    let skills: Vec<String> = clean_skill_list(Some(details.skills.as_slice()))
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let (mean_skill, max_skill) = aggregate_skills(Some(skills.as_slice()), skill_cache);
    let job_function_emb = job_function_cache.lookup_one(&job_function);

    let mut values: BTreeMap<String, FeatureValue> = BTreeMap::new();
    let mut categorical = |name: &str, value: String| {
        values.insert(name.to_string(), FeatureValue::Categorical(value));
    };

    categorical(schema::SENIORITY_JOB_FUNCTION, format!("{seniority}_{job_function}"));
    categorical(schema::LOCATION_JOB_FUNCTION, format!("{location}_{job_function}"));
    categorical(
        schema::SENIORITY_FUNCTION_LOCATION,
        format!("{seniority}_{job_function}_{location}"),
    );
    categorical(schema::COMPANY_EXPERIENCE, format!("{company}_{experience_label}"));
    categorical(
        schema::JOB_FUNCTION_EXPERIENCE,
        format!("{job_function}_{experience_label}"),
    );
    categorical(
        schema::SENIORITY_FUNCTION_EXPERIENCE,
        format!("{seniority}_{job_function}_{experience_label}"),
    );
    categorical(schema::EDUCATION, education);
    categorical(schema::SENIORITY, seniority);
    categorical(schema::JOB_FUNCTION, job_function);
    categorical(schema::LOCATION, location);
    categorical(schema::COMPANY, company.to_string());

    values.insert(
        schema::EXPERIENCE.to_string(),
        FeatureValue::Numeric(experience.map_or(f64::NAN, |years| years as f64)),
    );

    explode(&mut values, MEAN_SKILL_EMB_PREFIX, &mean_skill);
    explode(&mut values, MAX_SKILL_EMB_PREFIX, &max_skill);
    explode(&mut values, JOB_FUNCTION_EMB_PREFIX, &job_function_emb);

    FeatureRecord::validated(values, schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::cache::tests::cache_of;

    fn caches() -> (EmbeddingCache, EmbeddingCache) {
        let job_functions = cache_of(&[("data_scientist", &[0.1, 0.2, 0.3])]);
        let skills = cache_of(&[("python", &[1.0, 0.0, -1.0]), ("sql", &[0.0, 2.0, 1.0])]);
        (job_functions, skills)
    }

    fn posting(title: &str, company: &str, location: &str) -> JobPosting {
        JobPosting {
            index: None,
            title: Some(title.into()),
            company_name: Some(company.into()),
            location: Some(location.into()),
            description: Some("irrelevant to assembly".into()),
            normalized_salary: None,
        }
    }

    fn details(experience: Option<i64>) -> JobDetails {
        JobDetails {
            technical_skills: vec!["Python".into(), "SQL".into()],
            skills: vec!["Python".into(), "SQL".into(), " python".into()],
            experience_years_required: experience,
            education_level: Some("Master's".into()),
            ..JobDetails::default()
        }
    }

    fn categorical<'a>(record: &'a FeatureRecord, name: &str) -> &'a str {
        record.get(name).and_then(FeatureValue::as_str).unwrap()
    }

    #[test]
    fn test_record_keys_equal_schema_names() {
        let (jf, sk) = caches();
        let schema = FeatureSchema::new(3);
        let record = assemble_features(
            &posting("Senior Data Scientist", "Tech Inc", "New York, NY"),
            &details(Some(5)),
            &jf,
            &sk,
            &schema,
        )
        .unwrap();

        let keys: Vec<&String> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, schema.names().iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_inputs_still_satisfy_the_schema() {
        let (jf, sk) = caches();
        let schema = FeatureSchema::new(3);
        let record = assemble_features(
            &posting("", "", ""),
            &JobDetails::degraded(),
            &jf,
            &sk,
            &schema,
        )
        .unwrap();

        assert_eq!(record.len(), schema.len());
        assert_eq!(categorical(&record, "cleaned_location"), "other_us");
        assert_eq!(categorical(&record, "job_function"), "other");
        assert_eq!(categorical(&record, "categorized_education_level"), "unspecified");
    }

    #[test]
    fn test_interaction_features() {
        let (jf, sk) = caches();
        let schema = FeatureSchema::new(3);
        let record = assemble_features(
            &posting("Senior Data Scientist", "Tech Inc", "New York, NY"),
            &details(Some(5)),
            &jf,
            &sk,
            &schema,
        )
        .unwrap();

        assert_eq!(categorical(&record, "seniority_job_function"), "senior_data_scientist");
        assert_eq!(categorical(&record, "location_job_function"), "metro_nyc_data_scientist");
        assert_eq!(
            categorical(&record, "seniority_function_location"),
            "senior_data_scientist_metro_nyc"
        );
        assert_eq!(categorical(&record, "company_experience"), "Tech Inc_5");
        assert_eq!(categorical(&record, "job_function_experience"), "data_scientist_5");
        assert_eq!(
            categorical(&record, "seniority_function_experience"),
            "senior_data_scientist_5"
        );
        assert_eq!(categorical(&record, "categorized_education_level"), "master");
    }

    #[test]
    fn test_missing_experience_is_nan_and_none() {
        let (jf, sk) = caches();
        let schema = FeatureSchema::new(3);
        let record = assemble_features(
            &posting("Welder", "Acme", "Tulsa, OK"),
            &details(None),
            &jf,
            &sk,
            &schema,
        )
        .unwrap();

        assert!(record
            .get("experience_years_required")
            .and_then(FeatureValue::as_f64)
            .unwrap()
            .is_nan());
        assert_eq!(categorical(&record, "company_experience"), "Acme_none");

        let json = serde_json::to_value(&record).unwrap();
        assert!(json["experience_years_required"].is_null());
    }

    #[test]
    fn test_not_stated_sentinel_is_kept() {
        let (jf, sk) = caches();
        let schema = FeatureSchema::new(3);
        let record = assemble_features(
            &posting("Welder", "Acme", "Tulsa, OK"),
            &details(Some(-1)),
            &jf,
            &sk,
            &schema,
        )
        .unwrap();

        assert_eq!(
            record.get("experience_years_required"),
            Some(&FeatureValue::Numeric(-1.0))
        );
        assert_eq!(categorical(&record, "job_function_experience"), "skilled_trades_-1");
    }

    #[test]
    fn test_embeddings_are_exploded_positionally() {
        let (jf, sk) = caches();
        let schema = FeatureSchema::new(3);
        let record = assemble_features(
            &posting("Senior Data Scientist", "Tech Inc", "Remote"),
            &details(Some(2)),
            &jf,
            &sk,
            &schema,
        )
        .unwrap();

        let num = |name: &str| record.get(name).and_then(FeatureValue::as_f64).unwrap();
        assert!((num("job_func_emb_1") - 0.2).abs() < 1e-6);
        // "Python" and " python" clean to one skill, so the mean is over two.
        assert!((num("mean_skill_emb_1") - 1.0).abs() < 1e-6);
        assert!((num("max_skill_emb_2") - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_job_function_gets_zero_embedding() {
        let (jf, sk) = caches();
        let schema = FeatureSchema::new(3);
        let record = assemble_features(
            &posting("Underwater Basket Weaver", "Acme", "Remote"),
            &JobDetails::degraded(),
            &jf,
            &sk,
            &schema,
        )
        .unwrap();

        for i in 0..3 {
            assert_eq!(
                record.get(&format!("job_func_emb_{i}")),
                Some(&FeatureValue::Numeric(0.0))
            );
        }
    }

    #[test]
    fn test_cache_dimension_disagreeing_with_schema_is_fatal() {
        let (jf, sk) = caches();
        let schema = FeatureSchema::new(4);
        let err = assemble_features(
            &posting("Senior Data Scientist", "Tech Inc", "Remote"),
            &details(Some(1)),
            &jf,
            &sk,
            &schema,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            FeatureError::CacheDimension {
                expected: 4,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_schema_mismatch_is_rejected() {
        let schema = FeatureSchema::new(0);
        let values = BTreeMap::from([(
            "seniority".to_string(),
            FeatureValue::Categorical("senior".into()),
        )]);
        assert!(matches!(
            FeatureRecord::validated(values, &schema),
            Err(FeatureError::SchemaMismatch { .. })
        ));
    }
}
