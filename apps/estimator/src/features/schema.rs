use std::collections::BTreeSet;

use crate::embeddings::{JOB_FUNCTION_EMB_PREFIX, MAX_SKILL_EMB_PREFIX, MEAN_SKILL_EMB_PREFIX};

pub const EDUCATION: &str = "categorized_education_level";
pub const SENIORITY: &str = "seniority";
pub const JOB_FUNCTION: &str = "job_function";
pub const LOCATION: &str = "cleaned_location";
pub const COMPANY: &str = "company_name";
pub const SENIORITY_JOB_FUNCTION: &str = "seniority_job_function";
pub const LOCATION_JOB_FUNCTION: &str = "location_job_function";
pub const SENIORITY_FUNCTION_LOCATION: &str = "seniority_function_location";
pub const COMPANY_EXPERIENCE: &str = "company_experience";
pub const JOB_FUNCTION_EXPERIENCE: &str = "job_function_experience";
pub const SENIORITY_FUNCTION_EXPERIENCE: &str = "seniority_function_experience";

pub const CATEGORICAL_FEATURES: [&str; 11] = [
    EDUCATION,
    SENIORITY,
    JOB_FUNCTION,
    LOCATION,
    COMPANY,
    SENIORITY_JOB_FUNCTION,
    LOCATION_JOB_FUNCTION,
    SENIORITY_FUNCTION_LOCATION,
    COMPANY_EXPERIENCE,
    JOB_FUNCTION_EXPERIENCE,
    SENIORITY_FUNCTION_EXPERIENCE,
];

pub const EXPERIENCE: &str = "experience_years_required";
pub const NUMERIC_FEATURES: [&str; 1] = [EXPERIENCE];

/// The declared feature-name list shared by training and inference.
///
/// Built once from the embedding dimensionality and passed around explicitly.
/// Every assembled record must carry exactly these names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    embedding_dim: usize,
    names: Vec<String>,
}

impl FeatureSchema {
    pub fn new(embedding_dim: usize) -> Self {
        let embedding_names = [
            MEAN_SKILL_EMB_PREFIX,
            MAX_SKILL_EMB_PREFIX,
            JOB_FUNCTION_EMB_PREFIX,
        ]
        .into_iter()
        .flat_map(|prefix| (0..embedding_dim).map(move |i| format!("{prefix}{i}")));

        let names: BTreeSet<String> = CATEGORICAL_FEATURES
            .iter()
            .chain(NUMERIC_FEATURES.iter())
            .map(|name| name.to_string())
            .chain(embedding_names)
            .collect();

        Self {
            embedding_dim,
            names: names.into_iter().collect(),
        }
    }

    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    /// All feature names, sorted.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn categorical(&self) -> &'static [&'static str] {
        &CATEGORICAL_FEATURES
    }

    /// Names the schema declares that `keys` lacks, and names `keys` has that
    /// the schema does not. Both empty means the key set matches.
    pub fn diff<'k>(&self, keys: impl IntoIterator<Item = &'k str>) -> (Vec<String>, Vec<String>) {
        let present: BTreeSet<&str> = keys.into_iter().collect();
        let declared: BTreeSet<&str> = self.names.iter().map(String::as_str).collect();

        let missing = declared.difference(&present).map(|s| s.to_string()).collect();
        let unexpected = present.difference(&declared).map(|s| s.to_string()).collect();
        (missing, unexpected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_size_counts_every_family() {
        let schema = FeatureSchema::new(4);
        assert_eq!(schema.len(), 11 + 1 + 3 * 4);
        assert_eq!(schema.embedding_dim(), 4);
    }

    #[test]
    fn test_names_are_sorted_and_unique() {
        let schema = FeatureSchema::new(12);
        let mut sorted = schema.names().to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted, schema.names());
    }

    #[test]
    fn test_embedding_names_use_positional_suffixes() {
        let schema = FeatureSchema::new(2);
        for name in ["job_func_emb_0", "job_func_emb_1", "mean_skill_emb_1", "max_skill_emb_0"] {
            assert!(schema.names().iter().any(|n| n == name), "missing {name}");
        }
        assert!(!schema.names().iter().any(|n| n == "job_func_emb_2"));
    }

    #[test]
    fn test_diff_reports_both_directions() {
        let schema = FeatureSchema::new(0);
        let mut keys: Vec<&str> = schema.names().iter().map(String::as_str).collect();
        keys.retain(|k| *k != "seniority");
        keys.push("salary");

        let (missing, unexpected) = schema.diff(keys);
        assert_eq!(missing, vec!["seniority"]);
        assert_eq!(unexpected, vec!["salary"]);
    }
}
