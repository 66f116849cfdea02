use std::sync::LazyLock;

use regex::Regex;

pub const UNSPECIFIED: &str = "unspecified";

/// Categories in precedence order. Doctorate and master come before bachelor so
/// that e.g. "mba" is not read as "ba".
const EDUCATION_KEYWORDS: &[(&str, &[&str])] = &[
    ("doctorate", &["phd", "doctorate", "md", "dds", "jd", "dvm", "do"]),
    ("master", &["master", "mba", "msc", "meng", "ma", "ms"]),
    ("bachelor", &["bachelor", "btech", "bs", "ba", "bfa", "bsc"]),
    (
        "associate",
        &["associate", "vocational", "trade school", "paralegal certificate"],
    ),
    ("high school", &["high school", "ged"]),
];

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s]").expect("non-alphanumeric regex"));

static CATEGORY_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    EDUCATION_KEYWORDS
        .iter()
        .map(|(category, keywords)| {
            let pattern = Regex::new(&keywords.join("|")).expect("education keyword regex");
            (*category, pattern)
        })
        .collect()
});

/// Buckets a free-text education level into
/// `doctorate | master | bachelor | associate | high school | unspecified`.
pub fn normalize_education(education_level: Option<&str>) -> String {
    let Some(education_level) = education_level else {
        return UNSPECIFIED.to_string();
    };

    let lowered = education_level.to_lowercase();
    let cleaned = NON_ALPHANUMERIC.replace_all(&lowered, "");

    CATEGORY_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(&cleaned))
        .map(|(category, _)| (*category).to_string())
        .unwrap_or_else(|| UNSPECIFIED.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_vocabulary_maps_to_categories() {
        assert_eq!(normalize_education(Some("PhD")), "doctorate");
        assert_eq!(normalize_education(Some("Master's")), "master");
        assert_eq!(normalize_education(Some("Bachelor's")), "bachelor");
        assert_eq!(normalize_education(Some("Associate's")), "associate");
        assert_eq!(normalize_education(Some("High School")), "high school");
    }

    #[test]
    fn test_mba_is_master_not_bachelor() {
        assert_eq!(normalize_education(Some("MBA preferred")), "master");
    }

    #[test]
    fn test_punctuation_is_stripped_before_matching() {
        assert_eq!(normalize_education(Some("B.S. in Computer Science")), "bachelor");
    }

    #[test]
    fn test_missing_or_unmatched_is_unspecified() {
        assert_eq!(normalize_education(None), "unspecified");
        assert_eq!(normalize_education(Some("Unspecified")), "unspecified");
        assert_eq!(normalize_education(Some("")), "unspecified");
    }
}
