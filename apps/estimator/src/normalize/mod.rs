//! Deterministic text normalizers. None of these fail: unusable input maps to
//! an explicit fallback category (`unknown`, `unspecified`, `other`, ...).

pub mod education;
pub mod job_function;
pub mod location;
pub mod seniority;
pub mod skills;

pub use education::normalize_education;
pub use job_function::extract_job_function;
pub use location::normalize_location;
pub use seniority::extract_seniority;
pub use skills::clean_skill_list;

/// Substring test shared by the ordered keyword cascades.
pub(crate) fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| haystack.contains(keyword))
}
