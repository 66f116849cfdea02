use super::contains_any;

pub const UNKNOWN: &str = "unknown";
pub const INDIVIDUAL_CONTRIBUTOR: &str = "individual_contributor";

/// Seniority rules, most senior first. "cook" is forced to junior ahead of the
/// C-level rule so "coo" cannot fire on it.
const SENIORITY_RULES: &[(&[&str], &str)] = &[
    (&["cook"], "junior"),
    (
        &["chief", "c-level", "c suite", "ceo", "cfo", "cto", "coo"],
        "chief",
    ),
    (&["vp", "vice president", "partner", "executive"], "vp"),
    (&["director"], "director"),
    (
        &[
            "manager",
            "lead",
            "supervisor",
            "head",
            "foreman",
            "superintendent",
        ],
        "manager_lead",
    ),
    (&["senior", "sr.", "sr", "principal"], "senior"),
    (&["intern", "trainee", "graduate"], "intern"),
    (&["entry", "junior", "jr", "associate"], "entry_junior"),
    (&["attorney"], "attorney"),
];

/// Titles containing these are never internships ("internal medicine",
/// "teaching assistant").
const INTERN_EXCLUSIONS: &[&str] = &["internal", "teaching"];

/// Derives a seniority bucket from a job title. First matching rule wins;
/// `individual_contributor` when nothing matches, `unknown` for a missing title.
pub fn extract_seniority(title: Option<&str>) -> String {
    let Some(title) = title else {
        return UNKNOWN.to_string();
    };
    let title_lower = title.to_lowercase();

    SENIORITY_RULES
        .iter()
        .find(|(keywords, level)| {
            contains_any(&title_lower, keywords)
                && (*level != "intern" || !contains_any(&title_lower, INTERN_EXCLUSIONS))
        })
        .map(|(_, level)| (*level).to_string())
        .unwrap_or_else(|| INDIVIDUAL_CONTRIBUTOR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_cook_is_junior_not_chief() {
        assert_eq!(extract_seniority(Some("Line Cook")), "junior");
    }

    #[test]
    fn test_internal_medicine_is_not_intern() {
        let level = extract_seniority(Some("Internal Medicine Resident"));
        assert_ne!(level, "intern");
        assert_eq!(level, "individual_contributor");
    }

    #[test]
    fn test_teaching_assistant_is_not_intern() {
        assert_ne!(extract_seniority(Some("Graduate Teaching Assistant")), "intern");
    }

    #[test]
    fn test_plain_internship() {
        assert_eq!(extract_seniority(Some("Software Engineering Intern")), "intern");
    }

    #[test]
    fn test_cascade_order() {
        assert_eq!(extract_seniority(Some("Chief Technology Officer")), "chief");
        assert_eq!(extract_seniority(Some("VP of Sales")), "vp");
        assert_eq!(extract_seniority(Some("Engineering Manager")), "manager_lead");
        assert_eq!(extract_seniority(Some("Senior Data Scientist")), "senior");
        assert_eq!(extract_seniority(Some("Junior Accountant")), "entry_junior");
        assert_eq!(extract_seniority(Some("Attorney")), "attorney");
        assert_eq!(extract_seniority(Some("Welder")), "individual_contributor");
    }

    #[test]
    fn test_director_titles_hit_the_chief_rule_first() {
        // "director" contains "cto", so the C-level rule claims it.
        assert_eq!(extract_seniority(Some("Director of Nursing")), "chief");
    }

    #[test]
    fn test_senior_manager_resolves_to_manager_lead() {
        assert_eq!(extract_seniority(Some("Senior Product Manager")), "manager_lead");
    }

    #[test]
    fn test_missing_title_is_unknown() {
        assert_eq!(extract_seniority(None), "unknown");
    }
}
