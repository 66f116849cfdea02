/// Trims and lowercases every skill so lookups hit the cache's key space.
/// `None` models a missing skill list and yields an empty one.
pub fn clean_skill_list(skills: Option<&[String]>) -> Vec<String> {
    match skills {
        Some(skills) => skills.iter().map(|s| s.trim().to_lowercase()).collect(),
        None => {
            tracing::debug!("Missing skill list, using an empty one");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skills_are_trimmed_and_lowercased() {
        let skills = vec!["  Python ".to_string(), "SQL".to_string()];
        assert_eq!(clean_skill_list(Some(skills.as_slice())), vec!["python", "sql"]);
    }

    #[test]
    fn test_missing_list_is_empty() {
        assert!(clean_skill_list(None).is_empty());
    }
}
