use super::EmbeddingCache;

/// Reduces a skill list to `(mean, max)` vectors over the skills found in the
/// cache. Unknown skills are dropped, not zero-filled. A missing list, an empty
/// list, or a list with no known skill yields two zero vectors.
///
/// Both statistics are kept: the mean places the overall skill profile, the max
/// keeps the signal of a single strongly weighted rare skill.
pub fn aggregate_skills(skills: Option<&[String]>, cache: &EmbeddingCache) -> (Vec<f32>, Vec<f32>) {
    let dimension = cache.dimension();
    let zeros = || (vec![0.0; dimension], vec![0.0; dimension]);

    let Some(skills) = skills else {
        return zeros();
    };

    let found: Vec<&[f32]> = skills.iter().filter_map(|s| cache.get(s)).collect();
    if found.is_empty() {
        return zeros();
    }

    let mut sum = vec![0.0_f32; dimension];
    let mut max = vec![f32::NEG_INFINITY; dimension];
    for vector in &found {
        for (i, value) in vector.iter().enumerate() {
            sum[i] += value;
            max[i] = max[i].max(*value);
        }
    }

    let count = found.len() as f32;
    let mean = sum.into_iter().map(|s| s / count).collect();
    (mean, max)
}
