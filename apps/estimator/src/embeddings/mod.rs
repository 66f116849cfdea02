//! Embedding caches: text key → fixed-length vector tables built offline and
//! loaded read-only by every consumer.

use std::path::Path;

pub mod aggregate;
pub mod builder;
pub mod cache;

pub use aggregate::aggregate_skills;
pub use builder::{build_cache, Encoder, OpenAiEncoder};
pub use cache::{CacheError, EmbeddingCache};

/// Column prefix of the exploded job-function embedding.
pub const JOB_FUNCTION_EMB_PREFIX: &str = "job_func_emb_";
/// Column prefix of the exploded element-wise mean of skill embeddings.
pub const MEAN_SKILL_EMB_PREFIX: &str = "mean_skill_emb_";
/// Column prefix of the exploded element-wise max of skill embeddings.
pub const MAX_SKILL_EMB_PREFIX: &str = "max_skill_emb_";

/// Loads both caches and checks each against the configured dimensionality.
/// Any failure here is fatal at startup.
pub fn load_caches(
    job_function_path: &Path,
    skill_path: &Path,
    embedding_dim: usize,
) -> Result<(EmbeddingCache, EmbeddingCache), CacheError> {
    let job_function = EmbeddingCache::load(job_function_path)?;
    let skills = EmbeddingCache::load(skill_path)?;

    for (path, cache) in [(job_function_path, &job_function), (skill_path, &skills)] {
        if cache.dimension() != embedding_dim {
            return Err(CacheError::CacheDimension {
                path: path.to_path_buf(),
                expected: embedding_dim,
                found: cache.dimension(),
            });
        }
    }
    Ok((job_function, skills))
}
