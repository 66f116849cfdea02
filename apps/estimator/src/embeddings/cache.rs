use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::llm_client::LlmError;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Embedding cache file not found at '{0}'. Build the cache first.")]
    NotFound(PathBuf),

    #[error("I/O error on embedding cache '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed embedding cache '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Embedding cache is empty")]
    Empty,

    #[error("Embedding cache '{path}' holds {found}-dimensional vectors, expected {expected}")]
    CacheDimension {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("Embedding for '{key}' has {found} dimensions, expected {expected}")]
    DimensionMismatch {
        key: String,
        expected: usize,
        found: usize,
    },

    #[error("Encoder error: {0}")]
    Encoder(#[from] LlmError),
}

/// Read-only map from a normalized key (job-function label or skill token) to
/// its embedding. Every vector has `dimension()` entries.
#[derive(Debug, Clone)]
pub struct EmbeddingCache {
    entries: HashMap<String, Vec<f32>>,
    dimension: usize,
}

impl EmbeddingCache {
    /// Builds a cache, taking the dimensionality from an arbitrary entry and
    /// rejecting any entry that disagrees with it.
    pub fn from_entries(entries: HashMap<String, Vec<f32>>) -> Result<Self, CacheError> {
        let dimension = entries
            .values()
            .next()
            .map(Vec::len)
            .ok_or(CacheError::Empty)?;

        if let Some((key, vector)) = entries.iter().find(|(_, v)| v.len() != dimension) {
            return Err(CacheError::DimensionMismatch {
                key: key.clone(),
                expected: dimension,
                found: vector.len(),
            });
        }

        Ok(Self { entries, dimension })
    }

    /// Loads a JSON `{ key: [f32, ...] }` cache. A missing file is fatal.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CacheError::NotFound(path.to_path_buf()));
        }

        let raw = fs::read(path).map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let entries: HashMap<String, Vec<f32>> =
            serde_json::from_slice(&raw).map_err(|source| CacheError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let cache = Self::from_entries(entries)?;
        info!(
            "Loaded embedding cache '{}' ({} keys, dim {})",
            path.display(),
            cache.len(),
            cache.dimension
        );
        Ok(cache)
    }

    /// Writes the cache as JSON with keys in sorted order.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CacheError> {
        let path = path.as_ref();
        let sorted: BTreeMap<&String, &Vec<f32>> = self.entries.iter().collect();
        let payload = serde_json::to_vec(&sorted).map_err(|source| CacheError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, payload).map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Embedding cache saved to '{}'", path.display());
        Ok(())
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&[f32]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Cached vector for `key`, or a zero vector when the key is unknown.
    /// Unknown tokens contribute no signal.
    pub fn lookup_one(&self, key: &str) -> Vec<f32> {
        self.get(key)
            .map(<[f32]>::to_vec)
            .unwrap_or_else(|| vec![0.0; self.dimension])
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn cache_of(entries: &[(&str, &[f32])]) -> EmbeddingCache {
        EmbeddingCache::from_entries(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_vec()))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_hit_and_miss() {
        let cache = cache_of(&[("data_scientist", &[0.5, -1.0, 2.0])]);
        assert_eq!(cache.dimension(), 3);
        assert_eq!(cache.lookup_one("data_scientist"), vec![0.5, -1.0, 2.0]);
        assert_eq!(cache.lookup_one("astronaut"), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_mixed_dimensions_are_rejected() {
        let entries = HashMap::from([
            ("a".to_string(), vec![1.0, 2.0]),
            ("b".to_string(), vec![1.0]),
        ]);
        assert!(matches!(
            EmbeddingCache::from_entries(entries),
            Err(CacheError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_cache_is_rejected() {
        assert!(matches!(
            EmbeddingCache::from_entries(HashMap::new()),
            Err(CacheError::Empty)
        ));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = EmbeddingCache::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, CacheError::NotFound(_)));
    }

    #[test]
    fn test_save_then_load_preserves_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skills.json");
        let cache = cache_of(&[("python", &[1.0, 0.0]), ("sql", &[0.0, 1.0])]);

        cache.save(&path).unwrap();
        let loaded = EmbeddingCache::load(&path).unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get("sql"), Some(&[0.0_f32, 1.0][..]));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, b"[1, 2, 3]").unwrap();
        assert!(matches!(
            EmbeddingCache::load(&path),
            Err(CacheError::Parse { .. })
        ));
    }
}
