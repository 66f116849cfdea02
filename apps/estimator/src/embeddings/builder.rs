//! Offline cache building: embeds the distinct keys observed in a training
//! corpus and produces an `EmbeddingCache` ready to be saved.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tracing::info;

use super::{CacheError, EmbeddingCache};
use crate::llm_client::{LlmClient, LlmError};

/// Texts sent to the encoder per request.
pub const DEFAULT_ENCODE_CHUNK: usize = 256;

/// Sentence encoder used to build caches.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Returns one vector per input, in input order.
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError>;
}

/// Encoder backed by the generation server's `/embeddings` endpoint.
pub struct OpenAiEncoder {
    llm: LlmClient,
    model: String,
}

impl OpenAiEncoder {
    pub fn new(llm: LlmClient, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Encoder for OpenAiEncoder {
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        self.llm.embed(&self.model, texts).await
    }
}

/// Embeds every distinct non-blank key and returns the resulting cache.
pub async fn build_cache<I>(
    keys: I,
    encoder: &dyn Encoder,
    chunk_size: usize,
) -> Result<EmbeddingCache, CacheError>
where
    I: IntoIterator<Item = String>,
{
    let unique: Vec<String> = keys
        .into_iter()
        .filter(|k| !k.trim().is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    info!("Found {} unique keys to embed", unique.len());

    let mut entries = HashMap::with_capacity(unique.len());
    for chunk in unique.chunks(chunk_size.max(1)) {
        let vectors = encoder.encode(chunk).await?;
        if vectors.len() != chunk.len() {
            return Err(CacheError::Encoder(LlmError::Schema(format!(
                "encoder returned {} vectors for {} inputs",
                vectors.len(),
                chunk.len()
            ))));
        }
        entries.extend(chunk.iter().cloned().zip(vectors));
    }

    EmbeddingCache::from_entries(entries)
}
