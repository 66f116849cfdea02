use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::llm_client::DEFAULT_BASE_URL;

/// Object-store settings for the checkpoint, present only when `S3_BUCKET`
/// is set.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub endpoint: Option<String>,
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl S3Config {
    /// `None` unless `S3_BUCKET` is set; credentials are then required.
    pub fn from_env() -> Result<Option<Self>> {
        let Ok(bucket) = std::env::var("S3_BUCKET") else {
            return Ok(None);
        };
        Ok(Some(S3Config {
            bucket,
            endpoint: std::env::var("S3_ENDPOINT").ok(),
            access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
        }))
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm_base_url: String,
    pub llm_api_key: String,
    pub decoder_model: String,
    pub embedding_dim: usize,
    pub job_function_cache_path: PathBuf,
    pub skill_cache_path: PathBuf,
    pub lower_model_url: String,
    pub upper_model_url: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            llm_base_url: env_or("LLM_BASE_URL", DEFAULT_BASE_URL),
            llm_api_key: env_or("LLM_API_KEY", "ollama"),
            decoder_model: env_or("DECODER_MODEL", "llama3.1"),
            embedding_dim: parse_env("EMBEDDING_DIM", 384)?,
            job_function_cache_path: env_or(
                "JOB_FUNCTION_CACHE_PATH",
                "data/embedding_cache/job_function_embedding_cache.json",
            )
            .into(),
            skill_cache_path: env_or(
                "SKILL_CACHE_PATH",
                "data/embedding_cache/skill_embedding_cache.json",
            )
            .into(),
            lower_model_url: require_env("LOWER_MODEL_URL")?,
            upper_model_url: require_env("UPPER_MODEL_URL")?,
            port: parse_env("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
