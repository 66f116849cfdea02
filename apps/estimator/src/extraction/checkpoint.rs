//! Durable, resumable record of extracted rows.
//!
//! The store maps an original dataset row index to its `JobDetails`. It only
//! ever grows: a row committed by an earlier batch is never rewritten. Every
//! `put_batch` persists the whole document before returning.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::S3Config;
use crate::extraction::job_details::JobDetails;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("I/O error on checkpoint '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed checkpoint: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Object store error: {0}")]
    ObjectStore(String),
}

/// The persisted shape shared by every backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckpointDocument {
    pub updated_at: Option<DateTime<Utc>>,
    pub rows: BTreeMap<u64, JobDetails>,
}

impl CheckpointDocument {
    /// Adds rows not yet committed. Returns how many were new.
    fn append(&mut self, rows: Vec<(u64, JobDetails)>) -> usize {
        let mut added = 0;
        for (index, details) in rows {
            if self.rows.contains_key(&index) {
                warn!("Row {index} already checkpointed, keeping the committed value");
                continue;
            }
            self.rows.insert(index, details);
            added += 1;
        }
        self.updated_at = Some(Utc::now());
        added
    }
}

/// Resumable row store consumed by the batch orchestrator.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    fn has(&self, index: u64) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every committed row, ordered by index.
    fn load_all(&self) -> &BTreeMap<u64, JobDetails>;

    /// Appends a completed batch and persists the store.
    async fn put_batch(&mut self, rows: Vec<(u64, JobDetails)>) -> Result<(), CheckpointError>;
}

/// Checkpoint kept as one JSON file on local disk.
pub struct FileCheckpointStore {
    path: PathBuf,
    document: CheckpointDocument,
}

impl FileCheckpointStore {
    /// Opens the checkpoint at `path`. A missing file is an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, CheckpointError> {
        let path = path.into();
        let document = match tokio::fs::read(&path).await {
            Ok(raw) => serde_json::from_slice(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No checkpoint at '{}', starting fresh", path.display());
                CheckpointDocument::default()
            }
            Err(source) => return Err(CheckpointError::Io { path, source }),
        };

        info!(
            "Checkpoint '{}' holds {} row(s)",
            path.display(),
            document.rows.len()
        );
        Ok(Self { path, document })
    }

    /// Writes next to the target and renames over it, so a crash mid-write
    /// leaves the previous checkpoint intact.
    async fn persist(&self) -> Result<(), CheckpointError> {
        let payload = serde_json::to_vec(&self.document)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomically(&path, &payload))
            .await
            .map_err(|e| CheckpointError::Io {
                path: self.path.clone(),
                source: std::io::Error::other(e),
            })?
    }
}

fn write_atomically(path: &Path, payload: &[u8]) -> Result<(), CheckpointError> {
    let io_err = |source| CheckpointError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(payload).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    fn has(&self, index: u64) -> bool {
        self.document.rows.contains_key(&index)
    }

    fn len(&self) -> usize {
        self.document.rows.len()
    }

    fn load_all(&self) -> &BTreeMap<u64, JobDetails> {
        &self.document.rows
    }

    async fn put_batch(&mut self, rows: Vec<(u64, JobDetails)>) -> Result<(), CheckpointError> {
        let added = self.document.append(rows);
        self.persist().await?;
        info!(
            "Checkpoint saved: +{added} row(s), {} total",
            self.document.rows.len()
        );
        Ok(())
    }
}

/// Constructs an S3 client for MinIO (custom endpoint) or AWS.
pub async fn build_s3_client(config: &S3Config) -> S3Client {
    let credentials = Credentials::new(
        &config.access_key_id,
        &config.secret_access_key,
        None,
        None,
        "estimator-static",
    );

    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials);
    if let Some(endpoint) = &config.endpoint {
        loader = loader.endpoint_url(endpoint);
    }

    aws_sdk_s3::Client::new(&loader.load().await)
}

/// Checkpoint kept as one JSON object in S3 (or MinIO).
pub struct S3CheckpointStore {
    client: S3Client,
    bucket: String,
    key: String,
    document: CheckpointDocument,
}

impl S3CheckpointStore {
    /// Opens the checkpoint object. A missing key is an empty store.
    pub async fn open(
        client: S3Client,
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> Result<Self, CheckpointError> {
        let bucket = bucket.into();
        let key = key.into();

        let document = match client.get_object().bucket(&bucket).key(&key).send().await {
            Ok(output) => {
                let body: bytes::Bytes = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| CheckpointError::ObjectStore(e.to_string()))?
                    .into_bytes();
                serde_json::from_slice(&body)?
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    info!("No checkpoint at s3://{bucket}/{key}, starting fresh");
                    CheckpointDocument::default()
                } else {
                    return Err(CheckpointError::ObjectStore(service_err.to_string()));
                }
            }
        };

        info!(
            "Checkpoint s3://{bucket}/{key} holds {} row(s)",
            document.rows.len()
        );
        Ok(Self {
            client,
            bucket,
            key,
            document,
        })
    }
}

#[async_trait]
impl CheckpointStore for S3CheckpointStore {
    fn has(&self, index: u64) -> bool {
        self.document.rows.contains_key(&index)
    }

    fn len(&self) -> usize {
        self.document.rows.len()
    }

    fn load_all(&self) -> &BTreeMap<u64, JobDetails> {
        &self.document.rows
    }

    async fn put_batch(&mut self, rows: Vec<(u64, JobDetails)>) -> Result<(), CheckpointError> {
        let added = self.document.append(rows);
        let payload = serde_json::to_vec(&self.document)?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .body(ByteStream::from(payload))
            .content_type("application/json")
            .send()
            .await
            .map_err(|e| CheckpointError::ObjectStore(format!("S3 upload failed: {e}")))?;

        info!(
            "Checkpoint uploaded to s3://{}/{}: +{added} row(s), {} total",
            self.bucket,
            self.key,
            self.document.rows.len()
        );
        Ok(())
    }
}

/// In-memory store for tests.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct MemoryCheckpointStore {
    pub(crate) document: CheckpointDocument,
    pub(crate) batches: Vec<Vec<u64>>,
}

#[cfg(test)]
#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    fn has(&self, index: u64) -> bool {
        self.document.rows.contains_key(&index)
    }

    fn len(&self) -> usize {
        self.document.rows.len()
    }

    fn load_all(&self) -> &BTreeMap<u64, JobDetails> {
        &self.document.rows
    }

    async fn put_batch(&mut self, rows: Vec<(u64, JobDetails)>) -> Result<(), CheckpointError> {
        self.batches.push(rows.iter().map(|(i, _)| *i).collect());
        self.document.append(rows);
        Ok(())
    }
}
