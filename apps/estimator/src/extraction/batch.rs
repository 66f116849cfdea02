use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::extraction::checkpoint::{CheckpointError, CheckpointStore};
use crate::extraction::job_details::{get_job_details, JobDetails};
use crate::extraction::JobPosting;
use crate::llm_client::TextGeneration;

pub const DEFAULT_BATCH_SIZE: usize = 200;
pub const DEFAULT_MAX_WORKERS: usize = 16;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Generation service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("Extraction worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub batch_size: usize,
    pub max_workers: usize,
    pub decoder_model: String,
}

impl BatchConfig {
    pub fn new(decoder_model: impl Into<String>) -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_workers: DEFAULT_MAX_WORKERS,
            decoder_model: decoder_model.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Rows already in the store when the run started.
    pub resumed: usize,
    /// Rows extracted by this run.
    pub processed: usize,
    pub batches: usize,
}

/// Runs the extractor over every dataset row the store has not seen yet.
///
/// The service is probed first; if it is down nothing is read or written.
/// Pending rows are cut into batches of `batch_size`, and inside a batch at
/// most `max_workers` extractions are in flight. Each completed batch is
/// ordered by row index and committed to the store before the next starts,
/// so an interrupted run resumes from the last committed batch.
pub async fn process_in_batches(
    dataset: &[JobPosting],
    store: &mut dyn CheckpointStore,
    llm: Arc<dyn TextGeneration>,
    config: &BatchConfig,
) -> Result<BatchSummary, BatchError> {
    llm.probe()
        .await
        .map_err(|e| BatchError::ServiceUnavailable(e.to_string()))?;

    let resumed = store.len();
    let pending: Vec<(u64, Option<String>)> = dataset
        .iter()
        .enumerate()
        .map(|(i, posting)| (posting.row_index(i), posting))
        .filter(|(index, _)| !store.has(*index))
        .map(|(index, posting)| (index, posting.description.clone()))
        .collect();

    info!(
        "Total rows: {}, already processed: {resumed}, batch size: {}",
        dataset.len(),
        config.batch_size
    );

    if pending.is_empty() {
        info!("All rows have already been processed. Nothing to do.");
        return Ok(BatchSummary {
            resumed,
            ..BatchSummary::default()
        });
    }

    let batch_size = config.batch_size.max(1);
    let total_batches = pending.len().div_ceil(batch_size);
    let semaphore = Arc::new(Semaphore::new(config.max_workers.max(1)));
    let mut summary = BatchSummary {
        resumed,
        ..BatchSummary::default()
    };

    for (batch_number, batch) in pending.chunks(batch_size).enumerate() {
        let mut tasks = JoinSet::new();

        for (index, description) in batch.iter().cloned() {
            let llm = Arc::clone(&llm);
            let semaphore = Arc::clone(&semaphore);
            let model = config.decoder_model.clone();

            tasks.spawn(async move {
                // The semaphore is never closed, so acquire cannot fail.
                let _permit = semaphore.acquire_owned().await.ok();
                let details = get_job_details(description.as_deref(), llm.as_ref(), &model).await;
                (index, details)
            });
        }

        let mut results = Vec::with_capacity(batch.len());
        while let Some(joined) = tasks.join_next().await {
            results.push(joined?);
        }
        results.sort_by_key(|(index, _)| *index);

        summary.processed += results.len();
        summary.batches += 1;
        store.put_batch(results).await?;

        info!(
            "Batch {}/{total_batches} committed ({} rows in store)",
            batch_number + 1,
            store.len()
        );
    }

    info!("Processing complete: {} row(s) extracted", summary.processed);
    Ok(summary)
}

/// A dataset row paired with its extracted details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinedRow {
    pub index: u64,
    #[serde(flatten)]
    pub posting: JobPosting,
    #[serde(flatten)]
    pub details: JobDetails,
}

/// Joins the store back onto the dataset by row index, in dataset order.
/// Rows the store does not hold get the degraded record. The resolved index
/// moves to `JoinedRow::index`, leaving the posting's own field empty.
pub fn join_results(dataset: &[JobPosting], store: &dyn CheckpointStore) -> Vec<JoinedRow> {
    let rows = store.load_all();
    let mut missing = 0usize;

    let joined = dataset
        .iter()
        .enumerate()
        .map(|(i, posting)| {
            let index = posting.row_index(i);
            let details = rows.get(&index).cloned().unwrap_or_else(|| {
                missing += 1;
                JobDetails::degraded()
            });
            JoinedRow {
                index,
                posting: JobPosting {
                    index: None,
                    ..posting.clone()
                },
                details,
            }
        })
        .collect();

    if missing > 0 {
        warn!("{missing} dataset row(s) have no checkpointed details");
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::checkpoint::MemoryCheckpointStore;
    use crate::extraction::job_details::tests::{valid_answer, PacedLlm, ScriptedLlm};

    fn posting(n: usize) -> JobPosting {
        JobPosting {
            index: None,
            title: Some(format!("Data Analyst {n}")),
            company_name: Some("Acme".into()),
            location: Some("Austin, TX".into()),
            description: Some(format!(
                "Posting {n}: analyse sales data with SQL and Python every day."
            )),
            normalized_salary: None,
        }
    }

    fn dataset(len: usize) -> Vec<JobPosting> {
        (0..len).map(posting).collect()
    }

    fn committed(indices: &[u64]) -> MemoryCheckpointStore {
        let mut store = MemoryCheckpointStore::default();
        for index in indices {
            store
                .document
                .rows
                .insert(*index, JobDetails::degraded());
        }
        store
    }

    #[tokio::test]
    async fn test_resume_processes_only_pending_rows() {
        let data = dataset(5);
        let mut store = committed(&[0, 1, 2]);
        let llm = Arc::new(ScriptedLlm::new(vec![Ok(valid_answer()), Ok(valid_answer())]));
        let config = BatchConfig::new("llama3");

        let summary = process_in_batches(&data, &mut store, llm.clone(), &config)
            .await
            .unwrap();

        assert_eq!(summary.resumed, 3);
        assert_eq!(summary.processed, 2);
        assert_eq!(llm.calls(), 2);
        assert_eq!(store.batches, vec![vec![3, 4]]);

        let joined = join_results(&data, &store);
        assert_eq!(joined.len(), 5);
        assert_eq!(
            joined.iter().map(|r| r.index).collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4]
        );
        assert_eq!(joined[3].details.experience_years_required, Some(3));
        assert_eq!(joined[0].details, JobDetails::degraded());
    }

    #[tokio::test]
    async fn test_rows_are_split_into_ordered_batches() {
        let data = dataset(5);
        let mut store = MemoryCheckpointStore::default();
        let answers = (0..5).map(|_| Ok(valid_answer())).collect();
        let llm = Arc::new(ScriptedLlm::new(answers));
        let config = BatchConfig {
            batch_size: 2,
            max_workers: 2,
            decoder_model: "llama3".into(),
        };

        let summary = process_in_batches(&data, &mut store, llm, &config)
            .await
            .unwrap();

        assert_eq!(summary.batches, 3);
        assert_eq!(store.batches, vec![vec![0, 1], vec![2, 3], vec![4]]);
        assert_eq!(store.len(), 5);
    }

    #[tokio::test]
    async fn test_in_flight_extractions_never_exceed_max_workers() {
        let data = dataset(12);
        let mut store = MemoryCheckpointStore::default();
        let llm = Arc::new(PacedLlm::new(valid_answer()));
        let config = BatchConfig {
            batch_size: 12,
            max_workers: 3,
            decoder_model: "llama3".into(),
        };

        process_in_batches(&data, &mut store, llm.clone(), &config)
            .await
            .unwrap();

        assert_eq!(store.len(), 12);
        assert!(llm.peak() > 1, "extractions ran sequentially");
        assert!(llm.peak() <= 3, "peak of {} exceeds the worker bound", llm.peak());
    }

    #[tokio::test]
    async fn test_persisted_indices_survive_reordered_input() {
        let mut data = dataset(3);
        for (posting, index) in data.iter_mut().zip([10, 20, 30]) {
            posting.index = Some(index);
        }
        let mut store = committed(&[20]);
        let llm = Arc::new(ScriptedLlm::new(vec![Ok(valid_answer()), Ok(valid_answer())]));

        process_in_batches(&data, &mut store, llm.clone(), &BatchConfig::new("m"))
            .await
            .unwrap();
        assert_eq!(store.batches, vec![vec![10, 30]]);

        data.reverse();
        let joined = join_results(&data, &store);
        assert_eq!(
            joined.iter().map(|r| r.index).collect::<Vec<_>>(),
            vec![30, 20, 10]
        );
        assert_eq!(joined[1].details, JobDetails::degraded());
        assert_eq!(joined[1].posting.title.as_deref(), Some("Data Analyst 1"));
        assert_eq!(joined[0].details.experience_years_required, Some(3));
        assert!(joined.iter().all(|r| r.posting.index.is_none()));
    }

    #[tokio::test]
    async fn test_fully_processed_dataset_is_a_no_op() {
        let data = dataset(3);
        let mut store = committed(&[0, 1, 2]);
        let llm = Arc::new(ScriptedLlm::new(vec![]));

        let summary = process_in_batches(&data, &mut store, llm.clone(), &BatchConfig::new("m"))
            .await
            .unwrap();

        assert_eq!(summary.processed, 0);
        assert_eq!(llm.calls(), 0);
        assert!(store.batches.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_service_leaves_store_untouched() {
        let data = dataset(3);
        let mut store = MemoryCheckpointStore::default();
        let mut scripted = ScriptedLlm::new(vec![Ok(valid_answer())]);
        scripted.reachable = false;
        let llm = Arc::new(scripted);

        let err = process_in_batches(&data, &mut store, llm.clone(), &BatchConfig::new("m"))
            .await
            .unwrap_err();

        assert!(matches!(err, BatchError::ServiceUnavailable(_)));
        assert_eq!(llm.calls(), 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_short_descriptions_are_committed_as_degraded() {
        let mut data = dataset(2);
        data[1].description = Some("tiny".into());
        let mut store = MemoryCheckpointStore::default();
        let llm = Arc::new(ScriptedLlm::new(vec![Ok(valid_answer())]));

        process_in_batches(&data, &mut store, llm.clone(), &BatchConfig::new("m"))
            .await
            .unwrap();

        assert_eq!(llm.calls(), 1);
        assert_eq!(store.load_all()[&1], JobDetails::degraded());
    }

    #[test]
    fn test_joined_row_serializes_flat() {
        let row = JoinedRow {
            index: 4,
            posting: posting(4),
            details: JobDetails::degraded(),
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["index"], 4);
        assert_eq!(value["company_name"], "Acme");
        assert!(value["technical_skills"].as_array().unwrap().is_empty());

        let back: JoinedRow = serde_json::from_value(value).unwrap();
        assert_eq!(back, row);
    }
}
