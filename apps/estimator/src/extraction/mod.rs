//! LLM-backed extraction: structured job details, batch processing with
//! checkpoints, and location refinement.

pub mod batch;
pub mod checkpoint;
pub mod job_details;
pub mod location;
pub mod prompts;

use std::path::Path;

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub use batch::{join_results, process_in_batches, BatchConfig, BatchError, BatchSummary, JoinedRow};
pub use checkpoint::{CheckpointError, CheckpointStore, FileCheckpointStore, S3CheckpointStore};
pub use job_details::{get_job_details, JobDetails};
pub use location::refine_locations;

/// One raw job posting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    /// Persisted row index carried over from the source dataset. Checkpoints
    /// are keyed by it, so filtering or reordering the input keeps committed
    /// rows attached to their postings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Annual salary in dollars, present only in training data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_salary: Option<f64>,
}

impl JobPosting {
    /// Checkpoint key of this posting: its persisted index, or its position
    /// in the dataset when the input carries none.
    pub fn row_index(&self, position: usize) -> u64 {
        self.index.unwrap_or(position as u64)
    }
}

/// Reads a JSON Lines file, skipping blank lines.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;

    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("{}:{}: invalid record", path.display(), n + 1))
        })
        .collect()
}

/// Writes one JSON document per line.
pub fn write_jsonl<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut out = String::new();
    for row in rows {
        out.push_str(&serde_json::to_string(row)?);
        out.push('\n');
    }
    std::fs::write(path, out).with_context(|| format!("Failed to write '{}'", path.display()))
}
