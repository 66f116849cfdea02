use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::extraction::batch::BatchError;
use crate::extraction::prompts::{CITY_DESCRIPTION, LOCATION_PROMPT_TEMPLATE, STATE_DESCRIPTION};
use crate::extraction::JobPosting;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{LlmError, StructuredRequest, TextGeneration};
use crate::normalize::location::{normalize_location, OTHER_US, UNKNOWN};

const MAX_LOCATION_ATTEMPTS: u32 = 2;
const NOT_STATED: &str = "unknown";

static LOCATION_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "type": "object",
        "properties": {
            "city": { "type": "string", "description": CITY_DESCRIPTION },
            "state": { "type": "string", "description": STATE_DESCRIPTION },
        },
        "required": ["city", "state"],
        "additionalProperties": false,
    })
});

#[derive(Debug, Deserialize)]
struct JobLocation {
    city: String,
    state: String,
}

impl JobLocation {
    /// `"city, state"` when both are known, whichever one is known otherwise,
    /// and `other_us` when neither is.
    fn combine(self) -> String {
        let city = self.city.trim().to_lowercase();
        let state = self.state.trim().to_lowercase();
        match (city.as_str(), state.as_str()) {
            (NOT_STATED, NOT_STATED) => OTHER_US.to_string(),
            (NOT_STATED, _) => state,
            (_, NOT_STATED) => city,
            _ => format!("{city}, {state}"),
        }
    }
}

/// Asks the service where a job is located. Any failure yields `unknown`.
pub async fn refine_location(
    description: Option<&str>,
    llm: &dyn TextGeneration,
    decoder_model: &str,
) -> String {
    let Some(description) = description else {
        return UNKNOWN.to_string();
    };

    let prompt = LOCATION_PROMPT_TEMPLATE.replace("{description}", description);
    let request = StructuredRequest {
        model: decoder_model,
        system: JSON_ONLY_SYSTEM,
        prompt: &prompt,
        schema_name: "job_location",
        schema: &LOCATION_SCHEMA,
    };

    let mut last_error = None;
    for _ in 0..MAX_LOCATION_ATTEMPTS {
        let parsed = llm.generate_structured(&request).await.and_then(|value| {
            serde_json::from_value::<JobLocation>(value)
                .map_err(|e| LlmError::Schema(format!("job location: {e}")))
        });
        match parsed {
            Ok(location) => return location.combine(),
            Err(e) if e.is_output_error() => last_error = Some(e),
            Err(e) => {
                last_error = Some(e);
                break;
            }
        }
    }

    if let Some(e) = last_error {
        warn!("Location refinement failed: {e}");
    }
    UNKNOWN.to_string()
}

/// Refines the rows whose normalized location is `other_us` or `unknown`.
///
/// Returns row index to refined location, keeping only answers that are
/// themselves informative. At most `max_workers` requests run at once.
pub async fn refine_locations(
    dataset: &[JobPosting],
    llm: Arc<dyn TextGeneration>,
    decoder_model: &str,
    max_workers: usize,
) -> Result<BTreeMap<u64, String>, BatchError> {
    llm.probe()
        .await
        .map_err(|e| BatchError::ServiceUnavailable(e.to_string()))?;

    let candidates: Vec<(u64, Option<String>)> = dataset
        .iter()
        .enumerate()
        .map(|(i, posting)| (posting.row_index(i), posting))
        .filter(|(_, posting)| {
            matches!(
                normalize_location(posting.location.as_deref()).as_str(),
                OTHER_US | UNKNOWN
            )
        })
        .map(|(index, posting)| (index, posting.description.clone()))
        .collect();

    if candidates.is_empty() {
        info!("No 'other_us' or 'unknown' locations to refine");
        return Ok(BTreeMap::new());
    }
    info!("Refining {} location(s)", candidates.len());

    let semaphore = Arc::new(Semaphore::new(max_workers.max(1)));
    let mut tasks = JoinSet::new();
    for (index, description) in candidates {
        let llm = Arc::clone(&llm);
        let semaphore = Arc::clone(&semaphore);
        let model = decoder_model.to_string();
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            let refined = refine_location(description.as_deref(), llm.as_ref(), &model).await;
            (index, refined)
        });
    }

    let mut refined = BTreeMap::new();
    while let Some(joined) = tasks.join_next().await {
        let (index, location) = joined?;
        if location != OTHER_US && location != UNKNOWN {
            refined.insert(index, location);
        }
    }

    info!("Updating {} location(s) with extracted data", refined.len());
    Ok(refined)
}

/// Replaces each refined row's location in place, matching rows by the same
/// index `refine_locations` keyed them with.
pub fn apply_refined_locations(dataset: &mut [JobPosting], refined: &BTreeMap<u64, String>) {
    for (position, posting) in dataset.iter_mut().enumerate() {
        if let Some(location) = refined.get(&posting.row_index(position)) {
            posting.location = Some(location.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::job_details::tests::{PacedLlm, ScriptedLlm};

    fn answer(city: &str, state: &str) -> Result<Value, LlmError> {
        Ok(json!({ "city": city, "state": state }))
    }

    #[tokio::test]
    async fn test_city_and_state_are_combined() {
        let llm = ScriptedLlm::new(vec![answer("Boise", "ID")]);
        assert_eq!(refine_location(Some("Join us in Boise"), &llm, "m").await, "boise, id");
    }

    #[tokio::test]
    async fn test_partial_answers_keep_the_known_part() {
        let llm = ScriptedLlm::new(vec![answer("unknown", "TX"), answer("Reno", "Unknown")]);
        assert_eq!(refine_location(Some("a"), &llm, "m").await, "tx");
        assert_eq!(refine_location(Some("b"), &llm, "m").await, "reno");
    }

    #[tokio::test]
    async fn test_nothing_known_is_other_us() {
        let llm = ScriptedLlm::new(vec![answer("unknown", "unknown")]);
        assert_eq!(refine_location(Some("no hints"), &llm, "m").await, "other_us");
    }

    #[tokio::test]
    async fn test_failures_are_unknown_after_two_attempts() {
        let llm = ScriptedLlm::new(vec![Ok(json!({"town": "x"})), Err(LlmError::EmptyContent)]);
        assert_eq!(refine_location(Some("text"), &llm, "m").await, "unknown");
        assert_eq!(llm.calls(), 2);
    }

    #[tokio::test]
    async fn test_missing_description_skips_the_service() {
        let llm = ScriptedLlm::new(vec![]);
        assert_eq!(refine_location(None, &llm, "m").await, "unknown");
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_only_uninformative_locations_are_refined() {
        let mut dataset = vec![
            JobPosting {
                location: Some("New York, NY".into()),
                description: Some("Office in Manhattan".into()),
                ..JobPosting::default()
            },
            JobPosting {
                location: Some("United States".into()),
                description: Some("Our team sits in Boise".into()),
                ..JobPosting::default()
            },
        ];
        let llm = Arc::new(ScriptedLlm::new(vec![answer("Boise", "ID")]));

        let refined = refine_locations(&dataset, llm.clone(), "m", 4).await.unwrap();

        assert_eq!(llm.calls(), 1);
        assert_eq!(refined, BTreeMap::from([(1, "boise, id".to_string())]));

        apply_refined_locations(&mut dataset, &refined);
        assert_eq!(normalize_location(dataset[1].location.as_deref()), "state_ID");
        assert_eq!(dataset[0].location.as_deref(), Some("New York, NY"));
    }

    #[tokio::test]
    async fn test_uninformative_answers_are_dropped() {
        let dataset = vec![JobPosting {
            location: None,
            description: Some("Fully distributed".into()),
            ..JobPosting::default()
        }];
        let llm = Arc::new(ScriptedLlm::new(vec![answer("unknown", "unknown")]));

        let refined = refine_locations(&dataset, llm, "m", 4).await.unwrap();
        assert!(refined.is_empty());
    }

    #[tokio::test]
    async fn test_refinement_respects_max_workers() {
        let dataset: Vec<JobPosting> = (0..8)
            .map(|n| JobPosting {
                location: Some("United States".into()),
                description: Some(format!("Team {n} works from Boise")),
                ..JobPosting::default()
            })
            .collect();
        let llm = Arc::new(PacedLlm::new(json!({"city": "Boise", "state": "ID"})));

        let refined = refine_locations(&dataset, llm.clone(), "m", 2).await.unwrap();

        assert_eq!(refined.len(), 8);
        assert!(llm.peak() > 1, "refinements ran sequentially");
        assert!(llm.peak() <= 2, "peak of {} exceeds the worker bound", llm.peak());
    }

    #[test]
    fn test_refined_locations_follow_persisted_indices() {
        let mut dataset = vec![
            JobPosting {
                index: Some(42),
                location: Some("United States".into()),
                ..JobPosting::default()
            },
            JobPosting {
                index: Some(7),
                location: Some("United States".into()),
                ..JobPosting::default()
            },
        ];
        let refined = BTreeMap::from([(7, "reno, nv".to_string())]);

        apply_refined_locations(&mut dataset, &refined);

        assert_eq!(dataset[0].location.as_deref(), Some("United States"));
        assert_eq!(dataset[1].location.as_deref(), Some("reno, nv"));
    }
}
