//! Similarity Batch Client: asks the external similarity service which
//! candidate skills are equivalent to differently-named job requirements.
//!
//! A batch that cannot be answered after retries degrades to empty hints
//! (exact-match-only scoring) for that batch alone; it never fails the run.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::llm_client::{LlmClient, LlmError, MODEL};
use crate::matchmaker::prompts::{
    BATCH_PROMPT_HEADER, BATCH_PROMPT_TASK, CANDIDATE_BLOCK_TEMPLATE, SIMILARITY_SYSTEM,
};
use crate::models::candidate::CandidateRecord;
use crate::models::job::JobRequirement;
use crate::retry::RetryPolicy;

/// Separator inside an equivalence pair: `candidateSkill~jobSkill`.
pub const EQUIVALENCE_SEPARATOR: char = '~';

/// Per-candidate output of one similarity call. Every list defaults to empty,
/// so the degraded hint is simply `SimilarityHint::default()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarityHint {
    #[serde(default)]
    pub must_have_matches: Vec<String>,
    #[serde(default)]
    pub must_have_similar: Vec<String>,
    #[serde(default)]
    pub good_to_have_matches: Vec<String>,
    #[serde(default)]
    pub good_to_have_similar: Vec<String>,
    #[serde(default)]
    pub soft_skills_matches: Vec<String>,
    #[serde(default)]
    pub soft_skills_similar: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct BatchResponse {
    #[serde(default)]
    matches: Vec<CandidateHint>,
}

#[derive(Debug, Deserialize)]
struct CandidateHint {
    cv_id: i64,
    #[serde(flatten)]
    hint: SimilarityHint,
}

/// The external similarity service. Implement this to swap backends
/// (or fakes in tests) without touching the batch client or pipeline.
#[async_trait]
pub trait SimilarityService: Send + Sync {
    /// One attempt at scoring a batch. Candidates absent from the answer
    /// are simply missing from the returned map.
    async fn find_similarities(
        &self,
        job: &JobRequirement,
        batch: &[CandidateRecord],
    ) -> Result<HashMap<i64, SimilarityHint>, LlmError>;

    /// Whether calls can be made at all (e.g. an API key is present).
    fn is_configured(&self) -> bool;

    fn model(&self) -> &str;
}

/// Gemini-backed similarity service.
pub struct LlmSimilarityService {
    llm: LlmClient,
}

impl LlmSimilarityService {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl SimilarityService for LlmSimilarityService {
    async fn find_similarities(
        &self,
        job: &JobRequirement,
        batch: &[CandidateRecord],
    ) -> Result<HashMap<i64, SimilarityHint>, LlmError> {
        let prompt = build_batch_prompt(job, batch);
        let response: BatchResponse = self.llm.call_json(&prompt, SIMILARITY_SYSTEM).await?;
        Ok(into_hint_map(response))
    }

    fn is_configured(&self) -> bool {
        true
    }

    fn model(&self) -> &str {
        MODEL
    }
}

/// Stand-in used when no API key is configured. Every batch degrades.
pub struct UnconfiguredSimilarityService;

#[async_trait]
impl SimilarityService for UnconfiguredSimilarityService {
    async fn find_similarities(
        &self,
        _job: &JobRequirement,
        _batch: &[CandidateRecord],
    ) -> Result<HashMap<i64, SimilarityHint>, LlmError> {
        Err(LlmError::NotConfigured)
    }

    fn is_configured(&self) -> bool {
        false
    }

    fn model(&self) -> &str {
        MODEL
    }
}

/// Wraps a `SimilarityService` with the retry and degrade policy.
#[derive(Clone)]
pub struct SimilarityBatchClient {
    service: Arc<dyn SimilarityService>,
    retry: RetryPolicy,
}

impl SimilarityBatchClient {
    pub fn new(service: Arc<dyn SimilarityService>, retry: RetryPolicy) -> Self {
        Self { service, retry }
    }

    /// Returns a hint for every candidate in `batch`. Never fails: after the
    /// retry policy is exhausted all hints for this batch are empty.
    pub async fn match_batch(
        &self,
        job: &JobRequirement,
        batch: &[CandidateRecord],
    ) -> HashMap<i64, SimilarityHint> {
        if batch.is_empty() {
            return HashMap::new();
        }

        if !self.service.is_configured() {
            debug!(
                "Similarity service not configured; exact-match scoring for {} CVs",
                batch.len()
            );
            return empty_hints(batch);
        }

        let service = self.service.as_ref();
        let outcome = self
            .retry
            .run("Similarity batch", move || {
                service.find_similarities(job, batch)
            })
            .await;

        match outcome {
            Ok(mut hints) => {
                for candidate in batch {
                    hints.entry(candidate.cv_id).or_default();
                }
                hints.retain(|id, _| batch.iter().any(|c| c.cv_id == *id));
                hints
            }
            Err(e) => {
                warn!(
                    "Similarity batch failed after {} attempts ({e}); \
                    falling back to exact-match scoring for {} CVs",
                    self.retry.max_attempts.max(1),
                    batch.len()
                );
                empty_hints(batch)
            }
        }
    }
}

fn empty_hints(batch: &[CandidateRecord]) -> HashMap<i64, SimilarityHint> {
    batch
        .iter()
        .map(|c| (c.cv_id, SimilarityHint::default()))
        .collect()
}

fn into_hint_map(response: BatchResponse) -> HashMap<i64, SimilarityHint> {
    response
        .matches
        .into_iter()
        .map(|m| (m.cv_id, m.hint))
        .collect()
}

/// Builds the textual request for one batch: job categories, then one
/// labelled block per candidate.
pub fn build_batch_prompt(job: &JobRequirement, batch: &[CandidateRecord]) -> String {
    let mut prompt = BATCH_PROMPT_HEADER
        .replace("{must_have}", or_none(&job.must_have_skills))
        .replace("{good_to_have}", or_none(&job.good_to_have_skills))
        .replace("{soft_skills}", or_none(&job.soft_skills))
        .replace("{count}", &batch.len().to_string());

    for candidate in batch {
        prompt.push_str(
            &CANDIDATE_BLOCK_TEMPLATE
                .replace("{cv_id}", &candidate.cv_id.to_string())
                .replace("{must_have}", or_none(&candidate.cv_must_to_have))
                .replace("{good_to_have}", or_none(&candidate.cv_good_to_have))
                .replace("{soft_skills}", or_none(&candidate.cv_soft_skills)),
        );
    }

    prompt.push_str(BATCH_PROMPT_TASK);
    prompt
}

fn or_none(value: &Option<String>) -> &str {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => "None",
    }
}
