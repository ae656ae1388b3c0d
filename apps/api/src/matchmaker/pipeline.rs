//! Pipeline Orchestrator: drives one matching run for a job description.
//!
//! Flow: Filtering → Scoring → Persisting → Done.
//!
//! Only a missing job fails the run. Similarity outages degrade to exact-match
//! scoring, vanished candidates are skipped, and write failures are logged.
//! A run that exceeds its timeout during Filtering or Scoring persists nothing.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::matchmaker::gateway::{CandidateFilter, MatchWrite, PersistenceGateway};
use crate::matchmaker::scoring::{score, MatchResult};
use crate::matchmaker::similarity::{SimilarityBatchClient, SimilarityHint};
use crate::models::candidate::CandidateRecord;
use crate::models::job::JobRequirement;

/// Candidates per similarity call.
pub const BATCH_SIZE: usize = 10;
pub const DEFAULT_MIN_MATCH_PERCENTAGE: i64 = 60;
const DEFAULT_CONCURRENCY: usize = 2;

/// Stages of one run, used for log context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Filtering,
    Scoring,
    Persisting,
    Done,
    Failed,
}

/// One candidate's result as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMatch {
    pub cv_id: i64,
    pub cv_name: String,
    pub cv_email: Option<String>,
    pub cv_mobile: Option<String>,
    pub cv_experience: Option<f64>,
    pub cv_current_company: Option<String>,
    pub cv_role: Option<String>,
    #[serde(flatten)]
    pub result: MatchResult,
}

impl CandidateMatch {
    fn new(candidate: &CandidateRecord, result: MatchResult) -> Self {
        Self {
            cv_id: candidate.cv_id,
            cv_name: candidate.cv_name.clone(),
            cv_email: candidate.cv_email.clone(),
            cv_mobile: candidate.cv_mobile.clone(),
            cv_experience: candidate.cv_experience,
            cv_current_company: candidate.cv_current_company.clone(),
            cv_role: candidate.cv_role.clone(),
            result,
        }
    }

    pub fn match_percentage(&self) -> u8 {
        self.result.match_percentage
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub jd_id: i64,
    pub jd_title: String,
    pub jd_company: String,
    /// Candidates that passed pre-filtering, before the threshold.
    pub total_filtered_cvs: usize,
    /// Candidates at or above the threshold.
    pub total_matched_cvs: usize,
    /// Rows actually updated by the write-back.
    pub persisted_cvs: usize,
    pub processing_time_seconds: f64,
    pub matches: Vec<CandidateMatch>,
}

/// Output of the Filtering and Scoring stages, before anything is written.
struct ScoredRun {
    job: JobRequirement,
    total_filtered: usize,
    qualified: Vec<CandidateMatch>,
}

/// The three-stage matchmaker. Construct once at startup and share via `Arc`.
pub struct Matchmaker {
    gateway: Arc<dyn PersistenceGateway>,
    similarity: SimilarityBatchClient,
    concurrency: usize,
}

impl Matchmaker {
    pub fn new(
        gateway: Arc<dyn PersistenceGateway>,
        similarity: SimilarityBatchClient,
        concurrency: usize,
    ) -> Self {
        Self {
            gateway,
            similarity,
            concurrency: if concurrency == 0 {
                DEFAULT_CONCURRENCY
            } else {
                concurrency
            },
        }
    }

    /// Runs the full pipeline for `job_id`.
    ///
    /// Errors: `Validation` for a threshold outside [0, 100], `NotFound` when
    /// the job is absent, `Timeout` when Filtering + Scoring exceed `timeout`.
    pub async fn run_match(
        &self,
        job_id: i64,
        min_match_percentage: i64,
        timeout: Option<Duration>,
    ) -> Result<MatchSummary, AppError> {
        if !(0..=100).contains(&min_match_percentage) {
            return Err(AppError::Validation(format!(
                "min_match_percentage must be between 0 and 100, got {min_match_percentage}"
            )));
        }

        let span = info_span!("match_run", run_id = %Uuid::new_v4(), job_id);
        self.run(job_id, min_match_percentage, timeout)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        job_id: i64,
        threshold: i64,
        timeout: Option<Duration>,
    ) -> Result<MatchSummary, AppError> {
        let started = Instant::now();

        let scored = match timeout {
            Some(limit) => tokio::time::timeout(limit, self.filter_and_score(job_id, threshold))
                .await
                .map_err(|_| {
                    warn!(
                        "Run exceeded {}s before persisting; discarding scored batches",
                        limit.as_secs()
                    );
                    AppError::Timeout(limit)
                })??,
            None => self.filter_and_score(job_id, threshold).await?,
        };

        info!(stage = ?RunStage::Persisting, "Updating CV table with match results");
        let persisted_cvs = self.persist(&scored.job, &scored.qualified).await;

        let processing_time_seconds = started.elapsed().as_secs_f64();
        info!(
            stage = ?RunStage::Done,
            "Matchmaking complete in {:.2}s: {}/{} CVs matched",
            processing_time_seconds,
            scored.qualified.len(),
            scored.total_filtered
        );

        Ok(MatchSummary {
            jd_id: scored.job.id,
            jd_title: scored.job.job_title,
            jd_company: scored.job.company_name,
            total_filtered_cvs: scored.total_filtered,
            total_matched_cvs: scored.qualified.len(),
            persisted_cvs,
            processing_time_seconds,
            matches: scored.qualified,
        })
    }

    async fn filter_and_score(&self, job_id: i64, threshold: i64) -> Result<ScoredRun, AppError> {
        info!(stage = ?RunStage::Filtering, "Pre-filtering CVs for JD {job_id}");
        let Some(job) = self.gateway.get_job(job_id).await? else {
            warn!(stage = ?RunStage::Failed, "JD {job_id} not found");
            return Err(AppError::NotFound(format!("JD with id {job_id} not found")));
        };

        let candidates = self
            .gateway
            .get_candidates(&CandidateFilter::for_job(&job))
            .await?;
        let total_filtered = candidates.len();

        if candidates.is_empty() {
            warn!("No CVs found after pre-filtering for JD {job_id}");
        } else {
            info!("Pre-filtering complete: {total_filtered} CVs");
        }

        info!(
            stage = ?RunStage::Scoring,
            "Scoring {} CVs in batches of {} ({} workers)",
            total_filtered,
            BATCH_SIZE,
            self.concurrency
        );
        let scored = self.score_candidates(&job, &candidates).await;

        let qualified = qualify(scored, threshold);
        info!(
            "Found {} CVs at or above {}% threshold",
            qualified.len(),
            threshold
        );

        Ok(ScoredRun {
            job,
            total_filtered,
            qualified,
        })
    }

    /// Scores all candidates batch by batch on a bounded worker pool.
    /// Results come back in batch order regardless of completion order.
    async fn score_candidates(
        &self,
        job: &JobRequirement,
        candidates: &[CandidateRecord],
    ) -> Vec<CandidateMatch> {
        let total_batches = candidates.len().div_ceil(BATCH_SIZE);

        // Built eagerly: a borrowing `.map` closure on the stream leaves the run future non-Send.
        let batches: Vec<_> = candidates
            .chunks(BATCH_SIZE)
            .enumerate()
            .map(|(index, batch)| Box::pin(self.score_batch(job, batch, index + 1, total_batches)))
            .collect();

        stream::iter(batches)
            .buffered(self.concurrency)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    async fn score_batch(
        &self,
        job: &JobRequirement,
        batch: &[CandidateRecord],
        batch_number: usize,
        total_batches: usize,
    ) -> Vec<CandidateMatch> {
        info!(
            "Processing batch {}/{} ({} CVs)",
            batch_number,
            total_batches,
            batch.len()
        );

        let hints = self.similarity.match_batch(job, batch).await;
        let no_hint = SimilarityHint::default();

        batch
            .iter()
            .map(|candidate| {
                let hint = hints.get(&candidate.cv_id).unwrap_or(&no_hint);
                CandidateMatch::new(candidate, score(job, candidate, hint))
            })
            .collect()
    }

    /// Writes qualifying results back onto their candidates in one batch.
    /// Returns the number of rows updated; failures are logged, never raised.
    async fn persist(&self, job: &JobRequirement, qualified: &[CandidateMatch]) -> usize {
        if qualified.is_empty() {
            return 0;
        }

        let matched_at = Utc::now();
        let matched_job_title = job.match_label();
        let mut writes = Vec::with_capacity(qualified.len());
        let mut vanished = 0;

        for m in qualified {
            match self.gateway.candidate_exists(m.cv_id).await {
                Ok(true) => writes.push(MatchWrite {
                    candidate_id: m.cv_id,
                    match_percentage: m.result.match_percentage,
                    rating: m.result.rating,
                    matched_job_title: matched_job_title.clone(),
                    matched_at,
                }),
                Ok(false) => {
                    debug!("CV {} vanished before persisting; skipping", m.cv_id);
                    vanished += 1;
                }
                Err(e) => {
                    warn!("Could not re-read CV {} before persisting: {e}", m.cv_id);
                    vanished += 1;
                }
            }
        }

        if vanished > 0 {
            info!("Skipped {vanished} CVs that disappeared before persisting");
        }

        if writes.is_empty() {
            return 0;
        }

        match self.gateway.write_match_results(&writes).await {
            Ok(updated) => updated,
            Err(e) => {
                error!("Failed to persist {} match results: {e}", writes.len());
                0
            }
        }
    }
}

/// Keeps results at or above `threshold`, highest first. The sort is stable,
/// so equal scores keep their batch order.
fn qualify(results: Vec<CandidateMatch>, threshold: i64) -> Vec<CandidateMatch> {
    let mut qualified: Vec<CandidateMatch> = results
        .into_iter()
        .filter(|m| i64::from(m.match_percentage()) >= threshold)
        .collect();
    qualified.sort_by(|a, b| b.match_percentage().cmp(&a.match_percentage()));
    qualified
}
