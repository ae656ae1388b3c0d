//! In-memory fakes and fixtures shared by the matchmaker tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::llm_client::LlmError;
use crate::matchmaker::gateway::{CandidateFilter, MatchWrite, PersistenceGateway};
use crate::matchmaker::similarity::{SimilarityHint, SimilarityService};
use crate::models::candidate::{CandidateRecord, CandidateStage, CandidateStatus};
use crate::models::job::JobRequirement;

pub fn make_job(must_have: &str, good_to_have: Option<&str>, soft: Option<&str>) -> JobRequirement {
    JobRequirement {
        id: 1,
        job_title: "Backend Engineer".to_string(),
        company_name: "TechCorp".to_string(),
        must_have_skills: Some(must_have.to_string()).filter(|s| !s.is_empty()),
        good_to_have_skills: good_to_have.map(str::to_string),
        soft_skills: soft.map(str::to_string),
        ..Default::default()
    }
}

pub fn make_candidate(
    cv_id: i64,
    must_have: Option<&str>,
    good_to_have: Option<&str>,
) -> CandidateRecord {
    CandidateRecord {
        cv_id,
        cv_name: format!("Candidate {cv_id}"),
        cv_email: Some(format!("cv{cv_id}@example.com")),
        cv_mobile: Some("9876543210".to_string()),
        cv_current_company: None,
        cv_role: Some("Engineer".to_string()),
        cv_experience: None,
        cv_ectc: None,
        cv_active: true,
        cv_stage: CandidateStage::Shortlisted,
        cv_status: CandidateStatus::Reviewed,
        cv_must_to_have: must_have.map(str::to_string),
        cv_good_to_have: good_to_have.map(str::to_string),
        cv_soft_skills: None,
        cv_domain_expertise: None,
        cv_accolades: None,
    }
}

/// Gateway backed by vectors. Candidates listed in `vanish_before_write`
/// disappear as soon as the filtered list has been handed out. Those in
/// `leave_pipeline_before_write` stay stored but move to a lifecycle value
/// outside the closed enums (e.g. "Hired"), so typed reads no longer see them.
#[derive(Default)]
pub struct InMemoryGateway {
    pub jobs: Vec<JobRequirement>,
    pub candidates: Mutex<Vec<CandidateRecord>>,
    pub vanish_before_write: HashSet<i64>,
    pub leave_pipeline_before_write: HashSet<i64>,
    moved_on: Mutex<HashSet<i64>>,
    pub writes: Mutex<Vec<MatchWrite>>,
    pub fail_writes: bool,
}

impl InMemoryGateway {
    pub fn new(jobs: Vec<JobRequirement>, candidates: Vec<CandidateRecord>) -> Self {
        Self {
            jobs,
            candidates: Mutex::new(candidates),
            ..Default::default()
        }
    }

    pub fn written(&self) -> Vec<MatchWrite> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryGateway {
    async fn get_job(&self, job_id: i64) -> Result<Option<JobRequirement>, AppError> {
        Ok(self.jobs.iter().find(|j| j.id == job_id).cloned())
    }

    async fn get_candidates(
        &self,
        filter: &CandidateFilter,
    ) -> Result<Vec<CandidateRecord>, AppError> {
        let mut candidates = self.candidates.lock().unwrap();
        let selected = candidates
            .iter()
            .filter(|c| filter.admits(c))
            .cloned()
            .collect();
        let mut moved_on = self.moved_on.lock().unwrap();
        candidates.retain(|c| {
            if self.leave_pipeline_before_write.contains(&c.cv_id) {
                moved_on.insert(c.cv_id);
                return false;
            }
            !self.vanish_before_write.contains(&c.cv_id)
        });
        Ok(selected)
    }

    async fn get_candidate_by_id(
        &self,
        candidate_id: i64,
    ) -> Result<Option<CandidateRecord>, AppError> {
        Ok(self
            .candidates
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.cv_id == candidate_id)
            .cloned())
    }

    async fn candidate_exists(&self, candidate_id: i64) -> Result<bool, AppError> {
        let stored = self
            .candidates
            .lock()
            .unwrap()
            .iter()
            .any(|c| c.cv_id == candidate_id);
        Ok(stored || self.moved_on.lock().unwrap().contains(&candidate_id))
    }

    async fn write_match_results(&self, writes: &[MatchWrite]) -> Result<usize, AppError> {
        if self.fail_writes {
            return Err(AppError::Internal(anyhow::anyhow!("disk full")));
        }
        self.writes.lock().unwrap().extend_from_slice(writes);
        Ok(writes.len())
    }
}

/// Similarity service that fails a fixed number of times, then answers.
pub struct ScriptedSimilarity {
    failures_before_success: u32,
    answer: HashMap<i64, SimilarityHint>,
    /// Batches whose first candidate id is listed here always fail.
    poisoned: HashSet<i64>,
    /// Return `answer` verbatim instead of only the batch's ids.
    unfiltered: bool,
    delay: Duration,
    calls: AtomicU32,
}

impl ScriptedSimilarity {
    pub fn succeeding(answer: HashMap<i64, SimilarityHint>) -> Self {
        Self::failing_then(0, answer)
    }

    pub fn failing_then(failures: u32, answer: HashMap<i64, SimilarityHint>) -> Self {
        Self {
            failures_before_success: failures,
            answer,
            poisoned: HashSet::new(),
            unfiltered: false,
            delay: Duration::ZERO,
            calls: AtomicU32::new(0),
        }
    }

    pub fn always_failing() -> Self {
        Self::failing_then(u32::MAX, HashMap::new())
    }

    pub fn poison_batch_starting_at(mut self, cv_id: i64) -> Self {
        self.poisoned.insert(cv_id);
        self
    }

    /// Answers with every hint it holds, including ids outside the batch.
    pub fn unfiltered(mut self) -> Self {
        self.unfiltered = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SimilarityService for ScriptedSimilarity {
    async fn find_similarities(
        &self,
        _job: &JobRequirement,
        batch: &[CandidateRecord],
    ) -> Result<HashMap<i64, SimilarityHint>, LlmError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let poisoned = batch
            .first()
            .is_some_and(|c| self.poisoned.contains(&c.cv_id));
        if poisoned || call < self.failures_before_success {
            return Err(LlmError::EmptyContent);
        }

        if self.unfiltered {
            return Ok(self.answer.clone());
        }

        Ok(batch
            .iter()
            .filter_map(|c| self.answer.get(&c.cv_id).map(|h| (c.cv_id, h.clone())))
            .collect())
    }

    fn is_configured(&self) -> bool {
        true
    }

    fn model(&self) -> &str {
        "scripted"
    }
}
