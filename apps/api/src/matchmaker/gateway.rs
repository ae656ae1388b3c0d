//! Persistence Gateway: the read/write operations the pipeline needs from storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::candidate::{CandidateRecord, CandidateRow, CandidateStage, CandidateStatus};
use crate::models::job::JobRequirement;

const CANDIDATE_COLUMNS: &str = "cv_id, cv_name, cv_email, cv_mobile, cv_current_company, \
    cv_role, cv_experience, cv_ectc, cv_active, cv_stage, cv_status, cv_must_to_have, \
    cv_good_to_have, cv_soft_skills, cv_domain_expertise, cv_accolades";

/// Pre-filter criteria for eligible candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFilter {
    pub stages: Vec<CandidateStage>,
    pub statuses: Vec<CandidateStatus>,
    /// Inclusive years-of-experience range, only when the job sets both bounds.
    pub experience_range: Option<(f64, f64)>,
    /// Inclusive compensation range, only when the job sets both bounds.
    pub budget_range: Option<(f64, f64)>,
}

impl CandidateFilter {
    /// Active candidates in an eligible stage and status, narrowed by the
    /// job's experience and budget bounds when it has them.
    pub fn for_job(job: &JobRequirement) -> Self {
        Self {
            stages: CandidateStage::ALL.to_vec(),
            statuses: CandidateStatus::ALL.to_vec(),
            experience_range: job.experience_range(),
            budget_range: job.budget_range(),
        }
    }

    /// In-process equivalent of the SQL predicate used by `PgGateway`.
    /// A range filter excludes candidates whose value is missing.
    #[cfg(test)]
    pub fn admits(&self, candidate: &CandidateRecord) -> bool {
        candidate.cv_active
            && self.stages.contains(&candidate.cv_stage)
            && self.statuses.contains(&candidate.cv_status)
            && within(self.experience_range, candidate.cv_experience)
            && within(self.budget_range, candidate.cv_ectc)
    }
}

#[cfg(test)]
fn within(range: Option<(f64, f64)>, value: Option<f64>) -> bool {
    match (range, value) {
        (None, _) => true,
        (Some((lo, hi)), Some(v)) => (lo..=hi).contains(&v),
        (Some(_), None) => false,
    }
}

/// One write-back of a qualifying match onto a candidate row.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchWrite {
    pub candidate_id: i64,
    pub match_percentage: u8,
    pub rating: u8,
    pub matched_job_title: String,
    pub matched_at: DateTime<Utc>,
}

/// Storage boundary of the pipeline. Injected as `Arc<dyn PersistenceGateway>`.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn get_job(&self, job_id: i64) -> Result<Option<JobRequirement>, AppError>;

    async fn get_candidates(
        &self,
        filter: &CandidateFilter,
    ) -> Result<Vec<CandidateRecord>, AppError>;

    /// Absent when the row is gone or its lifecycle values are unknown.
    async fn get_candidate_by_id(
        &self,
        candidate_id: i64,
    ) -> Result<Option<CandidateRecord>, AppError>;

    /// Whether the row still exists, whatever its current stage or status.
    async fn candidate_exists(&self, candidate_id: i64) -> Result<bool, AppError>;

    /// Applies all writes as one logical batch and returns how many rows
    /// were updated. Missing candidates are skipped, not errors.
    async fn write_match_results(&self, writes: &[MatchWrite]) -> Result<usize, AppError>;
}

/// PostgreSQL implementation over the `job_descriptions` and `cvs` tables.
#[derive(Clone)]
pub struct PgGateway {
    pool: PgPool,
}

impl PgGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PersistenceGateway for PgGateway {
    async fn get_job(&self, job_id: i64) -> Result<Option<JobRequirement>, AppError> {
        let job = sqlx::query_as::<_, JobRequirement>(
            r#"
            SELECT id, job_title, company_name, must_have_skills, good_to_have_skills,
                   soft_skills, domain_expertise, exception_skills, exception_list,
                   op_experience_min, op_experience_max, op_budget_min, op_budget_max
            FROM job_descriptions
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }

    async fn get_candidates(
        &self,
        filter: &CandidateFilter,
    ) -> Result<Vec<CandidateRecord>, AppError> {
        let stages: Vec<String> = filter.stages.iter().map(|s| s.to_string()).collect();
        let statuses: Vec<String> = filter.statuses.iter().map(|s| s.to_string()).collect();
        let (exp_min, exp_max) = filter.experience_range.unzip();
        let (budget_min, budget_max) = filter.budget_range.unzip();

        let sql = format!(
            r#"
            SELECT {CANDIDATE_COLUMNS}
            FROM cvs
            WHERE cv_active = TRUE
              AND cv_stage = ANY($1)
              AND cv_status = ANY($2)
              AND ($3::float8 IS NULL OR cv_experience >= $3)
              AND ($4::float8 IS NULL OR cv_experience <= $4)
              AND ($5::float8 IS NULL OR cv_ectc >= $5)
              AND ($6::float8 IS NULL OR cv_ectc <= $6)
            ORDER BY cv_id
            "#
        );

        let rows = sqlx::query_as::<_, CandidateRow>(&sql)
            .bind(&stages)
            .bind(&statuses)
            .bind(exp_min)
            .bind(exp_max)
            .bind(budget_min)
            .bind(budget_max)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().filter_map(into_record).collect())
    }

    async fn get_candidate_by_id(
        &self,
        candidate_id: i64,
    ) -> Result<Option<CandidateRecord>, AppError> {
        let sql = format!("SELECT {CANDIDATE_COLUMNS} FROM cvs WHERE cv_id = $1");
        let row = sqlx::query_as::<_, CandidateRow>(&sql)
            .bind(candidate_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.and_then(into_record))
    }

    async fn candidate_exists(&self, candidate_id: i64) -> Result<bool, AppError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM cvs WHERE cv_id = $1)")
                .bind(candidate_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn write_match_results(&self, writes: &[MatchWrite]) -> Result<usize, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut updated = 0;

        for write in writes {
            let result = sqlx::query(
                r#"
                UPDATE cvs
                SET matched_jd_title = $1, cv_match_perc = $2, cv_rating = $3, date_of_match = $4
                WHERE cv_id = $5
                "#,
            )
            .bind(&write.matched_job_title)
            .bind(i16::from(write.match_percentage))
            .bind(i16::from(write.rating))
            .bind(write.matched_at)
            .bind(write.candidate_id)
            .execute(&mut *tx)
            .await?;

            updated += result.rows_affected() as usize;
        }

        tx.commit().await?;
        info!("Updated {updated} CVs in database");
        Ok(updated)
    }
}

/// Rejects rows with unknown lifecycle values at the storage boundary.
fn into_record(row: CandidateRow) -> Option<CandidateRecord> {
    let cv_id = row.cv_id;
    match CandidateRecord::try_from(row) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!("Skipping CV {cv_id}: {e}");
            None
        }
    }
}
