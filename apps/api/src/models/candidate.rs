use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;

/// A lifecycle value read from storage that is not part of the closed set.
#[derive(Debug, Error, PartialEq)]
#[error("unknown {field} value '{value}'")]
pub struct UnknownLifecycleValue {
    pub field: &'static str,
    pub value: String,
}

/// Candidate pipeline stage. Only these stages are eligible for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateStage {
    #[serde(rename = "Screening Negotiation")]
    ScreeningNegotiation,
    Shortlisted,
    Interview,
}

impl CandidateStage {
    pub const ALL: [CandidateStage; 3] = [
        CandidateStage::ScreeningNegotiation,
        CandidateStage::Shortlisted,
        CandidateStage::Interview,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStage::ScreeningNegotiation => "Screening Negotiation",
            CandidateStage::Shortlisted => "Shortlisted",
            CandidateStage::Interview => "Interview",
        }
    }
}

impl FromStr for CandidateStage {
    type Err = UnknownLifecycleValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CandidateStage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s.trim())
            .ok_or_else(|| UnknownLifecycleValue {
                field: "cv_stage",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for CandidateStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Candidate review status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateStatus {
    Staging,
    Reviewed,
}

impl CandidateStatus {
    pub const ALL: [CandidateStatus; 2] = [CandidateStatus::Staging, CandidateStatus::Reviewed];

    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::Staging => "Staging",
            CandidateStatus::Reviewed => "Reviewed",
        }
    }
}

impl FromStr for CandidateStatus {
    type Err = UnknownLifecycleValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CandidateStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| UnknownLifecycleValue {
                field: "cv_status",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw `cvs` row. Stage and status are still free text here.
#[derive(Debug, Clone, FromRow)]
pub struct CandidateRow {
    pub cv_id: i64,
    pub cv_name: String,
    pub cv_email: Option<String>,
    pub cv_mobile: Option<String>,
    pub cv_current_company: Option<String>,
    pub cv_role: Option<String>,
    pub cv_experience: Option<f64>,
    pub cv_ectc: Option<f64>,
    pub cv_active: bool,
    pub cv_stage: String,
    pub cv_status: String,
    pub cv_must_to_have: Option<String>,
    pub cv_good_to_have: Option<String>,
    pub cv_soft_skills: Option<String>,
    pub cv_domain_expertise: Option<String>,
    pub cv_accolades: Option<String>,
}

/// Read-only snapshot of a candidate taken at pre-filter time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub cv_id: i64,
    pub cv_name: String,
    pub cv_email: Option<String>,
    pub cv_mobile: Option<String>,
    pub cv_current_company: Option<String>,
    pub cv_role: Option<String>,
    pub cv_experience: Option<f64>,
    pub cv_ectc: Option<f64>,
    pub cv_active: bool,
    pub cv_stage: CandidateStage,
    pub cv_status: CandidateStatus,
    pub cv_must_to_have: Option<String>,
    pub cv_good_to_have: Option<String>,
    pub cv_soft_skills: Option<String>,
    pub cv_domain_expertise: Option<String>,
    pub cv_accolades: Option<String>,
}

impl TryFrom<CandidateRow> for CandidateRecord {
    type Error = UnknownLifecycleValue;

    fn try_from(row: CandidateRow) -> Result<Self, Self::Error> {
        Ok(CandidateRecord {
            cv_stage: row.cv_stage.parse()?,
            cv_status: row.cv_status.parse()?,
            cv_id: row.cv_id,
            cv_name: row.cv_name,
            cv_email: row.cv_email,
            cv_mobile: row.cv_mobile,
            cv_current_company: row.cv_current_company,
            cv_role: row.cv_role,
            cv_experience: row.cv_experience,
            cv_ectc: row.cv_ectc,
            cv_active: row.cv_active,
            cv_must_to_have: row.cv_must_to_have,
            cv_good_to_have: row.cv_good_to_have,
            cv_soft_skills: row.cv_soft_skills,
            cv_domain_expertise: row.cv_domain_expertise,
            cv_accolades: row.cv_accolades,
        })
    }
}
