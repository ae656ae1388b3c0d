use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One job description's matching inputs, as stored in `job_descriptions`.
///
/// Skill columns hold raw comma-delimited strings; they are parsed on demand
/// by `matchmaker::skills::parse_skills`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct JobRequirement {
    pub id: i64,
    pub job_title: String,
    pub company_name: String,
    pub must_have_skills: Option<String>,
    pub good_to_have_skills: Option<String>,
    pub soft_skills: Option<String>,
    pub domain_expertise: Option<String>,
    pub exception_skills: Option<String>,
    /// Comma-delimited list of companies whose employees are penalised.
    pub exception_list: Option<String>,
    pub op_experience_min: Option<i32>,
    pub op_experience_max: Option<i32>,
    pub op_budget_min: Option<f64>,
    pub op_budget_max: Option<f64>,
}

impl JobRequirement {
    /// Label written onto matched candidates.
    pub fn match_label(&self) -> String {
        if self.job_title.trim().is_empty() {
            format!("JD-{}", self.id)
        } else {
            self.job_title.clone()
        }
    }

    /// Inclusive experience range, only when both bounds are set.
    pub fn experience_range(&self) -> Option<(f64, f64)> {
        match (self.op_experience_min, self.op_experience_max) {
            (Some(min), Some(max)) => Some((f64::from(min), f64::from(max))),
            _ => None,
        }
    }

    /// Inclusive compensation range, only when both bounds are set.
    pub fn budget_range(&self) -> Option<(f64, f64)> {
        match (self.op_budget_min, self.op_budget_max) {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        }
    }
}
