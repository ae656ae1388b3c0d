//! Scoring Engine: deterministic 100-point match score for one candidate.
//!
//! Component maxima:
//! - must-have skills: 40
//! - good-to-have skills: 25
//! - soft skills: 15
//! - domain expertise: 10
//! - experience fit: 10
//! - accolades bonus: 10
//! - exception penalties: -50 for a skill hit, -50 for a company hit
//!
//! The sum is clamped to [0, 100] and mapped to a 1–5 star rating.
//!
//! A category with no job-side tokens scores 0, while a job with no
//! experience bounds awards full experience credit. Both rules are kept
//! as they are observed in production rankings.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::matchmaker::similarity::{SimilarityHint, EQUIVALENCE_SEPARATOR};
use crate::matchmaker::skills::{count_entries, parse_skills};
use crate::models::candidate::CandidateRecord;
use crate::models::job::JobRequirement;

pub const MUST_HAVE_MAX: u32 = 40;
pub const GOOD_TO_HAVE_MAX: u32 = 25;
pub const SOFT_SKILLS_MAX: u32 = 15;
pub const DOMAIN_MAX: u32 = 10;
pub const EXPERIENCE_MAX: u32 = 10;
const EXPERIENCE_NEAR_MISS: u32 = 5;
/// Distance in years from a bound that still earns partial credit.
const EXPERIENCE_TOLERANCE_YEARS: f64 = 1.0;
pub const ACCOLADES_MAX: u32 = 10;
const POINTS_PER_ACCOLADE: u32 = 2;
pub const EXCEPTION_PENALTY: i32 = -50;

/// Per-component sub-scores. Only `penalties` can be negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub must_have: u32,
    pub good_to_have: u32,
    pub soft_skills: u32,
    pub domain: u32,
    pub experience: u32,
    pub accolades: u32,
    pub penalties: i32,
}

impl ScoreBreakdown {
    /// Unclamped sum of all components.
    pub fn raw_total(&self) -> i32 {
        let positive = self.must_have
            + self.good_to_have
            + self.soft_skills
            + self.domain
            + self.experience
            + self.accolades;
        positive as i32 + self.penalties
    }
}

/// Output of scoring one candidate against one job. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// 0–100 after clamping.
    pub match_percentage: u8,
    /// 1–5 stars.
    pub rating: u8,
    pub breakdown: ScoreBreakdown,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
}

/// Matched and missing job tokens for one skill category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillMatch {
    pub matched: Vec<String>,
    pub missing: Vec<String>,
}

/// Scores `candidate` against `job`, folding in equivalence pairs from `hint`.
///
/// Pure: identical inputs always yield identical output.
pub fn score(
    job: &JobRequirement,
    candidate: &CandidateRecord,
    hint: &SimilarityHint,
) -> MatchResult {
    let job_must = parse_skills(job.must_have_skills.as_deref());
    let job_good = parse_skills(job.good_to_have_skills.as_deref());
    let job_soft = parse_skills(job.soft_skills.as_deref());

    let cv_must = parse_skills(candidate.cv_must_to_have.as_deref());
    let cv_good = parse_skills(candidate.cv_good_to_have.as_deref());
    let cv_soft = parse_skills(candidate.cv_soft_skills.as_deref());

    let must = match_skills(&job_must, &cv_must, &hint.must_have_similar);
    let good = match_skills(&job_good, &cv_good, &hint.good_to_have_similar);
    let soft = match_skills(&job_soft, &cv_soft, &hint.soft_skills_similar);

    let mut combined_cv_skills = cv_must;
    combined_cv_skills.extend(cv_good);

    let breakdown = ScoreBreakdown {
        must_have: category_score(must.matched.len(), job_must.len(), MUST_HAVE_MAX),
        good_to_have: category_score(good.matched.len(), job_good.len(), GOOD_TO_HAVE_MAX),
        soft_skills: category_score(soft.matched.len(), job_soft.len(), SOFT_SKILLS_MAX),
        domain: domain_score(
            job.domain_expertise.as_deref(),
            candidate.cv_domain_expertise.as_deref(),
        ),
        experience: experience_score(
            candidate.cv_experience,
            job.op_experience_min,
            job.op_experience_max,
        ),
        accolades: accolades_bonus(candidate.cv_accolades.as_deref()),
        penalties: exception_penalty(
            &combined_cv_skills,
            candidate.cv_current_company.as_deref(),
            job.exception_skills.as_deref(),
            job.exception_list.as_deref(),
        ),
    };

    let match_percentage = breakdown.raw_total().clamp(0, 100) as u8;

    let mut matched_skills = must.matched;
    matched_skills.extend(good.matched);
    matched_skills.extend(soft.matched);

    let mut missing_skills = must.missing;
    missing_skills.extend(good.missing);
    missing_skills.extend(soft.missing);

    MatchResult {
        match_percentage,
        rating: rating_for(match_percentage),
        breakdown,
        matched_skills,
        missing_skills,
    }
}

/// Exact matches first, then equivalence pairs (`candidate~job`) resolve
/// tokens that are still missing. A pair whose job side is already matched
/// or unknown is ignored, so nothing is counted twice.
pub fn match_skills(job_skills: &[String], cv_skills: &[String], equivalences: &[String]) -> SkillMatch {
    let cv_set: HashSet<&str> = cv_skills.iter().map(String::as_str).collect();

    let (mut matched, mut missing): (Vec<String>, Vec<String>) = job_skills
        .iter()
        .cloned()
        .partition(|skill| cv_set.contains(skill.as_str()));

    for pair in equivalences {
        let Some((cv_skill, job_skill)) = pair.split_once(EQUIVALENCE_SEPARATOR) else {
            continue;
        };
        let cv_skill = cv_skill.trim().to_lowercase();
        let job_skill = job_skill.trim().to_lowercase();

        if let Some(pos) = missing.iter().position(|m| *m == job_skill) {
            missing.remove(pos);
            matched.push(format!("{job_skill} (similar: {cv_skill})"));
        }
    }

    SkillMatch { matched, missing }
}

/// `round(matched / total × max)`, or 0 when the job lists nothing.
pub fn category_score(matched: usize, total: usize, max: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let score = (matched as f64 / total as f64 * f64::from(max)).round() as u32;
    score.min(max)
}

/// Full credit when the two texts share any whitespace-delimited word.
pub fn domain_score(job_domain: Option<&str>, cv_domain: Option<&str>) -> u32 {
    let (Some(job_domain), Some(cv_domain)) = (job_domain, cv_domain) else {
        return 0;
    };

    let job_words: HashSet<String> = job_domain
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();

    if cv_domain
        .split_whitespace()
        .any(|w| job_words.contains(&w.to_lowercase()))
    {
        DOMAIN_MAX
    } else {
        0
    }
}

/// 10 inside [min, max], 5 within a year of either bound, else 0.
/// A missing lower bound counts as 0 years and a missing upper bound as 100.
pub fn experience_score(cv_years: Option<f64>, min: Option<i32>, max: Option<i32>) -> u32 {
    let Some(years) = cv_years else {
        return 0;
    };

    if min.is_none() && max.is_none() {
        return EXPERIENCE_MAX;
    }

    let lo = min.map(f64::from).unwrap_or(0.0);
    let hi = max.map(f64::from).unwrap_or(100.0);

    if (lo..=hi).contains(&years) {
        EXPERIENCE_MAX
    } else if (years - lo).abs() <= EXPERIENCE_TOLERANCE_YEARS
        || (years - hi).abs() <= EXPERIENCE_TOLERANCE_YEARS
    {
        EXPERIENCE_NEAR_MISS
    } else {
        0
    }
}

/// Two points per accolade, capped at 10.
pub fn accolades_bonus(accolades: Option<&str>) -> u32 {
    (count_entries(accolades) as u32)
        .saturating_mul(POINTS_PER_ACCOLADE)
        .min(ACCOLADES_MAX)
}

/// -50 if any exception skill is among the candidate's skills, and an
/// independent -50 if any exception company is a substring of the current
/// employer. Each applies at most once.
pub fn exception_penalty(
    cv_skills: &[String],
    current_company: Option<&str>,
    exception_skills: Option<&str>,
    exception_companies: Option<&str>,
) -> i32 {
    let mut penalty = 0;

    if let Some(hit) = parse_skills(exception_skills)
        .into_iter()
        .find(|exc| cv_skills.contains(exc))
    {
        warn!("Exception skill found: {hit}");
        penalty += EXCEPTION_PENALTY;
    }

    if let Some(company) = current_company {
        let company = company.to_lowercase();
        if let Some(hit) = parse_skills(exception_companies)
            .into_iter()
            .find(|blocked| company.contains(blocked.as_str()))
        {
            warn!("Blacklisted company found: {hit}");
            penalty += EXCEPTION_PENALTY;
        }
    }

    penalty
}

/// Star rating: ≥90→5, ≥75→4, ≥60→3, ≥40→2, else 1.
pub fn rating_for(match_percentage: u8) -> u8 {
    match match_percentage {
        90..=u8::MAX => 5,
        75..=89 => 4,
        60..=74 => 3,
        40..=59 => 2,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchmaker::test_support::{make_candidate, make_job};

    fn skills(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_partial_must_have_scenario() {
        let job = make_job("python, aws, sql", None, None);
        let cv = make_candidate(1, Some("python, sql"), None);

        let result = score(&job, &cv, &SimilarityHint::default());

        assert_eq!(result.breakdown.must_have, 27);
        assert_eq!(result.breakdown.good_to_have, 0);
        assert_eq!(result.breakdown.soft_skills, 0);
        assert_eq!(result.breakdown.domain, 0);
        assert_eq!(result.breakdown.experience, 0);
        assert_eq!(result.breakdown.accolades, 0);
        assert_eq!(result.breakdown.penalties, 0);
        assert_eq!(result.match_percentage, 27);
        assert_eq!(result.rating, 1);
        assert_eq!(result.matched_skills, skills(&["python", "sql"]));
        assert_eq!(result.missing_skills, skills(&["aws"]));
    }

    #[test]
    fn test_full_must_have_with_extras_scenario() {
        let mut job = make_job("python, aws, sql", None, None);
        job.domain_expertise = Some("FinTech payments".to_string());
        job.op_experience_min = Some(3);
        job.op_experience_max = Some(6);
        let mut cv = make_candidate(1, Some("Python, AWS, SQL"), None);
        cv.cv_experience = Some(4.0);
        cv.cv_accolades = Some("Hackathon winner, Employee of the year".to_string());
        cv.cv_domain_expertise = Some("Payments infrastructure".to_string());

        let result = score(&job, &cv, &SimilarityHint::default());

        assert_eq!(result.breakdown.must_have, 40);
        assert_eq!(result.breakdown.domain, 10);
        assert_eq!(result.breakdown.experience, 10);
        assert_eq!(result.breakdown.accolades, 4);
        assert_eq!(result.match_percentage, 64);
        assert_eq!(result.rating, 3);
        assert!(result.missing_skills.is_empty());
    }

    #[test]
    fn test_exception_skill_in_good_to_have_costs_fifty() {
        let mut job = make_job("python, aws", Some("docker"), None);
        let mut cv = make_candidate(1, Some("python, aws"), Some("docker, php"));
        cv.cv_experience = Some(5.0);
        let baseline = score(&job, &cv, &SimilarityHint::default());
        assert_eq!(baseline.match_percentage, 75);

        job.exception_skills = Some("PHP".to_string());
        let penalised = score(&job, &cv, &SimilarityHint::default());

        assert_eq!(penalised.breakdown.penalties, -50);
        assert_eq!(penalised.match_percentage, 25);
    }

    #[test]
    fn test_penalty_clamps_at_zero() {
        let mut job = make_job("python, aws, sql", None, None);
        job.exception_skills = Some("cobol".to_string());
        let cv = make_candidate(1, Some("python, sql, cobol"), None);

        let result = score(&job, &cv, &SimilarityHint::default());

        assert_eq!(result.breakdown.raw_total(), 27 - 50);
        assert_eq!(result.match_percentage, 0);
        assert_eq!(result.rating, 1);
    }

    #[test]
    fn test_exception_skill_penalty_applies_once() {
        let penalty = exception_penalty(
            &skills(&["php", "cobol", "perl"]),
            None,
            Some("PHP, COBOL, Perl"),
            None,
        );
        assert_eq!(penalty, -50);
    }

    #[test]
    fn test_company_and_skill_penalties_are_independent() {
        let penalty = exception_penalty(
            &skills(&["php"]),
            Some("Acme Consulting Pvt Ltd"),
            Some("php"),
            Some("Globex, acme consulting, Initech"),
        );
        assert_eq!(penalty, -100);
    }

    #[test]
    fn test_company_penalty_needs_current_company() {
        assert_eq!(exception_penalty(&[], None, None, Some("Acme")), 0);
        assert_eq!(exception_penalty(&[], Some("Umbrella"), None, Some("Acme")), 0);
    }

    #[test]
    fn test_empty_must_have_scores_zero() {
        let job = make_job("", None, None);
        let cv = make_candidate(1, Some("python, aws, sql"), None);

        let result = score(&job, &cv, &SimilarityHint::default());

        assert_eq!(result.breakdown.must_have, 0);
    }

    #[test]
    fn test_equivalence_resolves_missing_token() {
        let result = match_skills(
            &skills(&["django", "postgresql"]),
            &skills(&["flask", "postgresql"]),
            &skills(&["Flask~Django"]),
        );
        assert_eq!(result.matched, skills(&["postgresql", "django (similar: flask)"]));
        assert!(result.missing.is_empty());
    }

    #[test]
    fn test_equivalence_never_double_counts() {
        let result = match_skills(
            &skills(&["django", "aws"]),
            &skills(&["django", "flask"]),
            &skills(&[
                "flask~django",
                "bottle~aws",
                "lambda~aws",
                "malformed",
                "rails~ruby",
            ]),
        );
        assert_eq!(result.matched.len(), 2);
        assert_eq!(result.matched[1], "aws (similar: bottle)");
        assert!(result.missing.is_empty());
    }

    #[test]
    fn test_equivalences_feed_category_score() {
        let job = make_job("django, mysql", None, None);
        let cv = make_candidate(1, Some("flask"), None);
        let hint = SimilarityHint {
            must_have_similar: skills(&["flask~django"]),
            // Hints for other categories do not leak into must-have
            good_to_have_similar: skills(&["postgresql~mysql"]),
            ..Default::default()
        };

        let result = score(&job, &cv, &hint);

        assert_eq!(result.breakdown.must_have, 20);
        assert_eq!(result.missing_skills, skills(&["mysql"]));
    }

    #[test]
    fn test_experience_bands() {
        assert_eq!(experience_score(Some(4.0), Some(3), Some(6)), 10);
        assert_eq!(experience_score(Some(3.0), Some(3), Some(6)), 10);
        assert_eq!(experience_score(Some(6.0), Some(3), Some(6)), 10);
        assert_eq!(experience_score(Some(2.0), Some(3), Some(6)), 5);
        assert_eq!(experience_score(Some(7.0), Some(3), Some(6)), 5);
        assert_eq!(experience_score(Some(1.5), Some(3), Some(6)), 0);
        assert_eq!(experience_score(Some(9.0), Some(3), Some(6)), 0);
    }

    #[test]
    fn test_experience_without_bounds_is_full_credit() {
        assert_eq!(experience_score(Some(0.0), None, None), 10);
        assert_eq!(experience_score(None, None, None), 0);
        assert_eq!(experience_score(None, Some(1), Some(2)), 0);
    }

    #[test]
    fn test_experience_with_single_bound() {
        assert_eq!(experience_score(Some(20.0), Some(5), None), 10);
        assert_eq!(experience_score(Some(4.5), Some(5), None), 5);
        assert_eq!(experience_score(Some(12.0), None, Some(10)), 0);
    }

    #[test]
    fn test_domain_overlap_is_case_insensitive() {
        assert_eq!(domain_score(Some("Healthcare Analytics"), Some("clinical HEALTHCARE")), 10);
        assert_eq!(domain_score(Some("Healthcare"), Some("Retail")), 0);
        assert_eq!(domain_score(None, Some("Retail")), 0);
    }

    #[test]
    fn test_accolades_cap_at_ten() {
        assert_eq!(accolades_bonus(None), 0);
        assert_eq!(accolades_bonus(Some("A")), 2);
        assert_eq!(accolades_bonus(Some("A, B, C, D, E, F, G")), 10);
    }

    #[test]
    fn test_category_scores_respect_maxima() {
        assert_eq!(category_score(3, 3, MUST_HAVE_MAX), 40);
        assert_eq!(category_score(1, 2, GOOD_TO_HAVE_MAX), 13);
        assert_eq!(category_score(1, 3, SOFT_SKILLS_MAX), 5);
        assert_eq!(category_score(0, 0, SOFT_SKILLS_MAX), 0);
    }

    #[test]
    fn test_rating_thresholds() {
        for (pct, expected) in [
            (100, 5),
            (90, 5),
            (89, 4),
            (75, 4),
            (74, 3),
            (60, 3),
            (59, 2),
            (40, 2),
            (39, 1),
            (0, 1),
        ] {
            assert_eq!(rating_for(pct), expected, "pct {pct}");
        }
    }

    #[test]
    fn test_score_is_bounded_and_repeatable() {
        let mut job = make_job("a, b", Some("c, d"), Some("e"));
        job.domain_expertise = Some("x".to_string());
        let mut cv = make_candidate(1, Some("a, b"), Some("c, d"));
        cv.cv_soft_skills = Some("e".to_string());
        cv.cv_domain_expertise = Some("x".to_string());
        cv.cv_experience = Some(1.0);
        cv.cv_accolades = Some("1, 2, 3, 4, 5".to_string());

        let first = score(&job, &cv, &SimilarityHint::default());
        let second = score(&job, &cv, &SimilarityHint::default());

        assert_eq!(first, second);
        assert_eq!(first.breakdown.raw_total(), 110);
        assert_eq!(first.match_percentage, 100);
        assert_eq!(first.rating, 5);
    }
}
