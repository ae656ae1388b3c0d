// Prompt constants for the similarity batch call.

/// System prompt for similarity detection.
pub const SIMILARITY_SYSTEM: &str = "You are a technical recruiter matching candidate \
    skills to job requirements. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Batch prompt header. Replace: {must_have}, {good_to_have}, {soft_skills}, {count}
pub const BATCH_PROMPT_HEADER: &str = r#"JOB REQUIREMENTS:
Must-Have Skills: {must_have}
Good-to-Have Skills: {good_to_have}
Soft Skills: {soft_skills}

CVs TO MATCH ({count} candidates):
"#;

/// One candidate block. Replace: {cv_id}, {must_have}, {good_to_have}, {soft_skills}
pub const CANDIDATE_BLOCK_TEMPLATE: &str = r#"
[CV-{cv_id}]
Must-Have: {must_have}
Good-to-Have: {good_to_have}
Soft Skills: {soft_skills}
"#;

/// Task and output contract appended after the candidate blocks.
pub const BATCH_PROMPT_TASK: &str = r#"
TASK:
For each CV, identify:
1. Exact matches with JD skills (case-insensitive)
2. Similar/equivalent skills (e.g., Flask is similar to Django, PostgreSQL is similar to MySQL)

RULES:
- Only detect TECHNICAL similarity (e.g., Flask~Django, React~Vue)
- Write each similar pair as "<cv skill>~<jd skill>"
- DO NOT force matches where none exist
- Use the numeric id from [CV-<id>] as "cv_id"

OUTPUT FORMAT (STRICT JSON):
{
  "matches": [
    {
      "cv_id": 123,
      "must_have_matches": ["Python", "AWS"],
      "must_have_similar": ["Flask~Django", "PostgreSQL~MySQL"],
      "good_to_have_matches": ["Docker"],
      "good_to_have_similar": [],
      "soft_skills_matches": ["Leadership"],
      "soft_skills_similar": []
    }
  ]
}"#;
