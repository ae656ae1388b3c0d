//! Skill Parser: normalises delimited skill strings into canonical tokens.

use std::collections::HashSet;

/// Delimiter shared by skill, accolade and exception columns.
pub const SKILL_DELIMITER: char = ',';

/// Splits a delimited skills string into distinct, trimmed, lowercase tokens.
///
/// Order of first appearance is preserved. `None`, empty strings and empty
/// segments (`"a,,b"`) degrade to fewer tokens rather than failing.
pub fn parse_skills(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    raw.split(SKILL_DELIMITER)
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

/// Counts non-empty delimited entries without deduplicating them.
pub fn count_entries(raw: Option<&str>) -> usize {
    raw.map(|r| {
        r.split(SKILL_DELIMITER)
            .filter(|s| !s.trim().is_empty())
            .count()
    })
    .unwrap_or(0)
}
