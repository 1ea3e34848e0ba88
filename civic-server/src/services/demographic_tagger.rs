//! Keyword-based demographic tagging
//!
//! Matching is a case-insensitive substring test against the original
//! submission text, so short keywords also hit inside longer words
//! ("old" in "household", "city" in "publicity").

/// Tag and the keywords that attach it, in output order
const KEYWORD_RULES: &[(&str, &[&str])] = &[
    ("Elderly (65+)", &["senior", "elderly", "old"]),
    ("Youth (18-25)", &["young", "youth", "student"]),
    ("Immigrant", &["immigrant", "foreign"]),
    ("Low Income", &["low income", "poor", "affordable"]),
    ("Suburban", &["suburban", "suburb"]),
    ("Urban", &["urban", "city"]),
    ("Rural", &["rural", "country"]),
];

const BASELINE_LANGUAGE: &str = "English";

/// Detect demographic tags for `text`.
///
/// A `"{language} Speaker"` tag comes first when `language` is present and
/// not English; keyword tags follow in rule order.
pub fn detect_demographic_tags(text: &str, language: Option<&str>) -> Vec<String> {
    let mut tags = Vec::new();

    if let Some(language) = language.map(str::trim).filter(|l| !l.is_empty()) {
        if language != BASELINE_LANGUAGE {
            tags.push(format!("{} Speaker", language));
        }
    }

    let lower = text.to_lowercase();
    for (tag, keywords) in KEYWORD_RULES {
        if keywords.iter().any(|keyword| lower.contains(keyword)) {
            tags.push((*tag).to_string());
        }
    }

    tags
}

/// Ingestion tags followed by detected tags, keeping the first occurrence
pub fn merge_tags(ingested: &[String], detected: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(ingested.len() + detected.len());
    for tag in ingested.iter().chain(detected) {
        if !merged.contains(tag) {
            merged.push(tag.clone());
        }
    }
    merged
}
