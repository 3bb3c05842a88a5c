//! Analyzer output: one tagged union covering every supported response shape.
//!
//! Normalization is lenient per field: a field with the wrong type becomes its empty
//! default, arrays are truncated, numbers clamped to 0–100.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MAX_TITLES: usize = 5;
pub const MAX_PROFILE_SKILLS: usize = 10;
pub const MAX_SCORED_SKILLS: usize = 15;
pub const MAX_BEST_MATCHES: usize = 20;
pub const MAX_MATCHED_IDS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum AnalysisResult {
    Profile(ProfileInsights),
    Scored(ScoredInsights),
    MatchedIds(MatchedJobIds),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInsights {
    pub titles: Vec<String>,
    pub skills: Vec<String>,
    pub experience: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredInsights {
    pub titles: Vec<String>,
    pub skills: Vec<String>,
    pub experience: String,
    pub relevance: u32,
    pub best_matches: Vec<BestMatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestMatch {
    pub job_id: String,
    pub match_score: u32,
    pub matching_skills: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedJobIds {
    pub matched_job_ids: Vec<String>,
}

impl AnalysisResult {
    /// Suggested titles; empty for the id-only variant.
    pub fn titles(&self) -> &[String] {
        match self {
            AnalysisResult::Profile(p) => &p.titles,
            AnalysisResult::Scored(s) => &s.titles,
            AnalysisResult::MatchedIds(_) => &[],
        }
    }

    pub fn skills(&self) -> &[String] {
        match self {
            AnalysisResult::Profile(p) => &p.skills,
            AnalysisResult::Scored(s) => &s.skills,
            AnalysisResult::MatchedIds(_) => &[],
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Normalization from raw model JSON
// ────────────────────────────────────────────────────────────────────────────

/// Outcome of normalizing one model response.
pub(super) struct Normalized<T> {
    pub value: T,
    /// How many of the variant's top-level fields were present with the right type.
    pub recognized_fields: usize,
}

pub(super) fn normalize_profile(raw: &Value) -> Normalized<ProfileInsights> {
    let titles = string_list(raw, "titles", MAX_TITLES);
    let skills = string_list(raw, "skills", MAX_PROFILE_SKILLS);
    let experience = string_field(raw, "experience");
    Normalized {
        recognized_fields: count_some([titles.is_some(), skills.is_some(), experience.is_some()]),
        value: ProfileInsights {
            titles: titles.unwrap_or_default(),
            skills: skills.unwrap_or_default(),
            experience: experience.unwrap_or_default(),
        },
    }
}

pub(super) fn normalize_scored(raw: &Value) -> Normalized<ScoredInsights> {
    let titles = string_list(raw, "titles", MAX_TITLES);
    let skills = string_list(raw, "skills", MAX_SCORED_SKILLS);
    let experience = string_field(raw, "experience");
    let relevance = score_field(raw, "relevance");
    let best_matches = raw.get("bestMatches").and_then(Value::as_array).map(|arr| {
        arr.iter()
            .filter_map(normalize_best_match)
            .take(MAX_BEST_MATCHES)
            .collect::<Vec<_>>()
    });

    Normalized {
        recognized_fields: count_some([
            titles.is_some(),
            skills.is_some(),
            experience.is_some(),
            relevance.is_some(),
            best_matches.is_some(),
        ]),
        value: ScoredInsights {
            titles: titles.unwrap_or_default(),
            skills: skills.unwrap_or_default(),
            experience: experience.unwrap_or_default(),
            relevance: relevance.unwrap_or(0),
            best_matches: best_matches.unwrap_or_default(),
        },
    }
}

pub(super) fn normalize_matched_ids(raw: &Value) -> Normalized<MatchedJobIds> {
    let ids = raw.get("matchedJobIds").and_then(Value::as_array).map(|arr| {
        arr.iter()
            .filter_map(id_value)
            .take(MAX_MATCHED_IDS)
            .collect::<Vec<_>>()
    });
    Normalized {
        recognized_fields: count_some([ids.is_some()]),
        value: MatchedJobIds {
            matched_job_ids: ids.unwrap_or_default(),
        },
    }
}

/// Entries without a usable job id are dropped.
fn normalize_best_match(raw: &Value) -> Option<BestMatch> {
    let job_id = raw.get("jobId").and_then(id_value)?;
    Some(BestMatch {
        job_id,
        match_score: score_field(raw, "matchScore").unwrap_or(0),
        matching_skills: string_list(raw, "matchingSkills", MAX_SCORED_SKILLS).unwrap_or_default(),
    })
}

/// Array of non-blank strings, trimmed and truncated. `None` when the field is
/// missing or not an array; non-string elements are skipped.
fn string_list(raw: &Value, key: &str, max: usize) -> Option<Vec<String>> {
    raw.get(key).and_then(Value::as_array).map(|arr| {
        arr.iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .take(max)
            .map(String::from)
            .collect()
    })
}

fn string_field(raw: &Value, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(|s| s.trim().to_string())
}

/// Numeric (or numeric-string) score clamped to 0–100.
fn score_field(raw: &Value, key: &str) -> Option<u32> {
    let value = raw.get(key)?;
    let number = value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))?;
    if number.is_nan() {
        return None;
    }
    Some(number.clamp(0.0, 100.0).round() as u32)
}

/// Job ids may come back as strings or bare numbers.
fn id_value(raw: &Value) -> Option<String> {
    let id = match raw {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!id.is_empty()).then_some(id)
}

fn count_some<const N: usize>(flags: [bool; N]) -> usize {
    flags.iter().filter(|f| **f).count()
}
