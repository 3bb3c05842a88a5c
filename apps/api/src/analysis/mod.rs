// Resume Analyzer: asks the LLM what the resume is a fit for.
//
// The analyzer never fails: any transport, status, or parse problem yields the
// all-empty result for the configured mode with `AnalysisStatus::Degraded`, so
// callers can tell "AI unavailable" apart from "AI found nothing".

pub mod models;
pub mod prompts;

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::ChatCompletion;
use crate::models::job::JobRecord;

pub use models::{AnalysisResult, BestMatch, MatchedJobIds, ProfileInsights, ScoredInsights};
use prompts::{
    ANALYST_ROLE, AVAILABLE_JOBS_HEADING, MATCHED_IDS_INSTRUCTION, PROFILE_INSTRUCTION,
    SCORED_INSTRUCTION,
};

/// Resume text beyond this many characters is never sent to the model.
pub const MAX_RESUME_CHARS: usize = 15_000;
/// Budget for the condensed job list appended to the system prompt.
pub const MAX_CORPUS_SUMMARY_CHARS: usize = 5_000;

/// Which response shape the model is asked for. Selected by `ANALYSIS_MODE`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// Titles, skills, experience; ranked heuristically.
    #[default]
    Profile,
    /// Profile plus per-job scores; ranked by the model's scores.
    Scored,
    /// Bare list of job ids.
    MatchedIds,
}

#[derive(Debug, Error)]
#[error("unknown analysis mode '{0}'")]
pub struct UnknownAnalysisMode(String);

impl FromStr for AnalysisMode {
    type Err = UnknownAnalysisMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "profile" => Ok(Self::Profile),
            "scored" => Ok(Self::Scored),
            "matched_ids" | "matched-ids" => Ok(Self::MatchedIds),
            other => Err(UnknownAnalysisMode(other.to_string())),
        }
    }
}

impl AnalysisResult {
    /// The all-empty result for a mode.
    pub fn empty(mode: AnalysisMode) -> Self {
        match mode {
            AnalysisMode::Profile => AnalysisResult::Profile(ProfileInsights::default()),
            AnalysisMode::Scored => AnalysisResult::Scored(ScoredInsights::default()),
            AnalysisMode::MatchedIds => AnalysisResult::MatchedIds(MatchedJobIds::default()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Ok,
    Degraded,
}

#[derive(Debug, Clone)]
pub struct Analysis {
    pub status: AnalysisStatus,
    /// Why the analysis degraded. `None` when status is `Ok`.
    pub reason: Option<String>,
    pub result: AnalysisResult,
}

pub struct ResumeAnalyzer {
    llm: Arc<dyn ChatCompletion>,
    mode: AnalysisMode,
}

impl ResumeAnalyzer {
    pub fn new(llm: Arc<dyn ChatCompletion>, mode: AnalysisMode) -> Self {
        Self { llm, mode }
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    pub async fn analyze(&self, resume_text: &str, corpus: Option<&[JobRecord]>) -> Analysis {
        let system = self.system_prompt(corpus);
        let resume = truncate_chars(resume_text, MAX_RESUME_CHARS);
        if resume.len() < resume_text.len() {
            debug!(
                "Resume truncated to {MAX_RESUME_CHARS} chars (was {})",
                resume_text.chars().count()
            );
        }

        let content = match self.llm.complete_json(&system, resume).await {
            Ok(content) => content,
            Err(e) => return self.degraded(format!("completion request failed: {e}")),
        };

        let raw: Value = match serde_json::from_str(&content) {
            Ok(raw) => raw,
            Err(e) => return self.degraded(format!("response is not valid JSON: {e}")),
        };
        if !raw.is_object() {
            return self.degraded("response is not a JSON object".to_string());
        }

        let (result, recognized_fields) = match self.mode {
            AnalysisMode::Profile => {
                let n = models::normalize_profile(&raw);
                (AnalysisResult::Profile(n.value), n.recognized_fields)
            }
            AnalysisMode::Scored => {
                let n = models::normalize_scored(&raw);
                (AnalysisResult::Scored(n.value), n.recognized_fields)
            }
            AnalysisMode::MatchedIds => {
                let n = models::normalize_matched_ids(&raw);
                (AnalysisResult::MatchedIds(n.value), n.recognized_fields)
            }
        };

        if recognized_fields == 0 {
            return self.degraded("response matched none of the expected fields".to_string());
        }

        Analysis {
            status: AnalysisStatus::Ok,
            reason: None,
            result,
        }
    }

    fn degraded(&self, reason: String) -> Analysis {
        warn!("Resume analysis degraded: {reason}");
        Analysis {
            status: AnalysisStatus::Degraded,
            reason: Some(reason),
            result: AnalysisResult::empty(self.mode),
        }
    }

    fn system_prompt(&self, corpus: Option<&[JobRecord]>) -> String {
        let instruction = match self.mode {
            AnalysisMode::Profile => PROFILE_INSTRUCTION,
            AnalysisMode::Scored => SCORED_INSTRUCTION,
            AnalysisMode::MatchedIds => MATCHED_IDS_INSTRUCTION,
        };
        let mut prompt = format!("{ANALYST_ROLE}\n\n{instruction}\n\n{JSON_ONLY_SYSTEM}");

        if let Some(jobs) = corpus.filter(|jobs| !jobs.is_empty()) {
            let summary = summarize_corpus(jobs, self.mode);
            prompt.push_str(&format!("\n\n{AVAILABLE_JOBS_HEADING}\n{summary}"));
        }
        prompt
    }
}

/// One line per job, capped at `MAX_CORPUS_SUMMARY_CHARS`. Id-based modes tag every
/// line with a `[job:ID]` token the model must echo back.
fn summarize_corpus(jobs: &[JobRecord], mode: AnalysisMode) -> String {
    let lines: Vec<String> = jobs
        .iter()
        .map(|job| {
            let skills = job.required_skills.join(", ");
            match mode {
                AnalysisMode::Profile => format!("{}: {skills}", job.title),
                AnalysisMode::Scored | AnalysisMode::MatchedIds => format!(
                    "[job:{}] {} | {} | {} | skills: {skills}",
                    job.id,
                    job.title,
                    job.company,
                    job.location.as_deref().unwrap_or("Remote"),
                ),
            }
        })
        .collect();

    truncate_chars(&lines.join("\n"), MAX_CORPUS_SUMMARY_CHARS).to_string()
}

/// Longest prefix of `text` holding at most `max_chars` characters.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Test doubles
// ────────────────────────────────────────────────────────────────────────────
