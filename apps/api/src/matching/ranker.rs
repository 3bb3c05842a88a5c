//! Match Ranker: turns analyzer output into an ordered list of jobs.
//!
//! Two policies, chosen by the analysis variant:
//! - heuristic: corpus search by suggested titles/skills, then
//!   +30 for a title hit and +10 per overlapping skill, capped at 100
//! - id-based: fetch exactly the ids the model picked, carrying its scores
//!
//! Both sort descending by relevance with a stable sort, so ties keep corpus order.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::analysis::AnalysisResult;
use crate::jobs::corpus::{CorpusError, JobCorpus};
use crate::models::job::JobRecord;

pub const TITLE_MATCH_POINTS: u32 = 30;
pub const SKILL_MATCH_POINTS: u32 = 10;
pub const MAX_RELEVANCE: u32 = 100;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedJob {
    #[serde(flatten)]
    pub job: JobRecord,
    pub relevance: u32,
    pub matched_skills: Vec<String>,
}

#[derive(Debug, Error)]
pub enum RankError {
    #[error("no matching jobs")]
    NoMatches,

    #[error(transparent)]
    Corpus(#[from] CorpusError),
}

/// A model-selected job id with whatever score the model attached.
struct IdMatch {
    job_id: String,
    score: u32,
    matching_skills: Vec<String>,
}

pub struct MatchRanker {
    corpus: Arc<dyn JobCorpus>,
}

impl MatchRanker {
    pub fn new(corpus: Arc<dyn JobCorpus>) -> Self {
        Self { corpus }
    }

    pub async fn rank(&self, analysis: &AnalysisResult) -> Result<Vec<RankedJob>, RankError> {
        match analysis {
            AnalysisResult::Profile(profile) => {
                self.rank_heuristic(&profile.titles, &profile.skills).await
            }
            AnalysisResult::Scored(scored) if scored.best_matches.is_empty() => {
                self.rank_heuristic(&scored.titles, &scored.skills).await
            }
            AnalysisResult::Scored(scored) => {
                let matches = scored
                    .best_matches
                    .iter()
                    .map(|m| IdMatch {
                        job_id: m.job_id.clone(),
                        score: m.match_score.min(MAX_RELEVANCE),
                        matching_skills: m.matching_skills.clone(),
                    })
                    .collect();
                self.rank_by_ids(matches).await
            }
            AnalysisResult::MatchedIds(ids) => {
                let matches = ids
                    .matched_job_ids
                    .iter()
                    .map(|id| IdMatch {
                        job_id: id.clone(),
                        score: 0,
                        matching_skills: vec![],
                    })
                    .collect();
                self.rank_by_ids(matches).await
            }
        }
    }

    async fn rank_heuristic(
        &self,
        titles: &[String],
        skills: &[String],
    ) -> Result<Vec<RankedJob>, RankError> {
        let titles = non_blank(titles);
        let skills = non_blank(skills);
        if titles.is_empty() && skills.is_empty() {
            return Err(RankError::NoMatches);
        }

        let candidates = self.corpus.search(&titles, &skills).await?;
        debug!("Heuristic ranking over {} candidate jobs", candidates.len());

        let criteria = HeuristicCriteria::new(&titles, &skills);
        let mut ranked: Vec<RankedJob> = candidates
            .into_iter()
            .map(|job| {
                let (relevance, matched_skills) = criteria.score(&job);
                RankedJob {
                    job,
                    relevance,
                    matched_skills,
                }
            })
            .collect();

        if ranked.is_empty() {
            return Err(RankError::NoMatches);
        }
        sort_by_relevance(&mut ranked);
        Ok(ranked)
    }

    async fn rank_by_ids(&self, matches: Vec<IdMatch>) -> Result<Vec<RankedJob>, RankError> {
        let mut seen = HashSet::new();
        let matches: Vec<IdMatch> = matches
            .into_iter()
            .map(|mut m| {
                m.job_id = m.job_id.trim().to_string();
                m
            })
            .filter(|m| !m.job_id.is_empty() && seen.insert(m.job_id.clone()))
            .collect();
        if matches.is_empty() {
            return Err(RankError::NoMatches);
        }

        let ids: Vec<String> = matches.iter().map(|m| m.job_id.clone()).collect();
        let jobs = self.corpus.list_by_ids(&ids).await?;
        debug!("{} of {} model-selected ids resolved", jobs.len(), ids.len());
        if jobs.is_empty() {
            return Err(RankError::NoMatches);
        }

        let by_id: HashMap<&str, &IdMatch> = matches.iter().map(|m| (m.job_id.as_str(), m)).collect();
        let mut ranked: Vec<RankedJob> = jobs
            .into_iter()
            .map(|job| {
                let found = by_id.get(job.id.as_str());
                RankedJob {
                    relevance: found.map(|m| m.score).unwrap_or(0),
                    matched_skills: found.map(|m| m.matching_skills.clone()).unwrap_or_default(),
                    job,
                }
            })
            .collect();

        sort_by_relevance(&mut ranked);
        Ok(ranked)
    }
}

/// Lowercased suggestion sets used to score a single job.
struct HeuristicCriteria {
    titles: Vec<String>,
    skills: HashSet<String>,
}

impl HeuristicCriteria {
    fn new(titles: &[String], skills: &[String]) -> Self {
        Self {
            titles: titles.iter().map(|t| t.to_lowercase()).collect(),
            skills: skills.iter().map(|s| s.to_lowercase()).collect(),
        }
    }

    /// Relevance and the job's skills that overlap the suggestions (each counted once).
    fn score(&self, job: &JobRecord) -> (u32, Vec<String>) {
        let job_title = job.title.to_lowercase();
        let title_hit = self.titles.iter().any(|t| job_title.contains(t.as_str()));

        let mut counted = HashSet::new();
        let matched_skills: Vec<String> = job
            .required_skills
            .iter()
            .filter(|skill| {
                let lower = skill.trim().to_lowercase();
                self.skills.contains(&lower) && counted.insert(lower)
            })
            .cloned()
            .collect();

        let title_points = if title_hit { TITLE_MATCH_POINTS } else { 0 };
        let skill_points = SKILL_MATCH_POINTS.saturating_mul(matched_skills.len() as u32);
        let relevance = title_points.saturating_add(skill_points).min(MAX_RELEVANCE);
        (relevance, matched_skills)
    }
}

fn non_blank(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect()
}

/// `sort_by` is stable: equal relevance keeps corpus order.
fn sort_by_relevance(jobs: &mut [RankedJob]) {
    jobs.sort_by(|a, b| b.relevance.cmp(&a.relevance));
}
