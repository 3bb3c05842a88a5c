//! Pipeline Orchestrator: one resume in, ranked jobs out.
//!
//! Stages run strictly in order:
//! receive → download → validate → extract → fetch corpus → analyze → rank → respond.
//! Everything before analysis is fatal to the request. Analysis degrades instead of
//! failing, and an empty ranking is a successful response with no jobs.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::analysis::{AnalysisResult, AnalysisStatus, ResumeAnalyzer};
use crate::errors::AppError;
use crate::extraction::{has_pdf_signature, DocumentExtractor, DocumentKind, ResumeDocument};
use crate::jobs::corpus::JobCorpus;
use crate::matching::download::{ResumeFetcher, ResumeReference};
use crate::matching::ranker::{MatchRanker, RankError, RankedJob};

/// What the client sent: the file itself, or where to download it from.
#[derive(Debug)]
pub enum ResumeInput {
    Upload(ResumeDocument),
    Reference(String),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub total_jobs: usize,
    pub top_relevance: u32,
    pub extracted_text_length: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResponse {
    pub jobs: Vec<RankedJob>,
    pub ai_insights: AnalysisResult,
    pub analysis_status: AnalysisStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_note: Option<String>,
    pub summary: MatchSummary,
}

pub struct MatchPipeline {
    fetcher: ResumeFetcher,
    extractor: Arc<DocumentExtractor>,
    corpus: Arc<dyn JobCorpus>,
    analyzer: ResumeAnalyzer,
    ranker: MatchRanker,
}

impl MatchPipeline {
    pub fn new(
        fetcher: ResumeFetcher,
        extractor: Arc<DocumentExtractor>,
        corpus: Arc<dyn JobCorpus>,
        analyzer: ResumeAnalyzer,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            ranker: MatchRanker::new(corpus.clone()),
            corpus,
            analyzer,
        }
    }

    pub async fn run(&self, input: ResumeInput) -> Result<MatchResponse, AppError> {
        let span = info_span!("process_resume", request_id = %Uuid::new_v4());
        self.process(input).instrument(span).await
    }

    async fn process(&self, input: ResumeInput) -> Result<MatchResponse, AppError> {
        let document = match input {
            ResumeInput::Upload(document) => {
                info!("Processing uploaded resume ({} bytes)", document.bytes.len());
                document
            }
            ResumeInput::Reference(raw) => {
                let reference = ResumeReference::parse(&raw)?;
                info!("Downloading resume from {}", reference.redacted());
                self.fetcher.fetch(&reference).await?
            }
        };

        validate(&document)?;

        let extractor = self.extractor.clone();
        let text = tokio::task::spawn_blocking(move || extractor.extract(&document))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("extraction task failed: {e}")))??;
        debug!("Extracted {} characters", text.char_len());

        let corpus = self.corpus.list_all().await?;
        debug!("Corpus holds {} jobs", corpus.len());

        let analysis = self
            .analyzer
            .analyze(text.as_str(), Some(corpus.as_slice()))
            .await;

        let jobs = match self.ranker.rank(&analysis.result).await {
            Ok(jobs) => jobs,
            Err(RankError::NoMatches) => {
                info!("No matching jobs");
                vec![]
            }
            Err(RankError::Corpus(e)) => return Err(e.into()),
        };

        let summary = MatchSummary {
            total_jobs: jobs.len(),
            top_relevance: jobs.first().map(|j| j.relevance).unwrap_or(0),
            extracted_text_length: text.char_len(),
        };
        info!(
            "Resume processed: {} jobs, top relevance {}, {:?} analysis {:?}",
            summary.total_jobs,
            summary.top_relevance,
            self.analyzer.mode(),
            analysis.status
        );

        Ok(MatchResponse {
            jobs,
            ai_insights: analysis.result,
            analysis_status: analysis.status,
            analysis_note: analysis.reason,
            summary,
        })
    }
}

/// Cheap rejection before any parsing: empty files, and PDFs without the `%PDF` magic.
fn validate(document: &ResumeDocument) -> Result<(), AppError> {
    if document.bytes.is_empty() {
        return Err(AppError::BadRequest("Resume file is empty".to_string()));
    }
    if matches!(document.kind(), Ok(DocumentKind::Pdf)) && !has_pdf_signature(&document.bytes) {
        return Err(AppError::InvalidFormat("Invalid PDF file.".to_string()));
    }
    Ok(())
}

#[cfg(test)]
pub mod testing {
    use std::time::Duration;

    use super::*;
    use crate::analysis::testing::StubCompletion;
    use crate::analysis::AnalysisMode;

    pub fn pipeline(
        corpus: Arc<dyn JobCorpus>,
        llm: Arc<StubCompletion>,
        mode: AnalysisMode,
        extractor: DocumentExtractor,
    ) -> MatchPipeline {
        MatchPipeline::new(
            ResumeFetcher::new(Duration::from_secs(5), 1024 * 1024, None).unwrap(),
            Arc::new(extractor),
            corpus,
            ResumeAnalyzer::new(llm, mode),
        )
    }
}
