use std::sync::Arc;

use crate::config::Config;
use crate::jobs::corpus::JobCorpus;
use crate::matching::pipeline::MatchPipeline;

/// Shared application state injected into all route handlers via Axum extractors.
/// Everything here is immutable; per-request data lives in the pipeline run.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Job corpus. Default: PgJobCorpus.
    pub corpus: Arc<dyn JobCorpus>,
    pub pipeline: Arc<MatchPipeline>,
}
