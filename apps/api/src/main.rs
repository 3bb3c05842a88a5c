mod analysis;
mod config;
mod db;
mod errors;
mod extraction;
mod jobs;
mod llm_client;
mod matching;
mod models;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::ResumeAnalyzer;
use crate::config::Config;
use crate::db::create_pool;
use crate::extraction::DocumentExtractor;
use crate::jobs::corpus::PgJobCorpus;
use crate::llm_client::LlmClient;
use crate::matching::download::ResumeFetcher;
use crate::matching::pipeline::MatchPipeline;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Fails fast on missing DATABASE_URL / OPENROUTER_API_KEY
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting JobMatch API v{}", env!("CARGO_PKG_VERSION"));

    // Job corpus
    let db = create_pool(&config.database_url).await?;
    let corpus = Arc::new(PgJobCorpus::new(db));

    // Blob storage, only for s3:// resume references
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized");

    // LLM client
    let llm = Arc::new(
        LlmClient::new(config.openrouter_api_key.clone(), config.llm_timeout)?
            .with_endpoint(config.openrouter_api_url.clone()),
    );
    info!(
        "LLM client initialized (model: {}, mode: {:?})",
        llm_client::MODEL,
        config.analysis_mode
    );

    let fetcher = ResumeFetcher::new(config.download_timeout, config.max_resume_bytes, Some(s3))?;
    let analyzer = ResumeAnalyzer::new(llm, config.analysis_mode);
    let pipeline = MatchPipeline::new(
        fetcher,
        Arc::new(DocumentExtractor::default()),
        corpus.clone(),
        analyzer,
    );

    let state = AppState {
        config: config.clone(),
        corpus,
        pipeline: Arc::new(pipeline),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// S3 client for AWS, or for MinIO when S3_ENDPOINT is set.
/// Static credentials are used when both keys are present; otherwise the default chain.
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.s3_region.clone()));

    if let (Some(key_id), Some(secret)) = (&config.aws_access_key_id, &config.aws_secret_access_key) {
        loader = loader.credentials_provider(Credentials::new(
            key_id,
            secret,
            None,
            None,
            "jobmatch-static",
        ));
    }
    if let Some(endpoint) = &config.s3_endpoint {
        loader = loader.endpoint_url(endpoint);
    }

    let shared = loader.load().await;
    let s3_config = aws_sdk_s3::config::Builder::from(&shared)
        .force_path_style(config.s3_endpoint.is_some())
        .build();
    aws_sdk_s3::Client::from_conf(s3_config)
}
