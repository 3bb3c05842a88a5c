use std::time::Duration;

use anyhow::{Context, Result};

use crate::analysis::AnalysisMode;
use crate::llm_client::OPENROUTER_API_URL;

const DEFAULT_MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub openrouter_api_key: String,
    pub openrouter_api_url: String,
    pub analysis_mode: AnalysisMode,
    pub llm_timeout: Duration,
    pub download_timeout: Duration,
    pub max_resume_bytes: usize,
    pub s3_endpoint: Option<String>,
    pub s3_region: String,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            openrouter_api_key: require_env("OPENROUTER_API_KEY")?,
            openrouter_api_url: optional_env("OPENROUTER_API_URL")
                .unwrap_or_else(|| OPENROUTER_API_URL.to_string()),
            analysis_mode: optional_env("ANALYSIS_MODE")
                .map(|v| v.parse::<AnalysisMode>())
                .transpose()
                .context("ANALYSIS_MODE must be one of: profile, scored, matched_ids")?
                .unwrap_or_default(),
            llm_timeout: Duration::from_secs(parse_env("LLM_TIMEOUT_SECS", 60)?),
            download_timeout: Duration::from_secs(parse_env("DOWNLOAD_TIMEOUT_SECS", 30)?),
            max_resume_bytes: parse_env("MAX_RESUME_BYTES", DEFAULT_MAX_RESUME_BYTES)?,
            s3_endpoint: optional_env("S3_ENDPOINT"),
            s3_region: optional_env("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            aws_access_key_id: optional_env("AWS_ACCESS_KEY_ID"),
            aws_secret_access_key: optional_env("AWS_SECRET_ACCESS_KEY"),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    optional_env(key)
        .with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank variables are treated the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/jobmatch_test".to_string(),
            openrouter_api_key: "test-key".to_string(),
            openrouter_api_url: OPENROUTER_API_URL.to_string(),
            analysis_mode: AnalysisMode::Profile,
            llm_timeout: Duration::from_secs(5),
            download_timeout: Duration::from_secs(5),
            max_resume_bytes: DEFAULT_MAX_RESUME_BYTES,
            s3_endpoint: None,
            s3_region: "us-east-1".to_string(),
            aws_access_key_id: None,
            aws_secret_access_key: None,
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}
