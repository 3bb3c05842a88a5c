//! Resume download: resolves a resume reference to bytes.
//!
//! `http(s)://` references are fetched with reqwest; `s3://bucket/key` references
//! are read from blob storage. Both are bounded by the download timeout and the
//! maximum resume size.

use std::time::Duration;

use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client as S3Client;
use bytes::BytesMut;
use reqwest::{header::CONTENT_TYPE, Client, Url};
use thiserror::Error;
use tracing::debug;

use crate::errors::AppError;
use crate::extraction::ResumeDocument;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("upstream returned HTTP {0}")]
    Status(u16),

    #[error("downloaded file is empty")]
    EmptyBody,

    #[error("file exceeds the {limit} byte limit")]
    TooLarge { limit: usize },

    #[error("download timed out")]
    Timeout,

    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            // Presigned URLs carry credentials in the query string.
            FetchError::Http(err.without_url())
        }
    }
}

/// A parsed, fetchable resume location.
#[derive(Debug, Clone, PartialEq)]
pub enum ResumeReference {
    Http(Url),
    S3 { bucket: String, key: String },
}

impl ResumeReference {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let url = Url::parse(raw.trim())
            .map_err(|e| AppError::BadRequest(format!("resumeUrl is not a valid URL: {e}")))?;

        match url.scheme() {
            "http" | "https" => Ok(ResumeReference::Http(url)),
            "s3" => {
                let bucket = url.host_str().unwrap_or_default().to_string();
                let key = url.path().trim_start_matches('/').to_string();
                if bucket.is_empty() || key.is_empty() {
                    return Err(AppError::BadRequest(
                        "s3 references must look like s3://bucket/key".to_string(),
                    ));
                }
                Ok(ResumeReference::S3 { bucket, key })
            }
            other => Err(AppError::BadRequest(format!(
                "Unsupported resumeUrl scheme '{other}'"
            ))),
        }
    }

    /// Loggable form: scheme and host (or bucket) only.
    pub fn redacted(&self) -> String {
        match self {
            ResumeReference::Http(url) => {
                format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default())
            }
            ResumeReference::S3 { bucket, .. } => format!("s3://{bucket}"),
        }
    }
}

#[derive(Clone)]
pub struct ResumeFetcher {
    http: Client,
    s3: Option<S3Client>,
    timeout: Duration,
    max_bytes: usize,
}

impl ResumeFetcher {
    pub fn new(timeout: Duration, max_bytes: usize, s3: Option<S3Client>) -> Result<Self, FetchError> {
        Ok(Self {
            http: Client::builder().timeout(timeout).build()?,
            s3,
            timeout,
            max_bytes,
        })
    }

    pub async fn fetch(&self, reference: &ResumeReference) -> Result<ResumeDocument, FetchError> {
        let document = match reference {
            ResumeReference::Http(url) => self.fetch_http(url).await?,
            ResumeReference::S3 { bucket, key } => self.fetch_s3(bucket, key).await?,
        };

        if document.bytes.is_empty() {
            return Err(FetchError::EmptyBody);
        }
        debug!(
            "Downloaded resume: {} bytes, content-type {:?}",
            document.bytes.len(),
            document.content_type
        );
        Ok(document)
    }

    async fn fetch_http(&self, url: &Url) -> Result<ResumeDocument, FetchError> {
        let mut response = self.http.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        if response.content_length().is_some_and(|len| len as usize > self.max_bytes) {
            return Err(FetchError::TooLarge {
                limit: self.max_bytes,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let mut buffer = BytesMut::new();
        while let Some(chunk) = response.chunk().await? {
            if buffer.len() + chunk.len() > self.max_bytes {
                return Err(FetchError::TooLarge {
                    limit: self.max_bytes,
                });
            }
            buffer.extend_from_slice(&chunk);
        }

        Ok(ResumeDocument {
            bytes: buffer.freeze(),
            content_type,
            filename: url
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .filter(|s| !s.is_empty())
                .map(String::from),
        })
    }

    async fn fetch_s3(&self, bucket: &str, key: &str) -> Result<ResumeDocument, FetchError> {
        let s3 = self
            .s3
            .as_ref()
            .ok_or_else(|| FetchError::Storage("blob storage is not configured".to_string()))?;

        let download = async {
            let output = s3
                .get_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| FetchError::Storage(DisplayErrorContext(&e).to_string()))?;

            if output
                .content_length()
                .is_some_and(|len| len > 0 && len as usize > self.max_bytes)
            {
                return Err(FetchError::TooLarge {
                    limit: self.max_bytes,
                });
            }
            let content_type = output.content_type().map(String::from);
            let bytes = output
                .body
                .collect()
                .await
                .map_err(|e| FetchError::Storage(e.to_string()))?
                .into_bytes();
            if bytes.len() > self.max_bytes {
                return Err(FetchError::TooLarge {
                    limit: self.max_bytes,
                });
            }

            Ok::<_, FetchError>(ResumeDocument {
                bytes,
                content_type,
                filename: key.rsplit('/').next().map(String::from),
            })
        };

        tokio::time::timeout(self.timeout, download)
            .await
            .map_err(|_| FetchError::Timeout)?
    }
}
