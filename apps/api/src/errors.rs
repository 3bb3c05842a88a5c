use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::extraction::ExtractError;
use crate::jobs::corpus::CorpusError;
use crate::matching::download::FetchError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Failed to download resume: {0}")]
    Download(#[from] FetchError),

    #[error("Invalid file: {0}")]
    InvalidFormat(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Text extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("No text found in resume")]
    NoTextFound,

    #[error("Job corpus unavailable: {0}")]
    CorpusUnavailable(#[from] CorpusError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::UnsupportedFormat(kind) => AppError::UnsupportedFormat(kind),
            ExtractError::ExtractionFailed(msg) => AppError::ExtractionFailed(msg),
            ExtractError::NoTextFound => AppError::NoTextFound,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::InvalidFormat(_) => StatusCode::BAD_REQUEST,
            AppError::Download(_) => StatusCode::BAD_GATEWAY,
            AppError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::ExtractionFailed(_) | AppError::NoTextFound => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::CorpusUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short client-facing message. Upstream and internal failures are not echoed verbatim.
    fn public_message(&self) -> String {
        match self {
            AppError::Download(_) => "Failed to download resume".to_string(),
            AppError::CorpusUnavailable(_) => "Job listings are currently unavailable".to_string(),
            AppError::Internal(_) => "An internal server error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!("Request failed ({status}): {self:?}");
        } else {
            tracing::debug!("Request rejected ({status}): {self}");
        }

        let body = ErrorBody {
            error: self.public_message(),
            // Debug builds only; release builds never leak internals.
            details: cfg!(debug_assertions).then(|| format!("{self:?}")),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InvalidFormat("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::UnsupportedFormat("image/png".into()).status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            AppError::NoTextFound.status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Download(FetchError::EmptyBody).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::CorpusUnavailable(CorpusError::Query(sqlx::Error::PoolTimedOut)).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_extract_error_conversion_keeps_kind() {
        let err: AppError = ExtractError::UnsupportedFormat("image/png".into()).into();
        assert!(matches!(err, AppError::UnsupportedFormat(ref k) if k == "image/png"));

        let err: AppError = ExtractError::NoTextFound.into();
        assert!(matches!(err, AppError::NoTextFound));
    }

    #[test]
    fn test_internal_message_is_generic() {
        let err = AppError::Internal(anyhow::anyhow!("secret connection string"));
        assert!(!err.public_message().contains("secret"));
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = AppError::UnsupportedFormat("image/png".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Unsupported file type: image/png");
    }
}
