//! Axum route handler for resume processing.

use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::header::CONTENT_TYPE,
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::extraction::ResumeDocument;
use crate::matching::pipeline::{MatchResponse, ResumeInput};
use crate::state::AppState;

/// Multipart field carrying a previously uploaded file's URL.
const URL_FIELD: &str = "resumeUrl";
/// Multipart field carrying the resume file itself.
const FILE_FIELD: &str = "resume";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResumeRequest {
    pub resume_url: Option<String>,
}

/// POST /api/v1/resumes/process
///
/// Accepts `{"resumeUrl": "..."}` as JSON, or multipart with either a `resumeUrl`
/// field or a `resume` file. Returns ranked jobs plus the AI insights.
pub async fn handle_process_resume(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<MatchResponse>, AppError> {
    let input = read_input(&state, request).await?;
    let response = state.pipeline.run(input).await?;
    Ok(Json(response))
}

async fn read_input(state: &AppState, request: Request) -> Result<ResumeInput, AppError> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    if is_multipart {
        let multipart = Multipart::from_request(request, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        read_multipart(multipart).await
    } else {
        let Json(body) = Json::<ProcessResumeRequest>::from_request(request, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        select_input(body.resume_url, None)
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<ResumeInput, AppError> {
    let mut resume_url = None;
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().map(String::from);
        match name.as_deref() {
            Some(URL_FIELD) => {
                resume_url = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.body_text()))?,
                );
            }
            Some(FILE_FIELD) => {
                let filename = field.file_name().map(String::from);
                let content_type = field.content_type().map(String::from);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                upload = Some(ResumeDocument {
                    bytes,
                    content_type,
                    filename,
                });
            }
            _ => {}
        }
    }

    select_input(resume_url, upload)
}

/// Exactly one of a reference URL or an uploaded file must be present.
fn select_input(
    resume_url: Option<String>,
    upload: Option<ResumeDocument>,
) -> Result<ResumeInput, AppError> {
    let resume_url = resume_url.filter(|u| !u.trim().is_empty());
    match (resume_url, upload) {
        (Some(url), None) => Ok(ResumeInput::Reference(url)),
        (None, Some(document)) => Ok(ResumeInput::Upload(document)),
        (Some(_), Some(_)) => Err(AppError::BadRequest(
            "Provide either resumeUrl or a resume file, not both".to_string(),
        )),
        (None, None) => Err(AppError::BadRequest(
            "No resume URL or file provided".to_string(),
        )),
    }
}
