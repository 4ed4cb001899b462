//! Axum route handlers for generation and results.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::analysis::kinds::OutputKind;
use crate::analysis::pipeline::{run_to_completion, RunReport};
use crate::analysis::store::GenerationResult;
use crate::errors::AppError;
use crate::state::AppState;

const MARKDOWN_CONTENT_TYPE: &str = "text/markdown; charset=utf-8";

/// POST /api/v1/sessions/:id/generate
///
/// Explicit trigger for the full run: matching-analysis → tailored-cv →
/// interview-guide, one call at a time. Responds once all three are done.
pub async fn handle_generate_all(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RunReport>, AppError> {
    generate(&state, id, OutputKind::ALL.to_vec()).await
}

/// POST /api/v1/sessions/:id/generate/:kind
///
/// Regenerates a single output, leaving the other stored results untouched.
pub async fn handle_generate_kind(
    State(state): State<AppState>,
    Path((id, kind)): Path<(Uuid, OutputKind)>,
) -> Result<Json<RunReport>, AppError> {
    generate(&state, id, vec![kind]).await
}

/// GET /api/v1/sessions/:id/results
pub async fn handle_list_results(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<GenerationResult>>, AppError> {
    let handle = state.sessions.get(id).await?;
    let session = handle.lock().await;
    Ok(Json(session.results().iter().cloned().collect()))
}

/// GET /api/v1/sessions/:id/results/:kind
pub async fn handle_get_result(
    State(state): State<AppState>,
    Path((id, kind)): Path<(Uuid, OutputKind)>,
) -> Result<Json<GenerationResult>, AppError> {
    let handle = state.sessions.get(id).await?;
    let session = handle.lock().await;
    session
        .results()
        .get(kind)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No {kind} result for session {id}")))
}

/// GET /api/v1/sessions/:id/results/:kind/download
///
/// Serves the generated Markdown as an attachment with the kind's fixed file name.
pub async fn handle_download_result(
    State(state): State<AppState>,
    Path((id, kind)): Path<(Uuid, OutputKind)>,
) -> Result<impl IntoResponse, AppError> {
    let handle = state.sessions.get(id).await?;
    let session = handle.lock().await;

    let result = session
        .results()
        .get(kind)
        .ok_or_else(|| AppError::NotFound(format!("No {kind} result for session {id}")))?;

    let markdown = result.markdown().ok_or_else(|| {
        AppError::NotFound(format!(
            "The last {kind} generation failed: {}",
            result.failure_reason().unwrap_or("unknown error")
        ))
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, MARKDOWN_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", kind.download_file_name()),
            ),
        ],
        markdown.to_string(),
    ))
}

async fn generate(
    state: &AppState,
    id: Uuid,
    kinds: Vec<OutputKind>,
) -> Result<Json<RunReport>, AppError> {
    let handle = state.sessions.get(id).await?;
    let report = run_to_completion(
        handle,
        state.generator.clone(),
        kinds,
        state.config.generation_timeout,
    )
    .await?;
    Ok(Json(report))
}
