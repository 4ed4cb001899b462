//! Axum route handlers for session lifecycle and inputs.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::store::GenerationResult;
use crate::errors::AppError;
use crate::extraction::{extract_off_runtime, Document, DocumentKind};
use crate::llm_client::ApiKey;
use crate::session::machine::{InputSlot, InputSource, InputSummary, InputText, Phase, Session};
use crate::session::registry::SessionHandle;
use crate::state::AppState;

const FILE_FIELD: &str = "file";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Deliberately not `Debug`: the key must never reach a log line.
#[derive(Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub phase: Phase,
}

#[derive(Debug, Deserialize)]
pub struct JobDescriptionText {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct InputResponse {
    pub slot: InputSlot,
    pub input: InputSummary,
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub phase: Phase,
    pub created_at: DateTime<Utc>,
    pub resume: Option<InputSummary>,
    pub job_description: Option<InputSummary>,
    pub missing_inputs: Vec<&'static str>,
    pub results: Vec<GenerationResult>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id(),
            phase: session.phase(),
            created_at: session.created_at(),
            resume: session.input(InputSlot::Resume).map(InputText::summary),
            job_description: session
                .input(InputSlot::JobDescription)
                .map(InputText::summary),
            missing_inputs: session.missing_inputs(),
            results: session.results().iter().cloned().collect(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
///
/// Opens a session bound to the caller's API key. Without a key nothing else
/// is possible. With VERIFY_CREDENTIALS the key is checked with the provider first.
pub async fn handle_create_session(
    State(state): State<AppState>,
    payload: Option<Json<CreateSessionRequest>>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), AppError> {
    let credential = payload
        .and_then(|Json(req)| req.api_key)
        .and_then(|raw| ApiKey::parse(&raw))
        .ok_or(AppError::MissingCredential)?;

    if state.config.verify_credentials {
        state
            .generator
            .verify_credential(&credential)
            .await
            .map_err(|e| {
                if e.is_credential_rejection() {
                    AppError::InvalidCredential(e.to_string())
                } else {
                    AppError::Llm(format!("Credential check failed: {e}"))
                }
            })?;
    }

    let (session_id, handle) = state.sessions.create(credential).await;
    let phase = handle.lock().await.phase();

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse { session_id, phase }),
    ))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let session = handle.lock().await;
    Ok(Json(SessionView::from(&*session)))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/sessions/:id/documents/:slot
///
/// Multipart upload with a single `file` field, PDF or plain text.
/// Extraction failures are reported and leave the slot unchanged.
pub async fn handle_upload_document(
    State(state): State<AppState>,
    Path((id, slot)): Path<(Uuid, InputSlot)>,
    mut multipart: Multipart,
) -> Result<Json<InputResponse>, AppError> {
    let handle = state.sessions.get(id).await?;
    let document = read_document(&mut multipart).await?;

    let kind = document.kind;
    let file_name = document.file_name.clone();
    let byte_len = document.bytes.len();

    let text = extract_off_runtime(document).await.map_err(|e| {
        warn!("Session {id}: {} extraction failed: {e}", slot.label());
        AppError::from(e)
    })?;

    info!(
        "Session {id}: {} extracted from {kind:?} upload ({byte_len} bytes → {} chars)",
        slot.label(),
        text.chars().count()
    );

    let input = InputText::new(InputSource::Upload { file_name, kind }, text);
    store_input(&handle, id, slot, input).await
}

/// PUT /api/v1/sessions/:id/job-description
///
/// Free-text alternative to uploading the job description.
pub async fn handle_set_job_description(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<JobDescriptionText>,
) -> Result<Json<InputResponse>, AppError> {
    let handle = state.sessions.get(id).await?;
    let input = InputText::new(InputSource::FreeText, req.text);
    store_input(&handle, id, InputSlot::JobDescription, input).await
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn store_input(
    handle: &SessionHandle,
    id: Uuid,
    slot: InputSlot,
    input: InputText,
) -> Result<Json<InputResponse>, AppError> {
    let summary = input.summary();
    let warning = (!summary.usable).then(|| {
        warn!("Session {id}: {} has no usable text", slot.label());
        format!(
            "No text could be extracted from the {}. \
             It will be treated as missing until a new one is supplied.",
            slot.label()
        )
    });

    let phase = handle.lock().await.set_input(slot, input)?;

    Ok(Json(InputResponse {
        slot,
        input: summary,
        phase,
        warning,
    }))
}

async fn read_document(multipart: &mut Multipart) -> Result<Document, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field.bytes().await.map_err(multipart_error)?;

        let kind = DocumentKind::detect(file_name.as_deref(), content_type.as_deref(), &bytes)?;
        return Ok(Document::new(kind, file_name, bytes));
    }

    Err(AppError::Validation(format!(
        "multipart body has no '{FILE_FIELD}' field"
    )))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(format!("Invalid multipart body: {}", e.body_text()))
    }
}
