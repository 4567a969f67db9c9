use std::sync::Arc;

use axum::Router;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use tailor_core::editor::{apply_experience_points, apply_project_points, apply_skills_text};
use tailor_core::{AppError, Provider, ResumeRecord, TailorRequest};
use tailor_export::{JSON_FILE_NAME, PDF_FILE_NAME};

use crate::dto::{
    ErrorResponse, HealthResponse, SessionResponse, TailorResponse, TextUpdateRequest,
};
use crate::error::ApiError;
use crate::openapi::ApiDoc;
use crate::session::Session;
use crate::state::AppState;

/// Build the full router with all routes.
pub fn router(state: Arc<AppState>) -> Router {
    // Leave room for the other form fields and multipart framing.
    let upload_limit = state.config.max_upload_bytes.saturating_add(64 * 1024);

    let api = Router::new()
        .route(
            "/v1/tailor",
            post(tailor).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/v1/sessions/{id}",
            get(get_session).put(replace_record).delete(delete_session),
        )
        .route("/v1/sessions/{id}/skills", put(update_skills))
        .route(
            "/v1/sessions/{id}/experience/{index}/points",
            put(update_experience_points),
        )
        .route(
            "/v1/sessions/{id}/projects/{index}/points",
            put(update_project_points),
        )
        .route("/v1/sessions/{id}/export/pdf", get(export_pdf))
        .route("/v1/sessions/{id}/export/json", get(export_json));

    let public = Router::new()
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    public.merge(api).with_state(state)
}

// ---------------------------------------------------------------------------
// Tailor
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/v1/tailor",
    request_body(content = crate::dto::TailorForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Tailored record stored in a new or the given session", body = TailorResponse),
        (status = 400, description = "Bad form or configuration", body = ErrorResponse),
        (status = 404, description = "Unknown session_id", body = ErrorResponse),
        (status = 413, description = "Resume too large", body = ErrorResponse),
        (status = 422, description = "Resume has no extractable text", body = ErrorResponse),
        (status = 429, description = "Free tier used up", body = ErrorResponse),
        (status = 502, description = "Scraping or the provider failed", body = ErrorResponse),
    ),
    tag = "tailor"
)]
pub async fn tailor(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let TailorUpload { request, session_id } =
        read_tailor_form(multipart, state.config.max_upload_bytes).await?;
    let provider = request.provider;

    // Reject an unknown session before any stage runs or the free tier is spent.
    if let Some(id) = session_id {
        find(&state, id)?;
    }

    let result = state.pipeline.tailor(request).await?;
    let session = match session_id {
        Some(id) => state.sessions.replace(id, provider, result),
        None => state.sessions.create(provider, result),
    };
    tracing::info!(session = %session.id, %provider, "Session stored");

    let response = TailorResponse {
        session_id: session.id,
        degraded: session.fallback_reason.is_some(),
        reason: session.fallback_reason,
        record: session.record,
        free_tier_remaining: state.pipeline.free_tier_remaining(),
    };
    Ok(axum::Json(response))
}

struct TailorUpload {
    request: TailorRequest,
    session_id: Option<Uuid>,
}

async fn read_tailor_form(
    mut multipart: Multipart,
    max_upload_bytes: usize,
) -> Result<TailorUpload, ApiError> {
    let mut resume = None;
    let mut job_url = None;
    let mut provider = Provider::Google;
    let mut api_key = None;
    let mut session_id = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "resume" => {
                resume = Some(field.bytes().await?.to_vec());
            }
            "job_url" | "provider" | "api_key" | "session_id" => {
                let value = field.text().await?;
                let trimmed = value.trim();
                match name.as_str() {
                    "job_url" => job_url = Some(trimmed.to_string()),
                    "provider" if !trimmed.is_empty() => provider = trimmed.parse()?,
                    "api_key" => api_key = Some(value),
                    "session_id" if !trimmed.is_empty() => {
                        let id = trimmed.parse::<Uuid>().map_err(|e| {
                            ApiError::BadRequest(format!("Invalid session_id '{trimmed}': {e}"))
                        })?;
                        session_id = Some(id);
                    }
                    _ => {}
                }
            }
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    let resume_pdf = resume
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| ApiError::BadRequest("A resume PDF is required".into()))?;
    if resume_pdf.len() > max_upload_bytes {
        return Err(ApiError::PayloadTooLarge {
            limit: max_upload_bytes,
        });
    }
    let job_url = job_url
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ApiError::BadRequest("A job_url is required".into()))?;

    Ok(TailorUpload {
        request: TailorRequest {
            resume_pdf,
            job_url,
            api_key,
            provider,
        },
        session_id,
    })
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/v1/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session record", body = SessionResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse),
    ),
    tag = "sessions"
)]
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = find(&state, id)?;
    Ok(axum::Json(SessionResponse::from(session)))
}

#[utoipa::path(
    put,
    path = "/v1/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = ResumeRecord,
    responses(
        (status = 200, description = "Record replaced", body = SessionResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse),
    ),
    tag = "sessions"
)]
pub async fn replace_record(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    axum::Json(record): axum::Json<ResumeRecord>,
) -> Result<impl IntoResponse, ApiError> {
    edit(&state, id, |current| {
        *current = record;
        Ok(())
    })
}

#[utoipa::path(
    delete,
    path = "/v1/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 204, description = "Session discarded"),
        (status = 404, description = "Unknown session", body = ErrorResponse),
    ),
    tag = "sessions"
)]
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !state.sessions.remove(id) {
        return Err(ApiError::SessionNotFound(id));
    }
    tracing::info!(session = %id, "Session discarded");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/v1/sessions/{id}/skills",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = TextUpdateRequest,
    responses(
        (status = 200, description = "Skills replaced from comma-separated text", body = SessionResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse),
    ),
    tag = "sessions"
)]
pub async fn update_skills(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    axum::Json(body): axum::Json<TextUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    edit(&state, id, |record| {
        apply_skills_text(record, &body.text);
        Ok(())
    })
}

#[utoipa::path(
    put,
    path = "/v1/sessions/{id}/experience/{index}/points",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        ("index" = usize, Path, description = "Zero-based experience entry"),
    ),
    request_body = TextUpdateRequest,
    responses(
        (status = 200, description = "Bullets replaced, one per line", body = SessionResponse),
        (status = 400, description = "No entry at that index", body = ErrorResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse),
    ),
    tag = "sessions"
)]
pub async fn update_experience_points(
    State(state): State<Arc<AppState>>,
    Path((id, index)): Path<(Uuid, usize)>,
    axum::Json(body): axum::Json<TextUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    edit(&state, id, |record| {
        apply_experience_points(record, index, &body.text)
    })
}

#[utoipa::path(
    put,
    path = "/v1/sessions/{id}/projects/{index}/points",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        ("index" = usize, Path, description = "Zero-based project entry"),
    ),
    request_body = TextUpdateRequest,
    responses(
        (status = 200, description = "Bullets replaced, one per line", body = SessionResponse),
        (status = 400, description = "No entry at that index", body = ErrorResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse),
    ),
    tag = "sessions"
)]
pub async fn update_project_points(
    State(state): State<Arc<AppState>>,
    Path((id, index)): Path<(Uuid, usize)>,
    axum::Json(body): axum::Json<TextUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    edit(&state, id, |record| {
        apply_project_points(record, index, &body.text)
    })
}

fn find(state: &AppState, id: Uuid) -> Result<Session, ApiError> {
    state.sessions.get(id).ok_or(ApiError::SessionNotFound(id))
}

fn edit<F>(state: &AppState, id: Uuid, apply: F) -> Result<axum::Json<SessionResponse>, ApiError>
where
    F: FnOnce(&mut ResumeRecord) -> Result<(), AppError>,
{
    let session = state
        .sessions
        .update(id, apply)?
        .ok_or(ApiError::SessionNotFound(id))?;
    Ok(axum::Json(SessionResponse::from(session)))
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/v1/sessions/{id}/export/pdf",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Rendered resume", body = Vec<u8>, content_type = "application/pdf"),
        (status = 404, description = "Unknown session", body = ErrorResponse),
    ),
    tag = "export"
)]
pub async fn export_pdf(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = find(&state, id)?;
    let pdf = tailor_export::render(&session.record);

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, attachment(PDF_FILE_NAME)),
        ],
        pdf,
    ))
}

#[utoipa::path(
    get,
    path = "/v1/sessions/{id}/export/json",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Pretty-printed record", body = ResumeRecord),
        (status = 404, description = "Unknown session", body = ErrorResponse),
    ),
    tag = "export"
)]
pub async fn export_json(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let session = find(&state, id)?;
    let json = tailor_export::to_pretty_json(&session.record)?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, attachment(JSON_FILE_NAME)),
        ],
        json,
    ))
}

fn attachment(file_name: &str) -> String {
    format!("attachment; filename=\"{file_name}\"")
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    ),
    tag = "system"
)]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        free_tier_used: state.pipeline.free_tier_used(),
        free_tier_limit: state.pipeline.free_tier_limit(),
        sessions: state.sessions.len(),
    };
    (StatusCode::OK, axum::Json(response))
}
