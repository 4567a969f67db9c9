use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tailor_core::ResumeRecord;

use crate::session::Session;

// ---------------------------------------------------------------------------
// Tailoring
// ---------------------------------------------------------------------------

/// Multipart fields accepted by `POST /v1/tailor`. Documentation only; the
/// handler reads the parts itself.
#[allow(dead_code)]
#[derive(utoipa::ToSchema)]
pub struct TailorForm {
    /// Resume PDF.
    #[schema(value_type = String, format = Binary)]
    pub resume: Vec<u8>,
    pub job_url: String,
    /// google, openai, or anthropic. Defaults to google.
    pub provider: Option<String>,
    /// Leave empty to use the shared free tier.
    pub api_key: Option<String>,
    /// Replace the record of this session instead of creating a new one.
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct TailorResponse {
    pub session_id: Uuid,
    pub record: ResumeRecord,
    /// True when the provider response was unusable and `record` is a placeholder.
    pub degraded: bool,
    pub reason: Option<String>,
    pub free_tier_remaining: u32,
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub provider: String,
    pub record: ResumeRecord,
    pub degraded: bool,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            session_id: session.id,
            provider: session.provider.as_str().to_string(),
            record: session.record,
            degraded: session.fallback_reason.is_some(),
            reason: session.fallback_reason,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

/// Free-text edit: comma-separated skills, or one bullet per line.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct TextUpdateRequest {
    pub text: String,
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub free_tier_used: u32,
    pub free_tier_limit: u32,
    pub sessions: usize,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
