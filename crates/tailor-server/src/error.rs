use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use tailor_core::AppError;

use crate::dto::ErrorResponse;

/// Everything a handler can fail with.
#[derive(Debug)]
pub enum ApiError {
    App(AppError),
    SessionNotFound(Uuid),
    /// A required form field is missing or empty.
    BadRequest(String),
    /// The multipart body could not be read, including when it hits the body limit.
    Multipart(MultipartError),
    PayloadTooLarge { limit: usize },
    /// PDF or JSON export failed.
    Export(String),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::Multipart(err)
    }
}

impl From<tailor_export::ExportError> for ApiError {
    fn from(err: tailor_export::ExportError) -> Self {
        Self::Export(err.to_string())
    }
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::App(err) => {
                let status = match err {
                    AppError::ConfigError(_) | AppError::SerializationError(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    AppError::FreeTierExhausted { .. } => StatusCode::TOO_MANY_REQUESTS,
                    AppError::ExtractionError(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    AppError::ScrapeError(_)
                    | AppError::TailorError(_)
                    | AppError::HttpError(_)
                    | AppError::NetworkError(_)
                    | AppError::LlmError { .. }
                    | AppError::CleanerError(_) => StatusCode::BAD_GATEWAY,
                    AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                };
                (status, err.kind())
            }
            ApiError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Multipart(err) if err.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large")
            }
            ApiError::Multipart(err) => (err.status(), "bad_request"),
            ApiError::PayloadTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large")
            }
            ApiError::Export(_) => (StatusCode::INTERNAL_SERVER_ERROR, "export_error"),
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::App(err) => err.to_string(),
            ApiError::SessionNotFound(id) => format!("Session {id} not found"),
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Multipart(err) => err.body_text(),
            ApiError::PayloadTooLarge { limit } => {
                format!("Resume exceeds the {limit} byte upload limit")
            }
            ApiError::Export(msg) => format!("Export failed: {msg}"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_kind();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), "{}", self.message());
        }

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.message(),
        };

        (status, axum::Json(body)).into_response()
    }
}
