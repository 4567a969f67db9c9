use thiserror::Error;

/// Application-wide error types for Resume Tailor.
///
/// The first five variants are the stage-level kinds surfaced to users.
/// The remaining ones are lower-level causes that a pipeline stage wraps
/// into its own variant before returning.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing/invalid API key or unsupported provider. The pipeline never starts.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The process-wide free tier is used up and no key was supplied.
    #[error(
        "Free trial limit reached ({limit}/{limit}). Please enter your own API key to continue."
    )]
    FreeTierExhausted { limit: u32 },

    /// The uploaded resume could not be read or contained no text.
    #[error("Extraction error: {0}")]
    ExtractionError(String),

    /// Fetching or converting the job posting failed.
    #[error("Scrape error: {0}")]
    ScrapeError(String),

    /// The language-model call failed.
    #[error("Tailor error: {0}")]
    TailorError(String),

    /// HTTP request failed (non-success status, bad URL, unreadable body).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Provider API returned an error.
    #[error("LLM error (HTTP {status_code}): {message}")]
    LlmError { message: String, status_code: u16 },

    /// HTML-to-Markdown conversion failed, or the page failed a content heuristic.
    #[error("Cleaner error: {0}")]
    CleanerError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl AppError {
    /// Short machine-readable kind, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::ConfigError(_) => "config_error",
            AppError::FreeTierExhausted { .. } => "free_tier_exhausted",
            AppError::ExtractionError(_) => "extraction_error",
            AppError::ScrapeError(_) => "scrape_error",
            AppError::TailorError(_) => "tailor_error",
            AppError::HttpError(_) => "http_error",
            AppError::NetworkError(_) => "network_error",
            AppError::Timeout(_) => "timeout",
            AppError::LlmError { .. } => "llm_error",
            AppError::CleanerError(_) => "cleaner_error",
            AppError::SerializationError(_) => "serialization_error",
        }
    }
}
