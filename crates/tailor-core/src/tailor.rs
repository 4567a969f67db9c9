use crate::error::AppError;
use crate::models::TailoredResume;
use crate::normalize::{normalize_response, strip_code_fence};
use crate::prompts::{TAILOR_JSON_SYSTEM_PROMPT, TAILOR_MARKDOWN_SYSTEM_PROMPT};
use crate::traits::Completer;

/// Sends resume and job text to a provider and normalizes the answer.
#[derive(Clone)]
pub struct ResumeTailor<C: Completer> {
    completer: C,
}

impl<C: Completer> ResumeTailor<C> {
    pub fn new(completer: C) -> Self {
        Self { completer }
    }

    /// Structured variant. Provider failures are errors; unparseable output
    /// is a degraded success.
    pub async fn tailor(
        &self,
        resume_text: &str,
        job_description: &str,
    ) -> Result<TailoredResume, AppError> {
        let response = self
            .completer
            .complete(TAILOR_JSON_SYSTEM_PROMPT, resume_text, job_description)
            .await?;
        tracing::info!("Received {} chars from provider", response.chars().count());

        Ok(normalize_response(&response))
    }

    /// Raw Markdown variant, skipping structured extraction.
    pub async fn tailor_markdown(
        &self,
        resume_text: &str,
        job_description: &str,
    ) -> Result<String, AppError> {
        let response = self
            .completer
            .complete(TAILOR_MARKDOWN_SYSTEM_PROMPT, resume_text, job_description)
            .await?;

        let markdown = strip_code_fence(&response, "markdown");
        if markdown.is_empty() {
            return Err(AppError::LlmError {
                message: "Empty response from LLM".into(),
                status_code: 200,
            });
        }
        Ok(markdown.to_string())
    }
}
