use std::future::Future;
use std::path::Path;

use crate::error::AppError;
use crate::provider::Provider;

/// Turns a PDF on disk into plain text.
///
/// Failures are logged by the implementation and reported as `None`.
pub trait ResumeExtractor: Send + Sync + Clone {
    fn extract(&self, path: &Path) -> impl Future<Output = Option<String>> + Send;
}

/// Fetches raw HTML content from a URL.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// Converts raw HTML into clean Markdown text.
pub trait Cleaner: Send + Sync + Clone {
    fn clean(&self, html: &str) -> Result<String, AppError>;
}

/// Fetches a job posting and returns its readable text.
pub trait JobScraper: Send + Sync + Clone {
    fn scrape(&self, url: &str) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// The single capability every provider client offers: one completion for
/// a system prompt plus the resume and job texts.
pub trait Completer: Send + Sync + Clone {
    fn complete(
        &self,
        system_prompt: &str,
        resume_text: &str,
        job_text: &str,
    ) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// Builds a provider client for a request.
///
/// Each request may pick a different provider and key, so the orchestrator
/// holds a factory rather than a client.
pub trait CompleterFactory: Send + Sync + Clone {
    type Completer: Completer;

    fn create(&self, provider: Provider, api_key: &str) -> Result<Self::Completer, AppError>;
}
