//! Stand-ins for every pipeline collaborator, plus a recording reporter.
//!
//! Clones share their recorded calls, so a test can keep one handle and
//! hand another to the orchestrator.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::AppError;
use crate::pipeline::{PipelineEvent, PipelineReporter};
use crate::provider::Provider;
use crate::traits::{Cleaner, Completer, CompleterFactory, Fetcher, JobScraper, ResumeExtractor};

// ---------------------------------------------------------------------------
// MockExtractor
// ---------------------------------------------------------------------------

/// Records each path it is given with the file's bytes at that moment
/// (`None` if it could not be read), and returns a fixed text.
#[derive(Clone)]
pub struct MockExtractor {
    text: Option<String>,
    pub seen: Arc<Mutex<Vec<(PathBuf, Option<Vec<u8>>)>>>,
}

impl MockExtractor {
    pub fn new(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Simulates an unreadable PDF.
    pub fn failing() -> Self {
        Self {
            text: None,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn call_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn last_path(&self) -> Option<PathBuf> {
        self.seen.lock().unwrap().last().map(|(p, _)| p.clone())
    }
}

impl ResumeExtractor for MockExtractor {
    async fn extract(&self, path: &Path) -> Option<String> {
        self.seen
            .lock()
            .unwrap()
            .push((path.to_path_buf(), std::fs::read(path).ok()));
        self.text.clone()
    }
}

// ---------------------------------------------------------------------------
// MockFetcher / MockCleaner
// ---------------------------------------------------------------------------

/// Serves queued pages in order, then a stub page once the queue is empty.
#[derive(Clone)]
pub struct MockFetcher {
    pages: Arc<Mutex<VecDeque<Result<String, AppError>>>>,
    pub urls: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new(html: &str) -> Self {
        Self::queued(vec![Ok(html.to_string())])
    }

    pub fn with_error(error: AppError) -> Self {
        Self::queued(vec![Err(error)])
    }

    pub fn queued(pages: Vec<Result<String, AppError>>) -> Self {
        Self {
            pages: Arc::new(Mutex::new(pages.into())),
            urls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        self.urls.lock().unwrap().push(url.to_string());
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("<html><body><p>stub posting</p></body></html>".to_string()))
    }
}

/// Cleaner that hands HTML back untouched, unless armed with an error for
/// its next call.
#[derive(Clone, Default)]
pub struct MockCleaner {
    next_error: Arc<Mutex<Option<AppError>>>,
}

impl MockCleaner {
    pub fn passthrough() -> Self {
        Self::default()
    }

    pub fn with_error(error: AppError) -> Self {
        let cleaner = Self::default();
        *cleaner.next_error.lock().unwrap() = Some(error);
        cleaner
    }
}

impl Cleaner for MockCleaner {
    fn clean(&self, html: &str) -> Result<String, AppError> {
        match self.next_error.lock().unwrap().take() {
            Some(e) => Err(e),
            None => Ok(html.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// MockScraper
// ---------------------------------------------------------------------------

/// Mock job scraper that records requested URLs.
#[derive(Clone)]
pub struct MockScraper {
    response: Arc<Mutex<Option<Result<String, AppError>>>>,
    pub urls: Arc<Mutex<Vec<String>>>,
}

impl MockScraper {
    pub fn new(text: &str) -> Self {
        Self {
            response: Arc::new(Mutex::new(Some(Ok(text.to_string())))),
            urls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_error(error: AppError) -> Self {
        Self {
            response: Arc::new(Mutex::new(Some(Err(error)))),
            urls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn call_count(&self) -> usize {
        self.urls.lock().unwrap().len()
    }
}

impl JobScraper for MockScraper {
    async fn scrape(&self, url: &str) -> Result<String, AppError> {
        self.urls.lock().unwrap().push(url.to_string());
        // An error is returned once; later calls get a default text.
        let mut response = self.response.lock().unwrap();
        if let Some(Ok(text)) = response.as_ref() {
            return Ok(text.clone());
        }
        match response.take() {
            Some(Err(e)) => Err(e),
            _ => Ok("default job".to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// MockCompleter / MockCompleterFactory
// ---------------------------------------------------------------------------

/// One recorded `complete` call.
#[derive(Debug, Clone)]
pub struct CompletionCall {
    pub system_prompt: String,
    pub resume_text: String,
    pub job_text: String,
}

/// Mock provider client returning a fixed completion.
#[derive(Clone)]
pub struct MockCompleter {
    response: Arc<Mutex<Option<Result<String, AppError>>>>,
    pub calls: Arc<Mutex<Vec<CompletionCall>>>,
}

impl MockCompleter {
    pub fn new(completion: &str) -> Self {
        Self {
            response: Arc::new(Mutex::new(Some(Ok(completion.to_string())))),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_error(error: AppError) -> Self {
        Self {
            response: Arc::new(Mutex::new(Some(Err(error)))),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Completer for MockCompleter {
    async fn complete(
        &self,
        system_prompt: &str,
        resume_text: &str,
        job_text: &str,
    ) -> Result<String, AppError> {
        self.calls.lock().unwrap().push(CompletionCall {
            system_prompt: system_prompt.to_string(),
            resume_text: resume_text.to_string(),
            job_text: job_text.to_string(),
        });

        let mut response = self.response.lock().unwrap();
        if let Some(Ok(text)) = response.as_ref() {
            return Ok(text.clone());
        }
        match response.take() {
            Some(Err(e)) => Err(e),
            _ => Ok("{}".to_string()),
        }
    }
}

/// Mock factory handing out clones of one shared `MockCompleter`.
#[derive(Clone)]
pub struct MockCompleterFactory {
    pub completer: MockCompleter,
    create_error: Arc<Mutex<Option<AppError>>>,
    /// (provider, api_key) for every `create` call.
    pub created: Arc<Mutex<Vec<(Provider, String)>>>,
}

impl MockCompleterFactory {
    pub fn new(completion: &str) -> Self {
        Self::with_completer(MockCompleter::new(completion))
    }

    pub fn with_completer(completer: MockCompleter) -> Self {
        Self {
            completer,
            create_error: Arc::new(Mutex::new(None)),
            created: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_create_error(error: AppError) -> Self {
        Self {
            completer: MockCompleter::new("{}"),
            create_error: Arc::new(Mutex::new(Some(error))),
            created: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl CompleterFactory for MockCompleterFactory {
    type Completer = MockCompleter;

    fn create(&self, provider: Provider, api_key: &str) -> Result<MockCompleter, AppError> {
        if let Some(e) = self.create_error.lock().unwrap().take() {
            return Err(e);
        }
        self.created
            .lock()
            .unwrap()
            .push((provider, api_key.to_string()));
        Ok(self.completer.clone())
    }
}

// ---------------------------------------------------------------------------
// RecordingReporter
// ---------------------------------------------------------------------------

/// Reporter that records event labels in order.
#[derive(Default)]
pub struct RecordingReporter {
    pub events: Arc<Mutex<Vec<String>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn labels(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl PipelineReporter for RecordingReporter {
    fn report(&self, event: PipelineEvent<'_>) {
        let label = match &event {
            PipelineEvent::Admitted { .. } => "Admitted".to_string(),
            PipelineEvent::Rejected { .. } => "Rejected".to_string(),
            PipelineEvent::StageStarted { stage } => format!("Started:{}", stage.as_str()),
            PipelineEvent::StageCompleted { stage } => format!("Completed:{}", stage.as_str()),
            PipelineEvent::StageFailed { stage, .. } => format!("Failed:{}", stage.as_str()),
            PipelineEvent::Finished { .. } => "Finished".to_string(),
        };
        self.events.lock().unwrap().push(label);
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// A provider response carrying the "Jane Doe" fixture record.
pub fn jane_doe_completion() -> String {
    serde_json::json!({
        "executive_summary": ["Added keywords 'Python' and 'SQL' to Skills"],
        "personal_info": {
            "name": "Jane Doe",
            "email": "jane@example.com",
            "phone": "",
            "linkedin": "",
            "github": "",
            "location": "Berlin"
        },
        "skills": ["Python", "SQL", "Rust"],
        "experience": [{
            "company": "Acme",
            "role": "Software Engineer",
            "duration": "2020 - Present",
            "location": "Remote",
            "points": ["Built reporting pipelines in Python and SQL"]
        }],
        "projects": [],
        "education": []
    })
    .to_string()
}
