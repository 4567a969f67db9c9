//! The three-stage tailoring pipeline: extract → scrape → tailor.
//!
//! Stages run strictly in order and stop at the first failure. Each failure
//! is re-raised as the stage's own error kind so callers can tell where the
//! request died. No stage is retried.

use std::future::Future;
use std::io::Write;
use std::sync::Arc;

use tempfile::NamedTempFile;

use crate::config::{FREE_TIER_MAX_REQUESTS, process_env, resolve_api_key};
use crate::error::AppError;
use crate::models::TailoredResume;
use crate::provider::Provider;
use crate::quota::UsageCounter;
use crate::tailor::ResumeTailor;
use crate::traits::{CompleterFactory, JobScraper, ResumeExtractor};

/// Where a request currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extracting,
    Scraping,
    Tailoring,
    Done,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Extracting => "extracting",
            Stage::Scraping => "scraping",
            Stage::Tailoring => "tailoring",
            Stage::Done => "done",
            Stage::Failed => "failed",
        }
    }

    /// Status label shown while the stage runs.
    pub fn running_label(&self) -> &'static str {
        match self {
            Stage::Extracting => "Step 1: Scanning resume...",
            Stage::Scraping => "Step 2: Scraping job description...",
            Stage::Tailoring => "Step 3: Tailoring resume...",
            Stage::Done => "Done",
            Stage::Failed => "Failed",
        }
    }

    pub fn completed_label(&self) -> &'static str {
        match self {
            Stage::Extracting => "Step 1: Resume scanned successfully",
            Stage::Scraping => "Step 2: Job description scraped successfully",
            Stage::Tailoring => "Step 3: Tailoring complete",
            Stage::Done => "Done",
            Stage::Failed => "Failed",
        }
    }

    pub fn failed_label(&self) -> &'static str {
        match self {
            Stage::Extracting => "Step 1: Resume scan failed",
            Stage::Scraping => "Step 2: Scraping failed",
            Stage::Tailoring => "Step 3: Processing failed",
            Stage::Done => "Done",
            Stage::Failed => "Failed",
        }
    }

    /// Re-raises a failure as this stage's error kind.
    fn wrap(&self, error: AppError) -> AppError {
        match (self, error) {
            (Stage::Extracting, e @ AppError::ExtractionError(_)) => e,
            (Stage::Extracting, e) => {
                AppError::ExtractionError(format!("Failed to read resume: {e}"))
            }
            (Stage::Scraping, e) => AppError::ScrapeError(format!("Failed to scrape job: {e}")),
            (Stage::Tailoring, e) => {
                AppError::TailorError(format!("Failed to tailor resume: {e}"))
            }
            (Stage::Done | Stage::Failed, e) => e,
        }
    }
}

/// Transient state of one request.
#[derive(Debug, Clone)]
pub struct PipelineState {
    pub stage: Stage,
    pub provider: Provider,
    /// The request runs on the free tier (no caller-supplied key).
    pub free_tier: bool,
    /// Free-tier requests served by this process, including this one.
    pub usage_count: u32,
}

/// Events emitted by the orchestrator for status display and logging.
#[derive(Debug, Clone)]
pub enum PipelineEvent<'a> {
    Admitted { state: &'a PipelineState },
    Rejected { error: &'a str },
    StageStarted { stage: Stage },
    StageCompleted { stage: Stage },
    StageFailed { stage: Stage, error: &'a str },
    Finished { state: &'a PipelineState, degraded: bool },
}

/// Trait for receiving pipeline events (decoupled status reporting).
pub trait PipelineReporter: Send + Sync {
    fn report(&self, event: PipelineEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl PipelineReporter for NoopReporter {}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl PipelineReporter for TracingReporter {
    fn report(&self, event: PipelineEvent<'_>) {
        match event {
            PipelineEvent::Admitted { state } => {
                tracing::info!(
                    provider = %state.provider,
                    free_tier = state.free_tier,
                    usage_count = state.usage_count,
                    "Request admitted"
                );
            }
            PipelineEvent::Rejected { error } => {
                tracing::warn!(%error, "Request rejected");
            }
            PipelineEvent::StageStarted { stage } => {
                tracing::info!("{}", stage.running_label());
            }
            PipelineEvent::StageCompleted { stage } => {
                tracing::info!("{}", stage.completed_label());
            }
            PipelineEvent::StageFailed { stage, error } => {
                tracing::error!(%error, "{}", stage.failed_label());
            }
            PipelineEvent::Finished { state, degraded } => {
                if degraded {
                    tracing::warn!(provider = %state.provider, "Finished with fallback record");
                } else {
                    tracing::info!(provider = %state.provider, "Finished");
                }
            }
        }
    }
}

/// One tailoring request.
#[derive(Debug, Clone)]
pub struct TailorRequest {
    pub resume_pdf: Vec<u8>,
    pub job_url: String,
    /// Caller-supplied key. Blank counts as absent.
    pub api_key: Option<String>,
    pub provider: Provider,
}

impl TailorRequest {
    fn uses_free_tier(&self) -> bool {
        self.api_key.as_deref().is_none_or(|k| k.trim().is_empty())
    }
}

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Sequences the pipeline and owns the free-tier counter.
///
/// Generic over all external collaborators via traits, so tests run without
/// real PDFs, HTTP, or provider calls.
pub struct Orchestrator<X, S, F>
where
    X: ResumeExtractor,
    S: JobScraper,
    F: CompleterFactory,
{
    extractor: X,
    scraper: S,
    factory: F,
    usage: UsageCounter,
    env: EnvLookup,
}

impl<X, S, F> Orchestrator<X, S, F>
where
    X: ResumeExtractor,
    S: JobScraper,
    F: CompleterFactory,
{
    /// Creates an orchestrator with the default free-tier cap, reading
    /// fallback keys from the process environment.
    pub fn new(extractor: X, scraper: S, factory: F) -> Self {
        Self {
            extractor,
            scraper,
            factory,
            usage: UsageCounter::new(FREE_TIER_MAX_REQUESTS),
            env: Arc::new(process_env),
        }
    }

    pub fn with_free_tier_cap(mut self, cap: u32) -> Self {
        self.usage = UsageCounter::new(cap);
        self
    }

    /// Replaces the environment lookup used for fallback keys.
    pub fn with_env<E>(mut self, env: E) -> Self
    where
        E: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(env);
        self
    }

    pub fn usage(&self) -> &UsageCounter {
        &self.usage
    }

    /// Runs the structured pipeline.
    pub async fn run<R: PipelineReporter>(
        &self,
        request: &TailorRequest,
        reporter: &R,
    ) -> Result<TailoredResume, AppError> {
        let (mut state, tailor) = self.admit(request, reporter)?;
        let (resume_text, job_text) = self.gather(request, &mut state, reporter).await?;

        let result = run_stage(
            Stage::Tailoring,
            &mut state,
            reporter,
            tailor.tailor(&resume_text, &job_text),
        )
        .await?;

        state.stage = Stage::Done;
        reporter.report(PipelineEvent::Finished {
            state: &state,
            degraded: result.is_degraded(),
        });
        Ok(result)
    }

    /// Runs the pipeline but returns the provider's raw Markdown instead of
    /// a structured record.
    pub async fn run_markdown<R: PipelineReporter>(
        &self,
        request: &TailorRequest,
        reporter: &R,
    ) -> Result<String, AppError> {
        let (mut state, tailor) = self.admit(request, reporter)?;
        let (resume_text, job_text) = self.gather(request, &mut state, reporter).await?;

        let markdown = run_stage(
            Stage::Tailoring,
            &mut state,
            reporter,
            tailor.tailor_markdown(&resume_text, &job_text),
        )
        .await?;

        state.stage = Stage::Done;
        reporter.report(PipelineEvent::Finished {
            state: &state,
            degraded: false,
        });
        Ok(markdown)
    }

    /// Quota check, key resolution, and client construction. Nothing here
    /// touches the resume or the network.
    fn admit<R: PipelineReporter>(
        &self,
        request: &TailorRequest,
        reporter: &R,
    ) -> Result<(PipelineState, ResumeTailor<F::Completer>), AppError> {
        let free_tier = request.uses_free_tier();

        let admitted = self.try_admit(request, free_tier);
        let tailor = match admitted {
            Ok(tailor) => tailor,
            Err(e) => {
                reporter.report(PipelineEvent::Rejected {
                    error: &e.to_string(),
                });
                return Err(e);
            }
        };

        let usage_count = if free_tier {
            self.usage.record()
        } else {
            self.usage.used()
        };

        let state = PipelineState {
            stage: Stage::Extracting,
            provider: request.provider,
            free_tier,
            usage_count,
        };
        reporter.report(PipelineEvent::Admitted { state: &state });
        Ok((state, tailor))
    }

    fn try_admit(
        &self,
        request: &TailorRequest,
        free_tier: bool,
    ) -> Result<ResumeTailor<F::Completer>, AppError> {
        if free_tier {
            self.usage.check()?;
        }
        let api_key = resolve_api_key(request.api_key.as_deref(), request.provider, |name| {
            (self.env)(name)
        })?;
        let completer = self.factory.create(request.provider, &api_key)?;
        Ok(ResumeTailor::new(completer))
    }

    /// Stages 1 and 2.
    async fn gather<R: PipelineReporter>(
        &self,
        request: &TailorRequest,
        state: &mut PipelineState,
        reporter: &R,
    ) -> Result<(String, String), AppError> {
        let resume_text = run_stage(
            Stage::Extracting,
            state,
            reporter,
            self.extract_resume(&request.resume_pdf),
        )
        .await?;
        tracing::info!("Extracted {} chars of resume text", resume_text.chars().count());

        let job_text = run_stage(
            Stage::Scraping,
            state,
            reporter,
            self.scraper.scrape(&request.job_url),
        )
        .await?;
        tracing::info!(
            url = %request.job_url,
            "Scraped {} chars of job text",
            job_text.chars().count()
        );

        Ok((resume_text, job_text))
    }

    /// Writes the upload to a temporary file, extracts its text, and deletes
    /// the file when the guard drops, on every exit path.
    async fn extract_resume(&self, pdf: &[u8]) -> Result<String, AppError> {
        let scoped = write_temp_pdf(pdf)?;
        let text = self.extractor.extract(scoped.path()).await;
        drop(scoped);

        match text {
            Some(text) if !text.trim().is_empty() => Ok(text),
            Some(_) => Err(AppError::ExtractionError(
                "No text found in the uploaded resume".into(),
            )),
            None => Err(AppError::ExtractionError(
                "Could not read the uploaded resume as a PDF".into(),
            )),
        }
    }
}

fn write_temp_pdf(pdf: &[u8]) -> Result<NamedTempFile, AppError> {
    let mut file = tempfile::Builder::new()
        .prefix("resume-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| AppError::ExtractionError(format!("Failed to create temp file: {e}")))?;
    file.write_all(pdf)
        .and_then(|()| file.flush())
        .map_err(|e| AppError::ExtractionError(format!("Failed to write temp file: {e}")))?;
    Ok(file)
}

async fn run_stage<T, R, Fut>(
    stage: Stage,
    state: &mut PipelineState,
    reporter: &R,
    work: Fut,
) -> Result<T, AppError>
where
    R: PipelineReporter,
    Fut: Future<Output = Result<T, AppError>>,
{
    state.stage = stage;
    reporter.report(PipelineEvent::StageStarted { stage });

    match work.await {
        Ok(value) => {
            reporter.report(PipelineEvent::StageCompleted { stage });
            Ok(value)
        }
        Err(e) => {
            let e = stage.wrap(e);
            state.stage = Stage::Failed;
            reporter.report(PipelineEvent::StageFailed {
                stage,
                error: &e.to_string(),
            });
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::FALLBACK_MESSAGE;
    use crate::testutil::*;

    const JOB_URL: &str = "https://jobs.example.com/42";

    fn request(api_key: Option<&str>) -> TailorRequest {
        TailorRequest {
            resume_pdf: b"%PDF-1.4 fake".to_vec(),
            job_url: JOB_URL.to_string(),
            api_key: api_key.map(str::to_string),
            provider: Provider::Google,
        }
    }

    fn env_with_key(name: &str) -> Option<String> {
        (name == "GEMINI_API_KEY").then(|| "server-key".to_string())
    }

    fn orchestrator(
        extractor: MockExtractor,
        scraper: MockScraper,
        factory: MockCompleterFactory,
    ) -> Orchestrator<MockExtractor, MockScraper, MockCompleterFactory> {
        Orchestrator::new(extractor, scraper, factory).with_env(env_with_key)
    }

    #[tokio::test]
    async fn test_end_to_end_with_well_formed_json() {
        let extractor = MockExtractor::new("Jane Doe, Software Engineer");
        let scraper = MockScraper::new("We need Python, SQL");
        let factory = MockCompleterFactory::new(&jane_doe_completion());
        let orch = orchestrator(extractor.clone(), scraper.clone(), factory.clone());

        let result = orch
            .run(&request(Some("user-key")), &NoopReporter)
            .await
            .unwrap();

        assert!(!result.is_degraded());
        assert_eq!(result.record.personal_info.name, "Jane Doe");
        assert!(result.record.skills.contains(&"Python".to_string()));
        assert!(result.record.skills.contains(&"SQL".to_string()));

        let calls = factory.completer.calls.lock().unwrap();
        assert_eq!(calls[0].resume_text, "Jane Doe, Software Engineer");
        assert_eq!(calls[0].job_text, "We need Python, SQL");
        assert_eq!(scraper.urls.lock().unwrap().as_slice(), [JOB_URL]);
        assert_eq!(
            factory.created.lock().unwrap().as_slice(),
            [(Provider::Google, "user-key".to_string())]
        );
    }

    #[tokio::test]
    async fn test_extraction_failure_skips_scrape_and_tailor() {
        let scraper = MockScraper::new("job");
        let factory = MockCompleterFactory::new("{}");
        let orch = orchestrator(MockExtractor::failing(), scraper.clone(), factory.clone());

        let err = orch.run(&request(Some("k")), &NoopReporter).await.unwrap_err();

        assert!(matches!(err, AppError::ExtractionError(_)));
        assert_eq!(scraper.call_count(), 0);
        assert_eq!(factory.completer.call_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_extraction_is_an_error() {
        let scraper = MockScraper::new("job");
        let orch = orchestrator(
            MockExtractor::new("  \n "),
            scraper.clone(),
            MockCompleterFactory::new("{}"),
        );

        let err = orch.run(&request(Some("k")), &NoopReporter).await.unwrap_err();

        assert!(matches!(err, AppError::ExtractionError(_)));
        assert_eq!(scraper.call_count(), 0);
    }

    #[tokio::test]
    async fn test_scrape_failure_skips_tailor() {
        let factory = MockCompleterFactory::new("{}");
        let orch = orchestrator(
            MockExtractor::new("resume"),
            MockScraper::with_error(AppError::HttpError("HTTP 404 for url".into())),
            factory.clone(),
        );

        let err = orch.run(&request(Some("k")), &NoopReporter).await.unwrap_err();

        match err {
            AppError::ScrapeError(msg) => {
                assert!(msg.starts_with("Failed to scrape job"));
                assert!(msg.contains("HTTP 404"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(factory.completer.call_count(), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_is_tailor_error() {
        let factory = MockCompleterFactory::with_completer(MockCompleter::with_error(
            AppError::LlmError {
                message: "invalid key".into(),
                status_code: 401,
            },
        ));
        let orch = orchestrator(MockExtractor::new("resume"), MockScraper::new("job"), factory);

        let err = orch.run(&request(Some("k")), &NoopReporter).await.unwrap_err();

        assert!(matches!(err, AppError::TailorError(ref m) if m.contains("invalid key")));
    }

    #[tokio::test]
    async fn test_unparseable_completion_is_degraded_success() {
        let orch = orchestrator(
            MockExtractor::new("resume"),
            MockScraper::new("job"),
            MockCompleterFactory::new("not json at all"),
        );

        let result = orch.run(&request(Some("k")), &NoopReporter).await.unwrap();

        assert!(result.is_degraded());
        assert_eq!(result.record.executive_summary, vec![FALLBACK_MESSAGE]);
    }

    #[tokio::test]
    async fn test_free_tier_cap_rejects_before_any_stage() {
        let extractor = MockExtractor::new("resume");
        let orch = orchestrator(
            extractor.clone(),
            MockScraper::new("job"),
            MockCompleterFactory::new("{}"),
        )
        .with_free_tier_cap(2);

        orch.run(&request(None), &NoopReporter).await.unwrap();
        orch.run(&request(Some("  ")), &NoopReporter).await.unwrap();
        assert_eq!(orch.usage().used(), 2);

        let err = orch.run(&request(None), &NoopReporter).await.unwrap_err();

        assert!(matches!(err, AppError::FreeTierExhausted { limit: 2 }));
        assert_eq!(extractor.call_count(), 2);
        assert_eq!(orch.usage().used(), 2);
    }

    #[tokio::test]
    async fn test_keyed_requests_bypass_and_do_not_consume_quota() {
        let orch = orchestrator(
            MockExtractor::new("resume"),
            MockScraper::new("job"),
            MockCompleterFactory::new("{}"),
        )
        .with_free_tier_cap(1);

        orch.run(&request(None), &NoopReporter).await.unwrap();
        assert!(orch.run(&request(None), &NoopReporter).await.is_err());

        for _ in 0..3 {
            orch.run(&request(Some("own-key")), &NoopReporter)
                .await
                .unwrap();
        }
        assert_eq!(orch.usage().used(), 1);
    }

    #[tokio::test]
    async fn test_free_tier_uses_environment_key() {
        let factory = MockCompleterFactory::new("{}");
        let orch = orchestrator(
            MockExtractor::new("resume"),
            MockScraper::new("job"),
            factory.clone(),
        );

        orch.run(&request(None), &NoopReporter).await.unwrap();

        assert_eq!(factory.created.lock().unwrap()[0].1, "server-key");
    }

    #[tokio::test]
    async fn test_missing_key_is_rejected_without_counting() {
        let extractor = MockExtractor::new("resume");
        let orch = Orchestrator::new(
            extractor.clone(),
            MockScraper::new("job"),
            MockCompleterFactory::new("{}"),
        )
        .with_env(|_| None);

        let err = orch.run(&request(None), &NoopReporter).await.unwrap_err();

        assert!(matches!(err, AppError::ConfigError(_)));
        assert_eq!(extractor.call_count(), 0);
        assert_eq!(orch.usage().used(), 0);
    }

    #[tokio::test]
    async fn test_factory_error_is_rejected_before_stages() {
        let extractor = MockExtractor::new("resume");
        let orch = orchestrator(
            extractor.clone(),
            MockScraper::new("job"),
            MockCompleterFactory::with_create_error(AppError::ConfigError(
                "Failed to initialize google model".into(),
            )),
        );

        let err = orch.run(&request(Some("k")), &NoopReporter).await.unwrap_err();

        assert!(matches!(err, AppError::ConfigError(_)));
        assert_eq!(extractor.call_count(), 0);
    }

    #[tokio::test]
    async fn test_temp_file_is_removed_after_success() {
        let extractor = MockExtractor::new("resume");
        let orch = orchestrator(
            extractor.clone(),
            MockScraper::new("job"),
            MockCompleterFactory::new("{}"),
        );

        orch.run(&request(Some("k")), &NoopReporter).await.unwrap();

        let (path, contents) = extractor.seen.lock().unwrap()[0].clone();
        assert_eq!(contents.as_deref(), Some(request(Some("k")).resume_pdf.as_slice()));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("pdf"));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_temp_file_is_removed_after_failure() {
        let extractor = MockExtractor::failing();
        let orch = orchestrator(
            extractor.clone(),
            MockScraper::new("job"),
            MockCompleterFactory::new("{}"),
        );

        orch.run(&request(Some("k")), &NoopReporter)
            .await
            .unwrap_err();

        let path = extractor.last_path().unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_reports_stages_in_order() {
        let orch = orchestrator(
            MockExtractor::new("resume"),
            MockScraper::new("job"),
            MockCompleterFactory::new("{}"),
        );
        let reporter = RecordingReporter::new();

        orch.run(&request(Some("k")), &reporter).await.unwrap();

        assert_eq!(
            reporter.labels(),
            vec![
                "Admitted",
                "Started:extracting",
                "Completed:extracting",
                "Started:scraping",
                "Completed:scraping",
                "Started:tailoring",
                "Completed:tailoring",
                "Finished",
            ]
        );
    }

    #[tokio::test]
    async fn test_reports_failed_stage() {
        let orch = orchestrator(
            MockExtractor::new("resume"),
            MockScraper::with_error(AppError::Timeout(30)),
            MockCompleterFactory::new("{}"),
        );
        let reporter = RecordingReporter::new();

        orch.run(&request(Some("k")), &reporter)
            .await
            .unwrap_err();

        assert_eq!(
            reporter.labels().last().map(String::as_str),
            Some("Failed:scraping")
        );
    }

    #[tokio::test]
    async fn test_markdown_variant_returns_raw_text() {
        let factory = MockCompleterFactory::new("# Jane Doe\n\n## Skills\n- Python");
        let orch = orchestrator(
            MockExtractor::new("resume"),
            MockScraper::new("job"),
            factory.clone(),
        );

        let md = orch
            .run_markdown(&request(Some("k")), &NoopReporter)
            .await
            .unwrap();

        assert!(md.starts_with("# Jane Doe"));
        assert_eq!(factory.completer.call_count(), 1);
    }
}
