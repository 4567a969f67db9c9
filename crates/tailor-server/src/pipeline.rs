use async_trait::async_trait;

use tailor_core::traits::{CompleterFactory, JobScraper, ResumeExtractor};
use tailor_core::{AppError, Orchestrator, TailorRequest, TailoredResume, TracingReporter};

/// Object-safe view of the orchestrator so handlers don't carry its generics.
#[async_trait]
pub trait TailorPipeline: Send + Sync {
    async fn tailor(&self, request: TailorRequest) -> Result<TailoredResume, AppError>;

    /// Free-tier requests used so far.
    fn free_tier_used(&self) -> u32;

    fn free_tier_limit(&self) -> u32;

    fn free_tier_remaining(&self) -> u32 {
        self.free_tier_limit().saturating_sub(self.free_tier_used())
    }
}

#[async_trait]
impl<X, S, F> TailorPipeline for Orchestrator<X, S, F>
where
    X: ResumeExtractor + 'static,
    S: JobScraper + 'static,
    F: CompleterFactory + 'static,
{
    async fn tailor(&self, request: TailorRequest) -> Result<TailoredResume, AppError> {
        self.run(&request, &TracingReporter).await
    }

    fn free_tier_used(&self) -> u32 {
        self.usage().used()
    }

    fn free_tier_limit(&self) -> u32 {
        self.usage().limit()
    }
}
