pub mod config;
pub mod editor;
pub mod error;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod prompts;
pub mod provider;
pub mod quota;
pub mod tailor;
pub mod traits;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use error::AppError;
pub use models::{
    EduEntry, JobEntry, ParseOutcome, PersonalInfo, ProjectEntry, ResumeRecord, TailoredResume,
};
pub use pipeline::{
    NoopReporter, Orchestrator, PipelineEvent, PipelineReporter, PipelineState, Stage,
    TailorRequest, TracingReporter,
};
pub use provider::Provider;
pub use tailor::ResumeTailor;
pub use traits::{Cleaner, Completer, CompleterFactory, Fetcher, JobScraper, ResumeExtractor};
