//! Document export for tailored resumes.
//!
//! The PDF renderer draws with the standard Helvetica faces, so it needs no
//! embedded fonts; all text is reduced to Latin-1 first.

pub mod error;
pub mod json;
pub mod metrics;
pub mod pdf;
pub mod sanitize;
pub mod writer;

pub use error::ExportError;
pub use json::{from_json, read_json_file, to_pretty_json};
pub use pdf::{PdfConfig, error_page, render, render_with, try_render};
pub use sanitize::sanitize;

/// Default download name of the PDF export.
pub const PDF_FILE_NAME: &str = "tailored_resume.pdf";
/// Default download name of the JSON export.
pub const JSON_FILE_NAME: &str = "resume_data.json";
/// Default download name of the Markdown export.
pub const MARKDOWN_FILE_NAME: &str = "tailored_resume.md";
