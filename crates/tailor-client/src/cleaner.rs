use std::sync::Arc;

use htmd::HtmlToMarkdown;
use tailor_core::error::AppError;
use tailor_core::traits::Cleaner;

/// Tags whose content never belongs to a job description.
const SKIP_TAGS: [&str; 12] = [
    "script", "style", "nav", "footer", "header", "aside", "noscript", "iframe", "svg", "form",
    "button", "template",
];

/// HTML-to-Markdown cleaner using htmd.
///
/// Drops page chrome and collapses runs of blank lines so the job text
/// stays compact in the prompt.
#[derive(Clone)]
pub struct HtmdCleaner {
    converter: Arc<HtmlToMarkdown>,
}

impl HtmdCleaner {
    pub fn new() -> Self {
        let converter = HtmlToMarkdown::builder()
            .skip_tags(SKIP_TAGS.to_vec())
            .build();

        Self {
            converter: Arc::new(converter),
        }
    }
}

impl Default for HtmdCleaner {
    fn default() -> Self {
        Self::new()
    }
}

impl Cleaner for HtmdCleaner {
    fn clean(&self, html: &str) -> Result<String, AppError> {
        let markdown = self
            .converter
            .convert(html)
            .map_err(|e| AppError::CleanerError(e.to_string()))?;
        Ok(collapse_blank_lines(&markdown))
    }
}

/// Trims trailing whitespace per line and keeps at most one blank line in a row.
fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;

    for line in text.lines().map(str::trim_end) {
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }

    out.trim().to_string()
}
