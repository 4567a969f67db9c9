use scraper::{Html, Selector};
use tailor_core::error::AppError;
use tailor_core::traits::{Cleaner, Fetcher, JobScraper};

/// Pages with fewer words than this after cleaning are rejected.
pub const MIN_WORDS: usize = 20;

/// A JavaScript notice only fails the page when its text is shorter than this.
pub const JS_REQUIRED_MAX_WORDS: usize = 150;

const JS_MARKERS: [&str; 6] = [
    "enable javascript",
    "javascript is required",
    "javascript is disabled",
    "requires javascript",
    "turn on javascript",
    "javascript must be enabled",
];

/// Fetches a job posting and converts it to Markdown: fetch → clean → check.
///
/// Generic over the fetcher and cleaner so tests run without HTTP.
#[derive(Clone)]
pub struct HttpJobScraper<F: Fetcher, C: Cleaner> {
    fetcher: F,
    cleaner: C,
}

impl<F: Fetcher, C: Cleaner> HttpJobScraper<F, C> {
    pub fn new(fetcher: F, cleaner: C) -> Self {
        Self { fetcher, cleaner }
    }
}

impl<F: Fetcher, C: Cleaner> JobScraper for HttpJobScraper<F, C> {
    async fn scrape(&self, url: &str) -> Result<String, AppError> {
        tracing::info!("Fetching {}", url);
        let html = self.fetcher.fetch(url).await?;
        tracing::info!("Fetched {} bytes of HTML", html.len());

        let noscript_js = has_javascript_noscript(&html)?;
        let markdown = self.cleaner.clean(&html)?;
        let words = markdown.split_whitespace().count();
        tracing::debug!(words, noscript_js, "Cleaned job page");

        if words < JS_REQUIRED_MAX_WORDS && (noscript_js || has_js_marker(&markdown)) {
            return Err(AppError::CleanerError(format!(
                "Page requires JavaScript to render its content ({words} words found)"
            )));
        }
        if words < MIN_WORDS {
            return Err(AppError::CleanerError(format!(
                "Job description is too short ({words} words, need at least {MIN_WORDS})"
            )));
        }

        Ok(markdown)
    }
}

/// True when any `<noscript>` block mentions JavaScript.
fn has_javascript_noscript(html: &str) -> Result<bool, AppError> {
    let selector = Selector::parse("noscript")
        .map_err(|e| AppError::CleanerError(format!("Invalid selector: {e:?}")))?;
    let document = Html::parse_document(html);

    // noscript content may be parsed as raw text, so match on inner HTML
    Ok(document
        .select(&selector)
        .any(|el| el.inner_html().to_ascii_lowercase().contains("javascript")))
}

fn has_js_marker(text: &str) -> bool {
    let lower = text.to_lowercase();
    JS_MARKERS.iter().any(|m| lower.contains(m))
}
