use std::path::{Path, PathBuf};

use tailor_core::traits::ResumeExtractor;
use tracing::{debug, warn};

/// Extracts plain text from a resume PDF with pdf-extract.
///
/// Parsing is CPU-bound, so it runs on the blocking pool. Every failure is
/// logged and reported as `None`.
#[derive(Debug, Clone, Default)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl ResumeExtractor for PdfTextExtractor {
    async fn extract(&self, path: &Path) -> Option<String> {
        let path: PathBuf = path.to_path_buf();

        let result = tokio::task::spawn_blocking(move || extract_pdf_file(&path)).await;

        match result {
            Ok(Ok(text)) => {
                debug!("Extracted {} chars from PDF", text.chars().count());
                Some(text)
            }
            Ok(Err(e)) => {
                warn!("Failed to extract PDF text: {}", e);
                None
            }
            Err(e) => {
                warn!("PDF extraction task failed: {}", e);
                None
            }
        }
    }
}

fn extract_pdf_file(path: &Path) -> Result<String, String> {
    let bytes = std::fs::read(path).map_err(|e| format!("{}: {e}", path.display()))?;
    if !bytes.starts_with(b"%PDF-") {
        return Err(format!("{} is not a PDF file", path.display()));
    }
    pdf_extract::extract_text_from_mem(&bytes).map_err(|e| e.to_string())
}
