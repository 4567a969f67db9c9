use thiserror::Error;

/// Errors raised while building an export.
///
/// PDF rendering never returns these to callers: `render` turns them into
/// an error page. They surface from the fallible `try_render` and the JSON
/// helpers.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Page geometry or font sizes cannot produce a layout.
    #[error("Invalid layout: {0}")]
    Layout(String),

    #[error("PDF encoding failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
