use std::path::Path;

use tailor_core::models::ResumeRecord;

use crate::error::ExportError;

/// Pretty-printed JSON (two-space indent) mirroring the record exactly.
pub fn to_pretty_json(record: &ResumeRecord) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(record)?)
}

/// Reads an exported (and possibly hand-edited) record back.
pub fn from_json(text: &str) -> Result<ResumeRecord, ExportError> {
    Ok(serde_json::from_str(text)?)
}

pub fn read_json_file(path: &Path) -> Result<ResumeRecord, ExportError> {
    let text = std::fs::read_to_string(path)?;
    from_json(&text)
}
