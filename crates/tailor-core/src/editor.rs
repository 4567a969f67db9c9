//! Text-field parsing for the record editor.
//!
//! The editor shows skills as one comma-separated field and each entry's
//! bullets as one newline-separated field. These helpers turn the edited
//! text back into lists.

use crate::error::AppError;
use crate::models::ResumeRecord;

/// Splits comma-separated text into trimmed, non-empty items.
pub fn parse_skill_list(text: &str) -> Vec<String> {
    split_trimmed(text, ',')
}

/// Splits newline-separated text into trimmed, non-empty lines.
pub fn parse_bullet_lines(text: &str) -> Vec<String> {
    split_trimmed(text, '\n')
}

fn split_trimmed(text: &str, sep: char) -> Vec<String> {
    text.split(sep)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Replaces the record's skills with the parsed field text.
pub fn apply_skills_text(record: &mut ResumeRecord, text: &str) {
    record.skills = parse_skill_list(text);
}

/// Replaces the bullets of experience entry `index`.
pub fn apply_experience_points(
    record: &mut ResumeRecord,
    index: usize,
    text: &str,
) -> Result<(), AppError> {
    let count = record.experience.len();
    let entry = record.experience.get_mut(index).ok_or_else(|| {
        AppError::ConfigError(format!(
            "Experience entry {index} does not exist ({count} entries)"
        ))
    })?;
    entry.points = parse_bullet_lines(text);
    Ok(())
}

/// Replaces the bullets of project entry `index`.
pub fn apply_project_points(
    record: &mut ResumeRecord,
    index: usize,
    text: &str,
) -> Result<(), AppError> {
    let count = record.projects.len();
    let entry = record.projects.get_mut(index).ok_or_else(|| {
        AppError::ConfigError(format!(
            "Project entry {index} does not exist ({count} entries)"
        ))
    })?;
    entry.points = parse_bullet_lines(text);
    Ok(())
}
