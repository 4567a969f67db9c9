//! Resume layout: turns a [`ResumeRecord`] into a one-column A4 PDF.

use tailor_core::models::{EduEntry, JobEntry, ProjectEntry, ResumeRecord};

use crate::error::ExportError;
use crate::metrics::FontStyle;
use crate::writer::{Advance, Align, PageGeometry, PageWriter};

/// Font sizes in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSizes {
    pub name: f32,
    pub section_title: f32,
    pub entry_title: f32,
    pub body: f32,
    pub error: f32,
}

impl Default for FontSizes {
    fn default() -> Self {
        Self {
            name: 16.0,
            section_title: 12.0,
            entry_title: 11.0,
            body: 10.0,
            error: 12.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfConfig {
    pub geometry: PageGeometry,
    pub fonts: FontSizes,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            geometry: PageGeometry::A4,
            fonts: FontSizes::default(),
        }
    }
}

impl PdfConfig {
    fn validate(&self) -> Result<(), ExportError> {
        let FontSizes {
            name,
            section_title,
            entry_title,
            body,
            error,
        } = self.fonts;
        if [name, section_title, entry_title, body, error]
            .iter()
            .any(|s| !s.is_finite() || *s <= 0.0)
        {
            return Err(ExportError::Layout("font sizes must be positive".into()));
        }
        Ok(())
    }
}

/// Renders `record` with the default A4 layout. Never fails.
pub fn render(record: &ResumeRecord) -> Vec<u8> {
    render_with(record, &PdfConfig::default())
}

/// Renders `record`, replacing any failure with a one-page error document.
pub fn render_with(record: &ResumeRecord, config: &PdfConfig) -> Vec<u8> {
    match try_render(record, config) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, "PDF generation failed");
            error_page(&e.to_string())
        }
    }
}

/// The fallible core of [`render_with`].
pub fn try_render(record: &ResumeRecord, config: &PdfConfig) -> Result<Vec<u8>, ExportError> {
    config.validate()?;
    let mut layout = ResumeLayout {
        writer: PageWriter::new(config.geometry)?,
        fonts: config.fonts,
    };
    layout.header(record);

    if !record.skills.is_empty() {
        layout.section_title("SKILLS");
        layout.skills(&record.skills);
    }
    if !record.experience.is_empty() {
        layout.section_title("EXPERIENCE");
        for job in &record.experience {
            layout.job_entry(job);
        }
    }
    if !record.projects.is_empty() {
        layout.section_title("PROJECTS");
        for project in &record.projects {
            layout.project_entry(project);
        }
    }
    if !record.education.is_empty() {
        layout.section_title("EDUCATION");
        for edu in &record.education {
            layout.education_entry(edu);
        }
    }

    let pages = layout.writer.page_count();
    let bytes = layout.writer.finish()?;
    tracing::info!(pages, bytes = bytes.len(), "Rendered resume PDF");
    Ok(bytes)
}

/// One A4 page whose body reads `Error generating PDF: <message>`.
pub fn error_page(message: &str) -> Vec<u8> {
    build_error_page(message).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Error page generation failed");
        BLANK_PDF.to_vec()
    })
}

fn build_error_page(message: &str) -> Result<Vec<u8>, ExportError> {
    let mut writer = PageWriter::new(PageGeometry::A4)?;
    writer.set_font(FontStyle::Regular, FontSizes::default().error);
    writer.multi_cell(0.0, 10.0, &format!("Error generating PDF: {message}"));
    writer.finish()
}

/// Last resort when even the error page cannot be built.
const BLANK_PDF: &[u8] = b"%PDF-1.4\n\
1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n\
2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n\
3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 595 842] >> endobj\n\
trailer << /Root 1 0 R >>\n\
%%EOF\n";

struct ResumeLayout {
    writer: PageWriter,
    fonts: FontSizes,
}

impl ResumeLayout {
    fn header(&mut self, record: &ResumeRecord) {
        let info = &record.personal_info;
        let name = match info.name.trim() {
            "" => "Resume",
            name => name,
        };
        self.writer.set_font(FontStyle::Bold, self.fonts.name);
        self.writer
            .cell(0.0, 10.0, name, Align::Center, Advance::NextLine);

        let contact = info.contact_items();
        if !contact.is_empty() {
            self.writer.set_font(FontStyle::Regular, self.fonts.body);
            self.writer.cell(
                0.0,
                5.0,
                &contact.join(" | "),
                Align::Center,
                Advance::NextLine,
            );
        }
        self.writer.ln(5.0);
    }

    fn section_title(&mut self, label: &str) {
        self.writer.ln(5.0);
        self.writer.set_font(FontStyle::Bold, self.fonts.section_title);
        self.writer
            .cell(0.0, 6.0, label, Align::Left, Advance::NextLine);
        let geometry = *self.writer.geometry();
        self.writer
            .hline(self.writer.x(), geometry.width - geometry.margin_right);
        self.writer.ln(2.0);
    }

    fn skills(&mut self, skills: &[String]) {
        self.writer.set_font(FontStyle::Regular, self.fonts.body);
        self.writer.multi_cell(0.0, 5.0, &skills.join(", "));
    }

    fn job_entry(&mut self, job: &JobEntry) {
        self.entry(&job.role, &job.company, &job.duration, &job.location, &job.points);
    }

    /// Projects reuse the job layout: title in the role slot, role as subtitle.
    fn project_entry(&mut self, project: &ProjectEntry) {
        self.entry(
            &project.title,
            &project.role,
            &project.duration,
            "",
            &project.points,
        );
    }

    fn entry(
        &mut self,
        title: &str,
        subtitle: &str,
        duration: &str,
        location: &str,
        points: &[String],
    ) {
        let fonts = self.fonts;

        self.writer.set_font(FontStyle::Bold, fonts.entry_title);
        self.writer
            .cell(100.0, 5.0, title, Align::Left, Advance::Right);
        self.writer.set_font(FontStyle::Oblique, fonts.body);
        self.writer
            .cell(0.0, 5.0, duration, Align::Right, Advance::NextLine);

        if !subtitle.trim().is_empty() || !location.trim().is_empty() {
            self.writer.set_font(FontStyle::Oblique, fonts.entry_title);
            self.writer
                .cell(100.0, 5.0, subtitle, Align::Left, Advance::Right);
            self.writer.set_font(FontStyle::Oblique, fonts.body);
            self.writer
                .cell(0.0, 5.0, location, Align::Right, Advance::NextLine);
        }

        self.writer.set_font(FontStyle::Regular, fonts.body);
        let geometry = *self.writer.geometry();
        let indent = geometry.margin_left + 5.0;
        let bullet_width = geometry.text_width() - 15.0;
        for point in points {
            self.writer.set_x(indent);
            self.writer.multi_cell(bullet_width, 5.0, &format!("- {point}"));
        }

        self.writer.ln(3.0);
    }

    fn education_entry(&mut self, edu: &EduEntry) {
        let fonts = self.fonts;

        self.writer.set_font(FontStyle::Bold, fonts.entry_title);
        self.writer
            .cell(120.0, 5.0, &edu.school, Align::Left, Advance::Right);
        self.writer.set_font(FontStyle::Oblique, fonts.body);
        self.writer
            .cell(0.0, 5.0, &edu.duration, Align::Right, Advance::NextLine);

        self.writer.set_font(FontStyle::Regular, fonts.body);
        self.writer
            .cell(120.0, 5.0, &edu.degree, Align::Left, Advance::Right);
        self.writer.set_font(FontStyle::Oblique, fonts.body);
        self.writer
            .cell(0.0, 5.0, &edu.location, Align::Right, Advance::NextLine);

        self.writer.ln(3.0);
    }
}
