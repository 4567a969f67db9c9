//! A small cursor-based page writer on top of lopdf.
//!
//! Coordinates are millimetres from the top-left corner of the page. Text is
//! laid out in cells: a cell has a width and height, its text sits on a
//! baseline derived from both, and the cursor then moves right or down.
//! Content is converted to PDF points (origin bottom-left) as it is emitted.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};

use crate::error::ExportError;
use crate::metrics::{FontStyle, PT_PER_MM};
use crate::sanitize::{sanitize, to_latin1};

/// Horizontal padding inside a cell.
const CELL_MARGIN_MM: f32 = 1.0;
/// Stroke width of rules.
const LINE_WIDTH_MM: f32 = 0.2;
const MIN_TEXT_AREA_MM: f32 = 20.0;

/// Page size and margins in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_top: f32,
    /// Distance from the bottom edge that triggers a new page.
    pub break_margin: f32,
}

impl PageGeometry {
    /// A4 portrait, 10 mm side and top margins, page break 15 mm from the bottom.
    pub const A4: PageGeometry = PageGeometry {
        width: 210.0,
        height: 297.0,
        margin_left: 10.0,
        margin_right: 10.0,
        margin_top: 10.0,
        break_margin: 15.0,
    };

    pub fn text_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    fn validate(&self) -> Result<(), ExportError> {
        let values = [
            self.width,
            self.height,
            self.margin_left,
            self.margin_right,
            self.margin_top,
            self.break_margin,
        ];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ExportError::Layout(
                "page dimensions must be finite and non-negative".into(),
            ));
        }
        if self.text_width() < MIN_TEXT_AREA_MM {
            return Err(ExportError::Layout(format!(
                "text width {:.1} mm is too narrow",
                self.text_width()
            )));
        }
        if self.height - self.margin_top - self.break_margin < MIN_TEXT_AREA_MM {
            return Err(ExportError::Layout(format!(
                "usable height {:.1} mm is too short",
                self.height - self.margin_top - self.break_margin
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Where the cursor goes after a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// To the right edge of the cell, same row.
    Right,
    /// To the left margin of the next row.
    NextLine,
    /// Below the cell, same x.
    Below,
}

pub struct PageWriter {
    geometry: PageGeometry,
    pages: Vec<Vec<Operation>>,
    x: f32,
    y: f32,
    style: FontStyle,
    size_pt: f32,
}

impl PageWriter {
    /// Starts a document with one empty page.
    pub fn new(geometry: PageGeometry) -> Result<Self, ExportError> {
        geometry.validate()?;
        let mut writer = Self {
            geometry,
            pages: Vec::new(),
            x: geometry.margin_left,
            y: geometry.margin_top,
            style: FontStyle::Regular,
            size_pt: 10.0,
        };
        writer.add_page();
        Ok(writer)
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn add_page(&mut self) {
        self.pages.push(vec![Operation::new(
            "w",
            vec![real(LINE_WIDTH_MM * PT_PER_MM)],
        )]);
        self.x = self.geometry.margin_left;
        self.y = self.geometry.margin_top;
    }

    pub fn set_font(&mut self, style: FontStyle, size_pt: f32) {
        self.style = style;
        self.size_pt = size_pt;
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn set_x(&mut self, x: f32) {
        self.x = x;
    }

    /// Moves to the left margin and down by `h`.
    pub fn ln(&mut self, h: f32) {
        self.x = self.geometry.margin_left;
        self.y += h;
    }

    /// Draws a horizontal rule at the cursor row from `x` to `x_end`.
    pub fn hline(&mut self, x: f32, x_end: f32) {
        let y = self.pdf_y(self.y);
        self.ops().extend([
            Operation::new("m", vec![real(x * PT_PER_MM), real(y)]),
            Operation::new("l", vec![real(x_end * PT_PER_MM), real(y)]),
            Operation::new("S", vec![]),
        ]);
    }

    /// One line of text in a `w` x `h` cell. `w == 0` extends to the right margin.
    pub fn cell(&mut self, w: f32, h: f32, text: &str, align: Align, advance: Advance) {
        if self.y + h > self.page_break_at() {
            let x = self.x;
            self.add_page();
            self.x = x;
        }

        let w = self.resolve_width(w);
        let text = sanitize(&text.replace(['\n', '\r', '\t'], " "));
        if !text.is_empty() {
            let text_w = self.style.string_width_mm(&text, self.size_pt);
            let dx = match align {
                Align::Left => CELL_MARGIN_MM,
                Align::Center => (w - text_w) / 2.0,
                Align::Right => w - CELL_MARGIN_MM - text_w,
            };
            let size_mm = self.size_pt / PT_PER_MM;
            let baseline = self.y + 0.5 * h + 0.3 * size_mm;
            self.text_at(self.x + dx, baseline, &text);
        }

        match advance {
            Advance::Right => self.x += w,
            Advance::NextLine => {
                self.x = self.geometry.margin_left;
                self.y += h;
            }
            Advance::Below => self.y += h,
        }
    }

    /// Wrapped text in a column of width `w` (0 extends to the right margin).
    /// Leaves the cursor at the left margin below the text.
    pub fn multi_cell(&mut self, w: f32, h: f32, text: &str) {
        let w = self.resolve_width(w);
        let max = w - 2.0 * CELL_MARGIN_MM;
        for line in wrap_text(&sanitize(text), max, self.style, self.size_pt) {
            self.cell(w, h, &line, Align::Left, Advance::Below);
        }
        self.x = self.geometry.margin_left;
    }

    /// Serializes all pages into a PDF file.
    pub fn finish(self) -> Result<Vec<u8>, ExportError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut fonts = Dictionary::new();
        for style in FontStyle::ALL {
            let font_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => style.base_font(),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(style.resource_name(), font_id);
        }
        let resources_id = doc.add_object(dictionary! { "Font" => fonts });

        let page_count = self.pages.len() as i64;
        let mut kids = Vec::with_capacity(self.pages.len());
        for operations in self.pages {
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::from(page_id));
        }

        let media_box = vec![
            Object::Integer(0),
            Object::Integer(0),
            real(self.geometry.width * PT_PER_MM),
            real(self.geometry.height * PT_PER_MM),
        ];
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count,
                "Resources" => resources_id,
                "MediaBox" => media_box,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf)?;
        Ok(buf)
    }

    fn resolve_width(&self, w: f32) -> f32 {
        if w > 0.0 {
            w
        } else {
            self.geometry.width - self.geometry.margin_right - self.x
        }
    }

    fn page_break_at(&self) -> f32 {
        self.geometry.height - self.geometry.break_margin
    }

    fn pdf_y(&self, y_mm: f32) -> f32 {
        (self.geometry.height - y_mm) * PT_PER_MM
    }

    fn text_at(&mut self, x_mm: f32, baseline_mm: f32, text: &str) {
        let font = Object::Name(self.style.resource_name().as_bytes().to_vec());
        let size = real(self.size_pt);
        let x = real(x_mm * PT_PER_MM);
        let y = real(self.pdf_y(baseline_mm));
        let bytes = to_latin1(text);
        self.ops().extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font, size]),
            Operation::new("Td", vec![x, y]),
            Operation::new("Tj", vec![Object::string_literal(bytes)]),
            Operation::new("ET", vec![]),
        ]);
    }

    fn ops(&mut self) -> &mut Vec<Operation> {
        if self.pages.is_empty() {
            self.add_page();
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }
}

fn real(value: f32) -> Object {
    Object::Real(value.into())
}

/// Greedy word wrap. Each `\n` starts a new line; a word wider than the
/// column is broken between characters.
pub fn wrap_text(text: &str, max_width_mm: f32, style: FontStyle, size_pt: f32) -> Vec<String> {
    let fits = |s: &str| style.string_width_mm(s, size_pt) <= max_width_mm;
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{line} {word}")
            };
            if fits(&candidate) {
                line = candidate;
                continue;
            }
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if fits(word) {
                line = word.to_string();
                continue;
            }
            for ch in word.chars() {
                line.push(ch);
                if !fits(&line) && line.chars().count() > 1 {
                    line.pop();
                    lines.push(std::mem::take(&mut line));
                    line.push(ch);
                }
            }
        }
        lines.push(line);
    }
    lines
}
