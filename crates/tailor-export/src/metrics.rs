//! Glyph widths for the standard Helvetica faces.
//!
//! Widths are AFM units (1/1000 em) for ASCII 0x20..=0x7E, indexed by
//! `byte - 32`. Other Latin-1 characters use [`DEFAULT_WIDTH`], which is
//! close enough for line wrapping.

/// Width used for characters outside the tables.
pub const DEFAULT_WIDTH: u16 = 556;

/// Points per millimetre.
pub const PT_PER_MM: f32 = 72.0 / 25.4;

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    278, 278, 584, 584, 584, 556, 1015,
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    278, 278, 278, 469, 556, 333,
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

/// The three faces a resume uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
    Oblique,
}

impl FontStyle {
    pub const ALL: [FontStyle; 3] = [FontStyle::Regular, FontStyle::Bold, FontStyle::Oblique];

    /// PostScript name of the standard font.
    pub fn base_font(&self) -> &'static str {
        match self {
            FontStyle::Regular => "Helvetica",
            FontStyle::Bold => "Helvetica-Bold",
            FontStyle::Oblique => "Helvetica-Oblique",
        }
    }

    /// Name under which the font is registered in page resources.
    pub fn resource_name(&self) -> &'static str {
        match self {
            FontStyle::Regular => "F1",
            FontStyle::Bold => "F2",
            FontStyle::Oblique => "F3",
        }
    }

    fn table(&self) -> &'static [u16; 95] {
        match self {
            // Oblique shares the upright metrics
            FontStyle::Regular | FontStyle::Oblique => &HELVETICA,
            FontStyle::Bold => &HELVETICA_BOLD,
        }
    }

    pub fn char_width(&self, c: char) -> u16 {
        match u32::from(c) {
            code @ 32..=126 => self.table()[(code - 32) as usize],
            _ => DEFAULT_WIDTH,
        }
    }

    /// Width of `text` in points at `size_pt`.
    pub fn string_width_pt(&self, text: &str, size_pt: f32) -> f32 {
        let units: u32 = text.chars().map(|c| u32::from(self.char_width(c))).sum();
        units as f32 * size_pt / 1000.0
    }

    pub fn string_width_mm(&self, text: &str, size_pt: f32) -> f32 {
        self.string_width_pt(text, size_pt) / PT_PER_MM
    }
}
