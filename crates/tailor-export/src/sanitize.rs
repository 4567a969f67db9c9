//! Text sanitization for the PDF's single-byte font encoding.

/// Applied in order before Latin-1 encoding.
const SUBSTITUTIONS: [(&str, &str); 8] = [
    ("\u{2022}", "-"),
    ("\u{2013}", "-"),
    ("\u{2014}", "-"),
    ("\u{2018}", "'"),
    ("\u{2019}", "'"),
    ("\u{201C}", "\""),
    ("\u{201D}", "\""),
    // UTF-8 ellipsis mis-decoded as cp1252
    ("\u{00E2}\u{20AC}\u{00A6}", "..."),
];

/// Replaces typographic punctuation with ASCII and every remaining
/// character outside Latin-1 with `?`.
///
/// The result contains only characters in U+0000..=U+00FF.
pub fn sanitize(text: &str) -> String {
    let mut out = text.to_string();
    for (from, to) in SUBSTITUTIONS {
        if out.contains(from) {
            out = out.replace(from, to);
        }
    }
    out.chars()
        .map(|c| if u32::from(c) <= 0xFF { c } else { '?' })
        .collect()
}

/// Sanitizes and encodes as Latin-1 bytes.
pub fn to_latin1(text: &str) -> Vec<u8> {
    sanitize(text)
        .chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}
