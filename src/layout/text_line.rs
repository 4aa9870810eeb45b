//! Positioned line representation for layout analysis.
//!
//! This module defines the input and output data model: text lines with
//! page-relative geometry but no semantic markup, as harvested from a
//! renderer's glyph runs, and the structural elements the pipeline emits.

use crate::error::Result;
use crate::geometry::Rect;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    /// Bullet and enumeration markers that open a list item:
    /// "• ", "- ", "* ", "1. ", "12) ", "(3) ", "a) ", "iv. " and friends.
    static ref LIST_MARKER_REGEX: Regex = Regex::new(
        r"(?x)^\s*(?:
            [\u{2022}\u{25E6}\u{25AA}\u{2023}\u{00B7}*\u{2013}\u{2014}-]\s+
            | \(?\d{1,3}[.)]\s+
            | \(?[a-zA-Z][.)]\s+
            | \(?(?:i|ii|iii|iv|v|vi|vii|viii|ix|x|xi|xii)[.)]\s+
        )"
    )
    .expect("list marker regex is valid");
}

/// A sub-line text run with its own geometry and style flags.
///
/// Spans carry per-run formatting when the renderer reports it; a line with
/// uniform styling typically has no spans at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSpan {
    /// The run's text
    pub text: String,
    /// Left edge of the run
    pub x: f32,
    /// Width of the run
    pub width: f32,
    /// Whether the run is bold
    #[serde(default)]
    pub is_bold: bool,
    /// Whether the run is italic
    #[serde(default)]
    pub is_italic: bool,
}

/// A text line with page-relative geometry and font attributes.
///
/// This is the sole input of the analysis pipeline: no semantic tags, only
/// geometry and text. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionedLine {
    /// Zero-based page number
    pub page: u32,
    /// Left edge of the line
    pub x: f32,
    /// Vertical origin of the line (top-left convention, Y grows downward)
    pub y: f32,
    /// Width of the line
    pub width: f32,
    /// The line's text content
    pub text: String,
    /// Dominant font size of the line, in points
    pub font_size: f32,
    /// Whether the line is (predominantly) bold
    #[serde(default)]
    pub is_bold: bool,
    /// Whether the line is (predominantly) italic
    #[serde(default)]
    pub is_italic: bool,
    /// Optional per-run formatting
    #[serde(default)]
    pub spans: Vec<LineSpan>,
}

impl PositionedLine {
    /// Create a plain line with uniform styling and no spans.
    pub fn new(
        page: u32,
        x: f32,
        y: f32,
        width: f32,
        text: impl Into<String>,
        font_size: f32,
    ) -> Self {
        Self {
            page,
            x,
            y,
            width,
            text: text.into(),
            font_size,
            is_bold: false,
            is_italic: false,
            spans: Vec::new(),
        }
    }

    /// Mark the line as bold.
    pub fn bold(mut self) -> Self {
        self.is_bold = true;
        self
    }

    /// Get the right edge x-coordinate.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Get the line's bounding box; the font size stands in for the height.
    pub fn bbox(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.font_size)
    }

    /// Whether the line's geometry is usable for statistics.
    ///
    /// Non-finite or negative values are filtered out of every statistic
    /// rather than raised as errors.
    pub fn has_valid_geometry(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.font_size.is_finite()
            && self.width >= 0.0
            && self.font_size > 0.0
    }

    /// Whether the first alphabetic character is uppercase.
    pub fn starts_capitalized(&self) -> bool {
        self.text
            .chars()
            .find(|c| c.is_alphabetic())
            .is_some_and(|c| c.is_uppercase())
    }

    /// Whether the first alphabetic character is lowercase.
    pub fn starts_lowercase(&self) -> bool {
        self.text
            .chars()
            .find(|c| c.is_alphabetic())
            .is_some_and(|c| c.is_lowercase())
    }

    /// Whether the line ends a sentence.
    ///
    /// Trailing quotes and closing brackets are skipped before checking for
    /// terminal punctuation.
    pub fn ends_sentence(&self) -> bool {
        self.text
            .trim_end()
            .trim_end_matches(['"', '\'', '\u{201D}', '\u{2019}', ')', ']'])
            .ends_with(['.', '!', '?', '\u{2026}'])
    }

    /// Whether the line ends mid-word with a hyphenation break.
    pub fn ends_hyphenated(&self) -> bool {
        self.text
            .trim_end()
            .ends_with(['-', '\u{2010}', '\u{00AD}'])
    }

    /// Whether the line opens a list item (bullet or enumeration marker).
    pub fn starts_list_marker(&self) -> bool {
        LIST_MARKER_REGEX.is_match(&self.text)
    }
}

/// Per-page viewport dimensions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Viewport {
    /// Page width
    pub width: f32,
    /// Page height
    pub height: f32,
}

impl Viewport {
    /// Create a viewport from explicit dimensions.
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    /// US Letter at 72 dpi, the most common page size in the wild.
    fn default() -> Self {
        Self {
            width: 612.0,
            height: 792.0,
        }
    }
}

/// The kind of a structural element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// A heading line (level carried separately)
    Heading,
    /// A text block: paragraph, list item, or similar
    Block,
}

/// A structural element handed to the downstream classifier/serializer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuralElement {
    /// Element kind
    pub kind: ElementKind,
    /// Heading level (1..=6), present only for headings
    pub level: Option<u8>,
    /// Index of the column this element belongs to (0 for unsegmented pages)
    pub column_index: usize,
    /// Indices of the member lines in the analyzed line collection
    pub line_refs: Vec<usize>,
    /// Y origin of the first member line
    pub y_start: f32,
    /// Y origin of the last member line
    pub y_end: f32,
}

impl StructuralElement {
    /// Re-tag this element as a heading at the given level.
    ///
    /// The block/heading distinction is made by an external classifier;
    /// this is the hook it uses once a block has been identified as a
    /// heading and leveled.
    pub fn into_heading(mut self, level: u8) -> Self {
        self.kind = ElementKind::Heading;
        self.level = Some(level.clamp(1, 6));
        self
    }
}

/// Parse a JSON array of positioned lines.
///
/// This is the ingestion seam for renderers that harvest glyph-run geometry
/// out of process. Lines with unusable geometry are kept (the statistics
/// filter them individually); only malformed JSON is an error.
///
/// # Examples
///
/// ```
/// use docstrata::layout::parse_lines;
///
/// let json = r#"[{"page": 0, "x": 72.0, "y": 90.5, "width": 410.0,
///                 "text": "Hello", "font_size": 12.0}]"#;
/// let lines = parse_lines(json).unwrap();
/// assert_eq!(lines.len(), 1);
/// assert_eq!(lines[0].text, "Hello");
/// ```
pub fn parse_lines(json: &str) -> Result<Vec<PositionedLine>> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str) -> PositionedLine {
        PositionedLine::new(0, 0.0, 0.0, 100.0, text, 12.0)
    }

    #[test]
    fn test_right_edge_and_bbox() {
        let l = PositionedLine::new(0, 50.0, 100.0, 200.0, "text", 12.0);
        assert_eq!(l.right(), 250.0);
        let bbox = l.bbox();
        assert_eq!(bbox.x, 50.0);
        assert_eq!(bbox.height, 12.0);
    }

    #[test]
    fn test_valid_geometry() {
        assert!(line("ok").has_valid_geometry());

        let mut bad = line("nan x");
        bad.x = f32::NAN;
        assert!(!bad.has_valid_geometry());

        let mut bad = line("negative width");
        bad.width = -5.0;
        assert!(!bad.has_valid_geometry());

        let mut bad = line("zero font");
        bad.font_size = 0.0;
        assert!(!bad.has_valid_geometry());
    }

    #[test]
    fn test_capitalization_predicates() {
        assert!(line("The quick fox").starts_capitalized());
        assert!(line("\"Quoted start\"").starts_capitalized());
        assert!(line("lowercase start").starts_lowercase());
        assert!(line("42 Leads with a number").starts_capitalized());
        assert!(!line("...").starts_capitalized());
        assert!(!line("...").starts_lowercase());
    }

    #[test]
    fn test_sentence_end() {
        assert!(line("A sentence.").ends_sentence());
        assert!(line("Really?").ends_sentence());
        assert!(line("He said \"stop.\"").ends_sentence());
        assert!(line("(see appendix.)").ends_sentence());
        assert!(!line("continues with").ends_sentence());
        assert!(!line("trailing comma,").ends_sentence());
    }

    #[test]
    fn test_hyphenation() {
        assert!(line("hyphen-").ends_hyphenated());
        assert!(line("soft\u{00AD}").ends_hyphenated());
        assert!(!line("no break").ends_hyphenated());
    }

    #[test]
    fn test_list_markers() {
        assert!(line("\u{2022} bullet item").starts_list_marker());
        assert!(line("- dash item").starts_list_marker());
        assert!(line("1. numbered item").starts_list_marker());
        assert!(line("(12) parenthesized").starts_list_marker());
        assert!(line("a) lettered").starts_list_marker());
        assert!(line("iv. roman").starts_list_marker());
        assert!(!line("plain text").starts_list_marker());
        assert!(!line("-joined hyphen").starts_list_marker());
        assert!(!line("3.14 is not a marker").starts_list_marker());
    }

    #[test]
    fn test_parse_lines_roundtrip() {
        let json = r#"[
            {"page": 0, "x": 72.0, "y": 90.0, "width": 400.0,
             "text": "First", "font_size": 12.0, "is_bold": true},
            {"page": 0, "x": 72.0, "y": 110.0, "width": 380.0,
             "text": "Second", "font_size": 12.0,
             "spans": [{"text": "Sec", "x": 72.0, "width": 30.0, "is_italic": true},
                        {"text": "ond", "x": 102.0, "width": 30.0}]}
        ]"#;

        let lines = parse_lines(json).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].is_bold);
        assert_eq!(lines[1].spans.len(), 2);
        assert!(lines[1].spans[0].is_italic);
    }

    #[test]
    fn test_parse_lines_rejects_malformed_json() {
        assert!(parse_lines("{not an array").is_err());
    }

    #[test]
    fn test_into_heading_clamps_level() {
        let element = StructuralElement {
            kind: ElementKind::Block,
            level: None,
            column_index: 0,
            line_refs: vec![0],
            y_start: 0.0,
            y_end: 0.0,
        };
        let heading = element.into_heading(9);
        assert_eq!(heading.kind, ElementKind::Heading);
        assert_eq!(heading.level, Some(6));
    }
}
