use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical text alignment
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum VerticalAlignment {
    Top,
    #[default]
    Middle,
    Bottom,
}

/// Text overflow behavior
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum TextOverflow {
    #[default]
    Clip,       // Text is clipped at cell boundary
    Wrap,       // Text wraps to multiple lines within the cell
}

/// Line style of one cell edge
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum BorderStyle {
    #[default]
    None,
    Thin,
    Medium,
    Thick,
}

/// One side of a cell border
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CellBorder {
    pub style: BorderStyle,
    /// RGB color, `None` = automatic (black)
    pub color: Option<[u8; 3]>,
}

impl CellBorder {
    pub const fn thin() -> Self {
        Self { style: BorderStyle::Thin, color: None }
    }

    pub fn is_visible(&self) -> bool {
        self.style != BorderStyle::None
    }
}

/// Cell formatting options.
///
/// Formats are plain values: the layout builds a handful of them once and
/// hands them to the grid surface by reference for every cell it touches.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CellFormat {
    pub bold: bool,
    pub italic: bool,
    pub alignment: Alignment,
    pub vertical_alignment: VerticalAlignment,
    pub text_overflow: TextOverflow,
    pub font_family: Option<String>,  // None = surface default
    pub font_size: Option<f64>,
    pub font_color: Option<[u8; 3]>,
    pub background: Option<[u8; 3]>,
    pub border_top: CellBorder,
    pub border_right: CellBorder,
    pub border_bottom: CellBorder,
    pub border_left: CellBorder,
}

impl CellFormat {
    /// Format with a thin border on all four sides and nothing else.
    pub fn framed() -> Self {
        Self::default().with_border(CellBorder::thin())
    }

    pub fn with_border(mut self, border: CellBorder) -> Self {
        self.border_top = border;
        self.border_right = border;
        self.border_bottom = border;
        self.border_left = border;
        self
    }

    pub fn with_font(mut self, family: impl Into<String>, size: f64) -> Self {
        self.font_family = Some(family.into());
        self.font_size = Some(size);
        self
    }

    pub fn has_border(&self) -> bool {
        self.border_top.is_visible()
            || self.border_right.is_visible()
            || self.border_bottom.is_visible()
            || self.border_left.is_visible()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Date(NaiveDate),
}

impl CellValue {
    /// Text input, with blank strings collapsing to `Empty`
    pub fn text(input: impl Into<String>) -> Self {
        let s = input.into();
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s)
        }
    }

    /// Interpret `input` as a calendar date when it looks like one
    /// (`2026-02-19` or `2026/2/19`), otherwise as text.
    pub fn date_or_text(input: &str) -> Self {
        let trimmed = input.trim();
        for pattern in ["%Y-%m-%d", "%Y/%m/%d"] {
            if let Ok(date) = NaiveDate::parse_from_str(trimmed, pattern) {
                return CellValue::Date(date);
            }
        }
        CellValue::text(input)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn raw_display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Date(d) => format!("{}/{}/{}", d.year(), d.month(), d.day()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub format: CellFormat,
}

impl Cell {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_format_defaults() {
        let format = CellFormat::default();
        assert!(!format.bold);
        assert!(!format.italic);
        assert_eq!(format.alignment, Alignment::Left);
        assert_eq!(format.vertical_alignment, VerticalAlignment::Middle);
        assert_eq!(format.text_overflow, TextOverflow::Clip);
        assert!(!format.has_border());
    }

    #[test]
    fn test_framed_sets_all_sides() {
        let format = CellFormat::framed();
        assert_eq!(format.border_top, CellBorder::thin());
        assert_eq!(format.border_right, CellBorder::thin());
        assert_eq!(format.border_bottom, CellBorder::thin());
        assert_eq!(format.border_left, CellBorder::thin());
        assert!(format.has_border());
    }

    #[test]
    fn test_blank_text_is_empty() {
        assert_eq!(CellValue::text(""), CellValue::Empty);
        assert_eq!(CellValue::text("x"), CellValue::Text("x".to_string()));
    }

    #[test]
    fn test_date_or_text() {
        let expected = NaiveDate::from_ymd_opt(2026, 2, 19).unwrap();
        assert_eq!(CellValue::date_or_text("2026-02-19"), CellValue::Date(expected));
        assert_eq!(CellValue::date_or_text("2026/2/19"), CellValue::Date(expected));
        assert_eq!(
            CellValue::date_or_text("next sprint"),
            CellValue::Text("next sprint".to_string())
        );
        assert_eq!(CellValue::date_or_text(""), CellValue::Empty);
    }

    #[test]
    fn test_date_display() {
        let value = CellValue::Date(NaiveDate::from_ymd_opt(2026, 2, 9).unwrap());
        assert_eq!(value.raw_display(), "2026/2/9");
    }
}
