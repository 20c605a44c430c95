//! Engine formats → `rust_xlsxwriter` formats.
//!
//! Layouts reuse a handful of `CellFormat` values across thousands of cells,
//! so converted formats are cached by value and built once each.

use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder};
use testbook_engine::cell::{
    Alignment, BorderStyle, CellFormat, TextOverflow, VerticalAlignment,
};

/// Date display used for date cells (2026/2/19).
pub const DATE_NUM_FORMAT: &str = "yyyy/m/d";

fn rgb(c: [u8; 3]) -> Color {
    Color::RGB(((c[0] as u32) << 16) | ((c[1] as u32) << 8) | c[2] as u32)
}

fn map_border_style(style: BorderStyle) -> FormatBorder {
    match style {
        BorderStyle::None => FormatBorder::None,
        BorderStyle::Thin => FormatBorder::Thin,
        BorderStyle::Medium => FormatBorder::Medium,
        BorderStyle::Thick => FormatBorder::Thick,
    }
}

fn map_h_align(alignment: Alignment) -> FormatAlign {
    match alignment {
        Alignment::Left => FormatAlign::Left,
        Alignment::Center => FormatAlign::Center,
        Alignment::Right => FormatAlign::Right,
    }
}

fn map_v_align(alignment: VerticalAlignment) -> FormatAlign {
    match alignment {
        VerticalAlignment::Top => FormatAlign::Top,
        VerticalAlignment::Middle => FormatAlign::VerticalCenter,
        VerticalAlignment::Bottom => FormatAlign::Bottom,
    }
}

/// Build the xlsx format for an engine format.
pub fn to_xlsx_format(format: &CellFormat) -> Format {
    let mut f = Format::new();

    if format.bold {
        f = f.set_bold();
    }
    if format.italic {
        f = f.set_italic();
    }
    if let Some(ref name) = format.font_family {
        f = f.set_font_name(name);
    }
    if let Some(size) = format.font_size {
        f = f.set_font_size(size);
    }
    if let Some(color) = format.font_color {
        f = f.set_font_color(rgb(color));
    }
    if let Some(bg) = format.background {
        f = f.set_background_color(rgb(bg));
    }
    if format.alignment != Alignment::Left {
        f = f.set_align(map_h_align(format.alignment));
    }
    f = f.set_align(map_v_align(format.vertical_alignment));
    if format.text_overflow == TextOverflow::Wrap {
        f = f.set_text_wrap();
    }

    let top = format.border_top;
    if top.is_visible() {
        f = f.set_border_top(map_border_style(top.style));
        if let Some(color) = top.color {
            f = f.set_border_top_color(rgb(color));
        }
    }
    let right = format.border_right;
    if right.is_visible() {
        f = f.set_border_right(map_border_style(right.style));
        if let Some(color) = right.color {
            f = f.set_border_right_color(rgb(color));
        }
    }
    let bottom = format.border_bottom;
    if bottom.is_visible() {
        f = f.set_border_bottom(map_border_style(bottom.style));
        if let Some(color) = bottom.color {
            f = f.set_border_bottom_color(rgb(color));
        }
    }
    let left = format.border_left;
    if left.is_visible() {
        f = f.set_border_left(map_border_style(left.style));
        if let Some(color) = left.color {
            f = f.set_border_left_color(rgb(color));
        }
    }

    f
}

/// Converted formats keyed by the engine format they came from.
#[derive(Default)]
pub struct FormatCache {
    entries: Vec<(CellFormat, Format)>,
}

impl FormatCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, format: &CellFormat) -> &Format {
        let idx = match self.entries.iter().position(|(k, _)| k == format) {
            Some(idx) => idx,
            None => {
                self.entries.push((format.clone(), to_xlsx_format(format)));
                self.entries.len() - 1
            }
        };
        &self.entries[idx].1
    }

    /// Date variant of `format` (same look, date number format).
    pub fn get_date(&mut self, format: &CellFormat) -> Format {
        self.get(format).clone().set_num_format(DATE_NUM_FORMAT)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_builds_each_format_once() {
        let mut cache = FormatCache::new();
        let framed = CellFormat::framed();
        let body = CellFormat {
            text_overflow: TextOverflow::Wrap,
            ..CellFormat::framed()
        };

        cache.get(&framed);
        cache.get(&body);
        cache.get(&framed);
        cache.get(&body.clone());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_rgb_packing() {
        assert_eq!(rgb([0x44, 0x72, 0xC4]), Color::RGB(0x4472C4));
        assert_eq!(rgb([0xFF, 0xFF, 0xFF]), Color::RGB(0xFFFFFF));
    }

    #[test]
    fn test_distinct_formats_convert_differently() {
        let plain = to_xlsx_format(&CellFormat::default());
        let framed = to_xlsx_format(&CellFormat::framed());
        let fonted = to_xlsx_format(&CellFormat::default().with_font("Yu Gothic", 10.0));
        assert_ne!(plain, framed);
        assert_ne!(plain, fonted);
    }
}
