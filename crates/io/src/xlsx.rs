// XLSX export of a laid-out sheet, plus read-back of the merged regions in a
// written workbook.

use std::collections::HashMap;
use std::io::{Read, Seek};
use std::path::Path;
use std::time::Instant;

use chrono::Datelike;
use quick_xml::events::Event;
use quick_xml::Reader;
use rust_xlsxwriter::{ExcelDateTime, Workbook as XlsxWorkbook, Worksheet};
use testbook_engine::cell::CellValue;
use testbook_engine::region::{cell_ref, parse_a1_range};
use testbook_engine::{MergedRegion, Sheet};
use zip::ZipArchive;

use crate::xlsx_styles::FormatCache;

/// Excel's last row/column (0-based)
const MAX_ROW: usize = 1_048_575;
const MAX_COL: usize = 16_383;

/// Result of an XLSX export operation
#[derive(Debug, Default, Clone)]
pub struct ExportResult {
    /// Cells written with a value
    pub cells_exported: usize,
    /// Of those, cells written as dates
    pub dates_exported: usize,
    /// Formatted cells without a value (borders only)
    pub blanks_exported: usize,
    /// Merged cell regions exported
    pub merges_exported: usize,
    /// Merged regions skipped (single cell, or outside the Excel grid)
    pub merges_skipped: usize,
    /// Distinct cell formats in the workbook
    pub formats_used: usize,
    /// Export duration in milliseconds
    pub export_duration_ms: u128,
    /// Warnings generated during export
    pub warnings: Vec<String>,
}

impl ExportResult {
    /// Returns a summary message suitable for display
    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("{} cells", self.cells_exported),
            format!("{} merged regions", self.merges_exported),
        ];
        if self.dates_exported > 0 {
            parts.push(format!("{} dates", self.dates_exported));
        }
        parts.join(", ")
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Column widths and frozen header rows for export
#[derive(Debug, Default, Clone)]
pub struct ExportLayout {
    /// Column widths in Excel character units, keyed by column index
    pub col_widths: HashMap<usize, f64>,
    /// Number of frozen rows (for freeze panes)
    pub frozen_rows: usize,
}

/// Export one laid-out sheet to an XLSX file.
///
/// Merged regions go first: `merge_range()` writes formatted blanks to every
/// cell of the range (using the origin cell's format, so borders cover the
/// whole region), then cell values overwrite the origin cells.
pub fn export(sheet: &Sheet, path: &Path, layout: Option<&ExportLayout>) -> Result<ExportResult, String> {
    let start_time = Instant::now();
    let mut result = ExportResult::default();
    let mut formats = FormatCache::new();

    let mut xlsx_workbook = XlsxWorkbook::new();
    let worksheet = xlsx_workbook
        .add_worksheet()
        .set_name(&sheet.name)
        .map_err(|e| format!("Failed to create sheet '{}': {}", sheet.name, e))?;

    export_merges(sheet, worksheet, &mut formats, &mut result)?;
    export_sheet_cells(sheet, worksheet, &mut formats, &mut result)?;

    if let Some(layout) = layout {
        apply_layout(worksheet, layout)?;
    }

    result.formats_used = formats.len();

    xlsx_workbook
        .save(path)
        .map_err(|e| format!("Failed to save XLSX file: {}", e))?;

    result.export_duration_ms = start_time.elapsed().as_millis();
    log::info!("xlsx: wrote {} ({})", path.display(), result.summary());
    Ok(result)
}

fn export_merges(
    sheet: &Sheet,
    worksheet: &mut Worksheet,
    formats: &mut FormatCache,
    result: &mut ExportResult,
) -> Result<(), String> {
    for merge in &sheet.merged_regions {
        // Excel has no single-cell merges; the cell exports as a plain cell.
        if merge.is_single_cell() {
            result.merges_skipped += 1;
            result.warnings.push(format!("single-cell merge {} skipped", merge));
            continue;
        }
        if merge.end.0 > MAX_ROW || merge.end.1 > MAX_COL {
            result.merges_skipped += 1;
            result.warnings.push(format!("merge {} outside the Excel grid skipped", merge));
            continue;
        }
        let format = formats.get(&sheet.get_format(merge.start.0, merge.start.1));
        worksheet
            .merge_range(
                merge.start.0 as u32,
                merge.start.1 as u16,
                merge.end.0 as u32,
                merge.end.1 as u16,
                "",
                format,
            )
            .map_err(|e| format!("Failed to write merge {}: {}", merge, e))?;
        result.merges_exported += 1;
    }
    Ok(())
}

/// Write values and formats. Merge-hidden cells were already written by
/// `merge_range` and are skipped; only the origin carries the value.
fn export_sheet_cells(
    sheet: &Sheet,
    worksheet: &mut Worksheet,
    formats: &mut FormatCache,
    result: &mut ExportResult,
) -> Result<(), String> {
    // Sorted for deterministic output
    let mut cells: Vec<_> = sheet.cells_iter().collect();
    cells.sort_by_key(|(pos, _)| **pos);

    for ((row, col), cell) in cells {
        if sheet.is_merge_hidden(*row, *col) {
            continue;
        }
        if *row > MAX_ROW || *col > MAX_COL {
            result
                .warnings
                .push(format!("cell {} outside the Excel grid skipped", cell_ref(*row, *col)));
            continue;
        }

        let row32 = *row as u32;
        let col16 = *col as u16;

        match &cell.value {
            CellValue::Empty => {
                if cell.format == Default::default() || sheet.is_merge_origin(*row, *col) {
                    continue;
                }
                let format = formats.get(&cell.format);
                worksheet
                    .write_blank(row32, col16, format)
                    .map_err(|e| format!("Failed to write cell: {}", e))?;
                result.blanks_exported += 1;
            }
            CellValue::Text(s) => {
                let format = formats.get(&cell.format);
                worksheet
                    .write_string_with_format(row32, col16, s, format)
                    .map_err(|e| format!("Failed to write cell: {}", e))?;
                result.cells_exported += 1;
            }
            CellValue::Date(d) => {
                let datetime = ExcelDateTime::from_ymd(d.year() as u16, d.month() as u8, d.day() as u8)
                    .map_err(|e| format!("Invalid date {}: {}", d, e))?;
                let format = formats.get_date(&cell.format);
                worksheet
                    .write_datetime_with_format(row32, col16, &datetime, &format)
                    .map_err(|e| format!("Failed to write cell: {}", e))?;
                result.cells_exported += 1;
                result.dates_exported += 1;
            }
        }
    }
    Ok(())
}

fn apply_layout(worksheet: &mut Worksheet, layout: &ExportLayout) -> Result<(), String> {
    let mut widths: Vec<(&usize, &f64)> = layout.col_widths.iter().collect();
    widths.sort_by_key(|(col, _)| **col);
    for (col, width) in widths {
        worksheet
            .set_column_width(*col as u16, *width)
            .map_err(|e| format!("Failed to set column width: {}", e))?;
    }

    if layout.frozen_rows > 0 {
        worksheet
            .set_freeze_panes(layout.frozen_rows as u32, 0)
            .map_err(|e| format!("Failed to set freeze panes: {}", e))?;
    }
    Ok(())
}

// =============================================================================
// Read-back
// =============================================================================

/// Merged regions recorded in the first worksheet of an XLSX file, sorted.
///
/// Reads `<mergeCell ref="…"/>` entries straight from the worksheet XML, so
/// the result reflects what Excel will see.
pub fn read_merge_refs(path: &Path) -> Result<Vec<MergedRegion>, String> {
    let file = std::fs::File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let mut archive = ZipArchive::new(file).map_err(|e| format!("{}: not an XLSX archive: {}", path.display(), e))?;
    let xml = read_zip_file(&mut archive, "xl/worksheets/sheet1.xml")
        .ok_or_else(|| format!("{}: no first worksheet", path.display()))?;
    let mut regions = parse_merge_cells(&xml);
    regions.sort();
    Ok(regions)
}

/// Read a file from a ZIP archive, returning None on error.
fn read_zip_file<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Option<String> {
    let mut file = archive.by_name(path).ok()?;
    let mut content = String::new();
    file.read_to_string(&mut content).ok()?;
    Some(content)
}

/// Collect `<mergeCell ref=…>` regions from worksheet XML.
pub fn parse_merge_cells(xml: &str) -> Vec<MergedRegion> {
    let mut regions = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                if e.name().as_ref() == b"mergeCell" {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"ref" {
                            let ref_str = String::from_utf8_lossy(&attr.value);
                            if let Some(region) = parse_a1_range(&ref_str) {
                                regions.push(region);
                            }
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook, Data, Reader as _, Xlsx};
    use chrono::NaiveDate;
    use tempfile::tempdir;
    use testbook_engine::cell::CellFormat;
    use testbook_engine::{Field, LayoutEngine, LayoutOptions, TestItem};

    fn cell_text(range: &calamine::Range<Data>, row: u32, col: u32) -> String {
        range
            .get_value((row, col))
            .map(|d| d.to_string())
            .unwrap_or_default()
    }

    #[test]
    fn test_parse_merge_cells() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData/>
  <mergeCells count="2">
    <mergeCell ref="A1:C3"/>
    <mergeCell ref="E5:N6"/>
  </mergeCells>
</worksheet>"#;
        assert_eq!(
            parse_merge_cells(xml),
            vec![MergedRegion::new(0, 0, 2, 2), MergedRegion::new(4, 4, 5, 13)]
        );
    }

    #[test]
    fn test_export_layout_roundtrips_merges_and_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("items.xlsx");

        let items = vec![
            TestItem::new("Copy").with_steps(["1. run", "2. check"]).with_expected(["ok"]),
            TestItem::new("Copy").with(Field::Note, "JMeter"),
            TestItem::new("Load"),
        ];
        let options = LayoutOptions::default();
        let engine = LayoutEngine::new(options.clone());
        let mut sheet = Sheet::new("Test Items");
        engine.layout(&items, &mut sheet);

        let result = export(&sheet, &path, None).unwrap();
        assert_eq!(result.merges_exported, sheet.merged_regions.len());
        assert_eq!(result.merges_skipped, 0);
        assert!(!result.has_warnings(), "{:?}", result.warnings);

        let regions = read_merge_refs(&path).unwrap();
        assert_eq!(regions, engine.plan(&items).expected_regions(&options.columns));
        assert!(regions.contains(&MergedRegion::new(4, 4, 6, 13)), "major band E5:N7");

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        let range = workbook.worksheet_range("Test Items").unwrap();
        let at = |row: u32, col: u32| cell_text(&range, row, col);
        assert_eq!(at(4, 0), "ST01-IT2-1");
        assert_eq!(at(4, 4), "Copy");
        assert_eq!(at(5, 81), "2. check");
        assert_eq!(at(6, 118), "JMeter");
        assert_eq!(at(7, 4), "Load");
    }

    #[test]
    fn test_export_dates_and_blanks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dates.xlsx");

        let mut sheet = Sheet::new("Sheet1");
        sheet.set_value(0, 0, CellValue::Date(NaiveDate::from_ymd_opt(2026, 2, 19).unwrap()));
        sheet.set_format(0, 1, CellFormat::framed());
        sheet.set_value(1, 0, CellValue::text("plain"));

        let result = export(&sheet, &path, None).unwrap();
        assert_eq!(result.cells_exported, 2);
        assert_eq!(result.dates_exported, 1);
        assert_eq!(result.blanks_exported, 1);
        assert!(result.summary().contains("1 dates"));
    }

    #[test]
    fn test_single_cell_merge_is_skipped_with_warning() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("single.xlsx");

        let mut sheet = Sheet::new("Sheet1");
        sheet.set_value(0, 0, CellValue::text("x"));
        sheet.add_merge(MergedRegion::new(0, 0, 0, 0)).unwrap();
        sheet.add_merge(MergedRegion::new(1, 0, 1, 3)).unwrap();

        let result = export(&sheet, &path, None).unwrap();
        assert_eq!(result.merges_exported, 1);
        assert_eq!(result.merges_skipped, 1);
        assert!(result.warnings[0].contains("A1:A1"));
        assert_eq!(read_merge_refs(&path).unwrap(), vec![MergedRegion::new(1, 0, 1, 3)]);
    }

    #[test]
    fn test_export_with_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("layout.xlsx");

        let mut sheet = Sheet::new("Sheet1");
        sheet.set_value(4, 0, CellValue::text("x"));
        let mut layout = ExportLayout { frozen_rows: 4, ..ExportLayout::default() };
        layout.col_widths.insert(0, 14.0);
        layout.col_widths.insert(1, 3.0);

        export(&sheet, &path, Some(&layout)).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_read_merge_refs_rejects_non_xlsx() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bogus.xlsx");
        std::fs::write(&path, b"not a zip").unwrap();
        let err = read_merge_refs(&path).unwrap_err();
        assert!(err.contains("not an XLSX archive"), "{err}");
    }
}
