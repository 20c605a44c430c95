// JSON preview: one object per sheet row, keyed by field, empty and
// merge-hidden cells omitted.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde_json::{Map, Value};
use testbook_engine::{ColumnLayout, Field, Sheet};

use crate::csv::field_display;

/// Rows as JSON objects. `row` is the 1-based sheet row.
pub fn preview_rows(sheet: &Sheet, columns: &ColumnLayout, start_row: usize) -> Vec<Value> {
    (start_row..sheet.rows)
        .map(|row| {
            let mut object = Map::new();
            object.insert("row".to_string(), Value::from(row + 1));
            for field in Field::ALL {
                let value = field_display(sheet, columns, row, field);
                if !value.is_empty() {
                    object.insert(field.key().to_string(), Value::String(value));
                }
            }
            Value::Object(object)
        })
        .collect()
}

pub fn write_preview<W: Write>(
    sheet: &Sheet,
    columns: &ColumnLayout,
    start_row: usize,
    out: W,
) -> Result<(), String> {
    let rows = preview_rows(sheet, columns, start_row);
    serde_json::to_writer_pretty(out, &rows).map_err(|e| e.to_string())
}

pub fn export(sheet: &Sheet, columns: &ColumnLayout, start_row: usize, path: &Path) -> Result<(), String> {
    let file = File::create(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let mut writer = BufWriter::new(file);
    write_preview(sheet, columns, start_row, &mut writer)?;
    writer.flush().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;
    use testbook_engine::{LayoutEngine, LayoutOptions, TestItem};

    #[test]
    fn test_json_preview() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("preview.json");

        let items = vec![
            TestItem::new("Login")
                .with(Field::ExecutedOn, "2026-02-19")
                .with_steps(["open", "submit"]),
        ];
        let options = LayoutOptions::default();
        let mut sheet = Sheet::default();
        LayoutEngine::new(options.clone()).layout(&items, &mut sheet);

        export(&sheet, &options.columns, options.start_row, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let parsed: Vec<Map<String, Value>> = serde_json::from_str(&content).unwrap();

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["row"], 5);
        assert_eq!(parsed[0]["id"], "ST01-IT2-1");
        assert_eq!(parsed[0]["major"], "Login");
        assert_eq!(parsed[0]["executed_on"], "2026/2/19");
        assert_eq!(parsed[0]["steps"], "open");

        assert_eq!(parsed[1]["row"], 6);
        assert_eq!(parsed[1]["steps"], "submit");
        assert!(!parsed[1].contains_key("major"), "hidden under the item merge");
    }
}
