// CSV preview of a laid-out sheet: one column per field, one record per
// sheet row from the layout's first row.

use std::io::Write;
use std::path::Path;

use testbook_engine::{ColumnLayout, Field, Sheet};

/// Display text of `field` on `row`, blank when a merge hides the cell.
pub(crate) fn field_display(sheet: &Sheet, columns: &ColumnLayout, row: usize, field: Field) -> String {
    let col = columns.col(field);
    if sheet.is_merge_hidden(row, col) {
        String::new()
    } else {
        sheet.get_display(row, col)
    }
}

pub fn export(sheet: &Sheet, columns: &ColumnLayout, start_row: usize, path: &Path) -> Result<(), String> {
    let file = std::fs::File::create(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    write_preview(sheet, columns, start_row, file)
}

/// Header of field keys, then one record per row in `start_row..sheet.rows`.
pub fn write_preview<W: Write>(
    sheet: &Sheet,
    columns: &ColumnLayout,
    start_row: usize,
    out: W,
) -> Result<(), String> {
    let mut writer = csv::WriterBuilder::new().from_writer(out);

    writer
        .write_record(Field::ALL.iter().map(|f| f.key()))
        .map_err(|e| e.to_string())?;

    for row in start_row..sheet.rows {
        let record: Vec<String> = Field::ALL
            .iter()
            .map(|&field| field_display(sheet, columns, row, field))
            .collect();
        writer.write_record(&record).map_err(|e| e.to_string())?;
    }

    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}
