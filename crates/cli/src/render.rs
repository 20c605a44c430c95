// render / plan / preview commands

use std::path::{Path, PathBuf};

use serde_json::json;
use testbook_config::DocumentSettings;
use testbook_engine::{ColumnLayout, LayoutEngine, LayoutReport, Sheet};
use testbook_io::xlsx::{self, ExportLayout};

use crate::{plan_on_sheet, read_items, resolve_options, resolve_settings, CliError, LayoutArgs, PreviewFormat};

/// Column widths and frozen rows for the workbook.
fn export_layout(settings: &DocumentSettings, columns: &ColumnLayout) -> ExportLayout {
    ExportLayout {
        col_widths: settings.column_widths(columns).into_iter().collect(),
        frozen_rows: settings.freeze_rows,
    }
}

/// Load settings and items, lay the items out on a fresh sheet.
fn lay_out(
    items_path: &Path,
    args: &LayoutArgs,
) -> Result<(DocumentSettings, LayoutEngine, Sheet, LayoutReport), CliError> {
    let settings = resolve_settings(args)?;
    let options = resolve_options(&settings)?;
    let items = read_items(items_path)?;

    let engine = LayoutEngine::new(options);
    let plan = plan_on_sheet(&engine, &items)?;
    let mut sheet = Sheet::new(settings.sheet_name.clone());
    let report = engine.apply(&plan, &mut sheet);
    Ok((settings, engine, sheet, report))
}

pub fn cmd_render(
    items_path: PathBuf,
    output: PathBuf,
    args: LayoutArgs,
    diagnostics: bool,
    strict: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let (settings, engine, sheet, report) = lay_out(&items_path, &args)?;

    if diagnostics {
        for diagnostic in &report.diagnostics {
            eprintln!("conflict: {}", diagnostic);
        }
    }
    if strict && !report.diagnostics.is_empty() {
        return Err(CliError::general(format!(
            "layout ignored {} merge conflict(s)",
            report.diagnostics.len()
        ))
        .with_hint("rerun with --diagnostics to list them"));
    }

    let layout = export_layout(&settings, &engine.options().columns);
    let result = xlsx::export(&sheet, &output, Some(&layout)).map_err(CliError::io)?;
    for warning in &result.warnings {
        log::warn!("xlsx: {}", warning);
    }

    if !quiet {
        println!("{}: {}; {}", output.display(), report.summary(), result.summary());
    }
    Ok(())
}

pub fn cmd_plan(items_path: PathBuf, args: LayoutArgs, json: bool) -> Result<(), CliError> {
    let settings = resolve_settings(&args)?;
    let options = resolve_options(&settings)?;
    let items = read_items(&items_path)?;

    let engine = LayoutEngine::new(options);
    let plan = plan_on_sheet(&engine, &items)?;
    let options = engine.options();
    let regions = plan.expected_regions(&options.columns);

    if json {
        let placements: Vec<_> = plan
            .placements
            .iter()
            .zip(&items)
            .map(|(p, item)| {
                json!({
                    "id": options.item_id(p.ordinal),
                    "major": item.major,
                    "rows": p.rows().to_string(),
                    "start_row": p.start_row + 1,
                    "row_count": p.row_count,
                })
            })
            .collect();
        let bands: Vec<_> = plan
            .runs
            .iter()
            .map(|run| {
                json!({
                    "major": run.major,
                    "items": run.item_count,
                    "rows": run.rows.to_string(),
                    "merged": run.needs_merge(),
                })
            })
            .collect();
        let merges: Vec<String> = regions.iter().map(|r| r.a1()).collect();
        let out = json!({
            "sheet": settings.sheet_name,
            "items": placements,
            "categories": bands,
            "merges": merges,
            "next_row": plan.next_row + 1,
        });
        let text = serde_json::to_string_pretty(&out).map_err(|e| CliError::general(e.to_string()))?;
        println!("{}", text);
        return Ok(());
    }

    for (placement, item) in plan.placements.iter().zip(&items) {
        println!(
            "{:<20} rows {:<9} {}",
            options.item_id(placement.ordinal),
            placement.rows().to_string(),
            item.major
        );
    }
    for run in plan.runs.iter().filter(|r| r.needs_merge()) {
        println!("band {:<15} rows {:<9} {} items", run.major, run.rows.to_string(), run.item_count);
    }
    println!("merges ({}):", regions.len());
    for region in &regions {
        println!("  {}", region);
    }
    Ok(())
}

pub fn cmd_preview(
    items_path: PathBuf,
    to: PreviewFormat,
    output: Option<PathBuf>,
    args: LayoutArgs,
) -> Result<(), CliError> {
    let (_, engine, sheet, _) = lay_out(&items_path, &args)?;
    let columns = &engine.options().columns;
    let start_row = engine.options().start_row;

    let to_file = output.filter(|p| p.as_path() != Path::new("-"));
    let result = match (to, to_file) {
        (PreviewFormat::Csv, Some(path)) => testbook_io::csv::export(&sheet, columns, start_row, &path),
        (PreviewFormat::Json, Some(path)) => testbook_io::json::export(&sheet, columns, start_row, &path),
        (PreviewFormat::Csv, None) => {
            testbook_io::csv::write_preview(&sheet, columns, start_row, std::io::stdout().lock())
        }
        (PreviewFormat::Json, None) => {
            let stdout = std::io::stdout().lock();
            testbook_io::json::write_preview(&sheet, columns, start_row, stdout).map(|()| println!())
        }
    };
    result.map_err(CliError::io)
}
