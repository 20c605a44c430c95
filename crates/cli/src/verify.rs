// verify command: compare a workbook's merged regions with the layout

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde_json::json;
use testbook_engine::{ColumnLayout, LayoutEngine, LayoutPlan, MergedRegion};
use testbook_io::xlsx;

use crate::{plan_on_sheet, read_items, resolve_options, resolve_settings, CliError, LayoutArgs, EXIT_VERIFY_MISMATCH};

/// Regions the layout expects but the workbook lacks, and the reverse.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MergeDiff {
    pub matched: usize,
    pub missing: Vec<MergedRegion>,
    pub unexpected: Vec<MergedRegion>,
}

impl MergeDiff {
    pub fn between(expected: &[MergedRegion], actual: &[MergedRegion]) -> Self {
        let expected: BTreeSet<MergedRegion> = expected.iter().copied().collect();
        let actual: BTreeSet<MergedRegion> = actual.iter().copied().collect();
        Self {
            matched: expected.intersection(&actual).count(),
            missing: expected.difference(&actual).copied().collect(),
            unexpected: actual.difference(&expected).copied().collect(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }
}

/// Merged regions a rendered workbook should hold for `plan`.
///
/// XLSX has no one-cell merges, so `render` skips them and they are left
/// out here too.
pub fn workbook_regions(plan: &LayoutPlan, columns: &ColumnLayout) -> Vec<MergedRegion> {
    let mut regions = plan.expected_regions(columns);
    regions.retain(|r| !r.is_single_cell());
    regions
}

pub fn cmd_verify(workbook: PathBuf, items_path: PathBuf, args: LayoutArgs, json: bool) -> Result<(), CliError> {
    let settings = resolve_settings(&args)?;
    let options = resolve_options(&settings)?;
    let items = read_items(&items_path)?;

    if !workbook.exists() {
        return Err(CliError::io(format!("{}: no such file", workbook.display())));
    }
    let actual = xlsx::read_merge_refs(&workbook).map_err(CliError::parse)?;

    let engine = LayoutEngine::new(options);
    let plan = plan_on_sheet(&engine, &items)?;
    let expected = workbook_regions(&plan, &engine.options().columns);
    let diff = MergeDiff::between(&expected, &actual);
    log::info!(
        "verify: {} expected, {} in workbook, {} matched",
        expected.len(),
        actual.len(),
        diff.matched
    );

    if json {
        let out = json!({
            "ok": diff.is_clean(),
            "matched": diff.matched,
            "missing": diff.missing.iter().map(|r| r.a1()).collect::<Vec<_>>(),
            "unexpected": diff.unexpected.iter().map(|r| r.a1()).collect::<Vec<_>>(),
        });
        let text = serde_json::to_string_pretty(&out).map_err(|e| CliError::general(e.to_string()))?;
        println!("{}", text);
    } else if diff.is_clean() {
        println!("ok: {} merged regions match", diff.matched);
    } else {
        for region in &diff.missing {
            println!("missing:    {}", region);
        }
        for region in &diff.unexpected {
            println!("unexpected: {}", region);
        }
    }

    if diff.is_clean() {
        Ok(())
    } else {
        Err(CliError {
            code: EXIT_VERIFY_MISMATCH,
            message: format!(
                "{} missing, {} unexpected merged region(s) in {}",
                diff.missing.len(),
                diff.unexpected.len(),
                workbook.display()
            ),
            hint: Some("render and verify with the same settings and items".to_string()),
        })
    }
}
