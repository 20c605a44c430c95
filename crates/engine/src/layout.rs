//! Test-item sheet layout.
//!
//! Turns an ordered list of [`TestItem`]s into row placements, cell writes
//! and merge instructions, then renders them onto a [`GridSurface`].
//!
//! Two passes:
//!
//! 1. Placement: each item gets `max(steps, expected, 1)` consecutive rows
//!    starting at the cursor. Scalar fields are written once at the item's
//!    first row and merged over all of its rows; steps and expected results
//!    are written one per row, each row merged on its own.
//! 2. Categories: maximal runs of consecutive items with the same `major`
//!    are merged into a single band in the major column. Runs only ever
//!    join neighbours; equal majors separated by another category stay
//!    separate.
//!
//! Merge refusals from the surface never abort the layout. They are
//! collected in [`LayoutReport::diagnostics`].

use serde::Serialize;

use crate::cell::{CellFormat, CellValue, TextOverflow, VerticalAlignment};
use crate::columns::ColumnLayout;
use crate::item::{Field, TestItem};
use crate::reconcile::reconcile;
use crate::region::{MergedRegion, RowRange};
use crate::surface::{GridSurface, SurfaceError};

/// First data row (row 5 in the sheet; rows above it hold the header block).
pub const DEFAULT_START_ROW: usize = 4;

/// Rows in an Excel worksheet. Layouts must end at or before this row.
pub const MAX_SHEET_ROWS: usize = 1_048_576;

/// Formats handed to the surface.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutStyles {
    /// Every cell of every item row
    pub frame: CellFormat,
    /// Cells that receive a value
    pub body: CellFormat,
}

impl Default for LayoutStyles {
    fn default() -> Self {
        let frame = CellFormat::framed();
        let body = CellFormat {
            text_overflow: TextOverflow::Wrap,
            vertical_alignment: VerticalAlignment::Top,
            ..frame.clone()
        };
        Self { frame, body }
    }
}

impl LayoutStyles {
    pub fn with_font(mut self, family: &str, size: f64) -> Self {
        self.frame = self.frame.with_font(family, size);
        self.body = self.body.with_font(family, size);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOptions {
    /// Grouping identifier, the first part of every item ID
    pub group_id: String,
    /// Short test-type code, the middle part of every item ID
    pub test_type: String,
    pub start_row: usize,
    pub columns: ColumnLayout,
    pub styles: LayoutStyles,
    /// Written when an item has no classification
    pub default_classification: String,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            group_id: "ST01".to_string(),
            test_type: "IT2".to_string(),
            start_row: DEFAULT_START_ROW,
            columns: ColumnLayout::default(),
            styles: LayoutStyles::default(),
            default_classification: "Normal".to_string(),
        }
    }
}

impl LayoutOptions {
    /// `{group_id}-{test_type}-{ordinal}`, ordinal starting at 1.
    pub fn item_id(&self, ordinal: usize) -> String {
        format!("{}-{}-{}", self.group_id, self.test_type, ordinal)
    }
}

/// Rows given to one item. Computed once, reused by both passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridPlacement {
    /// 1-based position of the item in the input
    pub ordinal: usize,
    pub start_row: usize,
    pub row_count: usize,
}

impl GridPlacement {
    pub fn rows(&self) -> RowRange {
        RowRange::new(self.start_row, self.end_row())
    }

    pub fn end_row(&self) -> usize {
        self.start_row.saturating_add(self.row_count - 1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GridWrite {
    /// Apply the frame format to every column of `row`.
    Frame { row: usize },
    /// Write `value` into the first column of `field` at `row`.
    Value { row: usize, field: Field, value: CellValue },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MergeKind {
    /// A scalar field over all rows of one item
    Item,
    /// One row of a line field
    Line,
    /// The major column over a run of consecutive items
    Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MergeInstruction {
    pub field: Field,
    pub rows: RowRange,
    pub kind: MergeKind,
}

impl MergeInstruction {
    pub fn region(&self, columns: &ColumnLayout) -> MergedRegion {
        columns.region(self.field, self.rows)
    }
}

/// A maximal run of consecutive items sharing one major category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRun {
    pub major: String,
    /// Index of the first item of the run
    pub first_item: usize,
    pub item_count: usize,
    pub rows: RowRange,
}

impl CategoryRun {
    /// Single-row runs are already covered by their item merge.
    pub fn needs_merge(&self) -> bool {
        self.rows.len() > 1
    }
}

/// Everything the layout will do to a surface, computed without one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutPlan {
    pub placements: Vec<GridPlacement>,
    pub writes: Vec<GridWrite>,
    /// Item and line merges, in item order
    pub item_merges: Vec<MergeInstruction>,
    pub runs: Vec<CategoryRun>,
    pub category_merges: Vec<MergeInstruction>,
    /// Cursor after the last item
    pub next_row: usize,
}

impl LayoutPlan {
    /// Whether every planned row exists in an Excel worksheet. Cursors
    /// saturate instead of overflowing, so an oversized start row shows up
    /// here rather than as a panic.
    pub fn fits_sheet(&self) -> bool {
        self.next_row <= MAX_SHEET_ROWS
    }

    /// Merged regions a surface should end up with, sorted.
    ///
    /// Category bands replace the item merges of the major column inside
    /// them.
    pub fn expected_regions(&self, columns: &ColumnLayout) -> Vec<MergedRegion> {
        let bands: Vec<MergedRegion> = self
            .category_merges
            .iter()
            .map(|m| m.region(columns))
            .collect();
        let mut regions: Vec<MergedRegion> = self
            .item_merges
            .iter()
            .map(|m| m.region(columns))
            .filter(|r| !bands.iter().any(|b| b.encloses(r)))
            .collect();
        regions.extend(bands);
        regions.sort();
        regions
    }
}

/// Row placements for `items`, starting at `start_row`.
pub fn place(items: &[TestItem], start_row: usize) -> Vec<GridPlacement> {
    let mut cursor = start_row;
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let placement = GridPlacement {
                ordinal: idx + 1,
                start_row: cursor,
                row_count: item.row_count(),
            };
            cursor = cursor.saturating_add(placement.row_count);
            placement
        })
        .collect()
}

/// Group consecutive items with equal majors.
pub fn category_runs(items: &[TestItem], placements: &[GridPlacement]) -> Vec<CategoryRun> {
    let mut runs: Vec<CategoryRun> = Vec::new();
    for (idx, (item, placement)) in items.iter().zip(placements).enumerate() {
        match runs.last_mut() {
            Some(run) if run.major == item.major => {
                run.item_count += 1;
                run.rows.end = placement.end_row();
            }
            _ => runs.push(CategoryRun {
                major: item.major.clone(),
                first_item: idx,
                item_count: 1,
                rows: placement.rows(),
            }),
        }
    }
    runs
}

fn scalar_value(item: &TestItem, field: Field, options: &LayoutOptions) -> CellValue {
    let raw = match item.field(field) {
        "" if field == Field::Classification => options.default_classification.as_str(),
        raw => raw,
    };
    if field.is_date() {
        CellValue::date_or_text(raw)
    } else {
        CellValue::text(raw)
    }
}

/// Compute the full layout for `items`. Pure: no surface involved.
pub fn plan(items: &[TestItem], options: &LayoutOptions) -> LayoutPlan {
    let placements = place(items, options.start_row);
    let mut writes = Vec::new();
    let mut item_merges = Vec::new();

    for (idx, (item, placement)) in items.iter().zip(&placements).enumerate() {
        let start = placement.start_row;

        for row in placement.rows().iter() {
            writes.push(GridWrite::Frame { row });
        }

        for field in [Field::Steps, Field::Expected] {
            for (i, line) in item.lines(field).iter().enumerate() {
                let value = CellValue::text(line.as_str());
                if !value.is_empty() {
                    writes.push(GridWrite::Value { row: start.saturating_add(i), field, value });
                }
            }
        }

        writes.push(GridWrite::Value {
            row: start,
            field: Field::Id,
            value: CellValue::Text(options.item_id(placement.ordinal)),
        });

        // Only the first item of a run carries the major; the category band
        // merged over the run shows it for the rest.
        let starts_run = idx == 0 || items[idx - 1].major != item.major;
        if starts_run && !item.major.is_empty() {
            writes.push(GridWrite::Value {
                row: start,
                field: Field::Major,
                value: CellValue::Text(item.major.clone()),
            });
        }

        for field in Field::SCALAR {
            let value = scalar_value(item, field, options);
            if !value.is_empty() {
                writes.push(GridWrite::Value { row: start, field, value });
            }
        }

        for field in Field::ALL {
            if field.is_line() {
                for row in placement.rows().iter() {
                    item_merges.push(MergeInstruction {
                        field,
                        rows: RowRange::single(row),
                        kind: MergeKind::Line,
                    });
                }
            } else {
                item_merges.push(MergeInstruction {
                    field,
                    rows: placement.rows(),
                    kind: MergeKind::Item,
                });
            }
        }
    }

    let runs = category_runs(items, &placements);
    let category_merges = runs
        .iter()
        .filter(|run| run.needs_merge())
        .map(|run| MergeInstruction {
            field: Field::Major,
            rows: run.rows,
            kind: MergeKind::Category,
        })
        .collect();

    let next_row = placements
        .last()
        .map(|p| p.end_row().saturating_add(1))
        .unwrap_or(options.start_row);

    LayoutPlan {
        placements,
        writes,
        item_merges,
        runs,
        category_merges,
        next_row,
    }
}

/// What rendering a plan did to a surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutReport {
    pub items: usize,
    pub rows: usize,
    pub next_row: usize,
    pub values_written: usize,
    pub merges_applied: usize,
    /// Merges removed to make room for category bands
    pub merges_dissolved: usize,
    /// Swallowed merge/unmerge refusals, in the order they happened
    pub diagnostics: Vec<SurfaceError>,
}

impl LayoutReport {
    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("{} item{}", self.items, if self.items == 1 { "" } else { "s" }),
            format!("{} rows", self.rows),
            format!("{} merges", self.merges_applied),
        ];
        if !self.diagnostics.is_empty() {
            parts.push(format!("{} merge conflicts ignored", self.diagnostics.len()));
        }
        parts.join(", ")
    }

    fn swallow(&mut self, err: SurfaceError) {
        log::debug!("layout: ignoring surface refusal: {}", err);
        self.diagnostics.push(err);
    }
}

/// Render `plan` onto `surface`: writes, item merges, then category bands.
pub fn apply<S: GridSurface + ?Sized>(
    plan: &LayoutPlan,
    options: &LayoutOptions,
    surface: &mut S,
) -> LayoutReport {
    let columns = &options.columns;
    let styles = &options.styles;
    let last_col = columns.last_col();

    let mut report = LayoutReport {
        items: plan.placements.len(),
        rows: plan.placements.iter().map(|p| p.row_count).sum(),
        next_row: plan.next_row,
        ..LayoutReport::default()
    };

    for write in &plan.writes {
        match write {
            GridWrite::Frame { row } => {
                for col in 0..=last_col {
                    surface.apply_format(*row, col, &styles.frame);
                }
            }
            GridWrite::Value { row, field, value } => {
                let col = columns.col(*field);
                surface.write_value(*row, col, value.clone());
                surface.apply_format(*row, col, &styles.body);
                report.values_written += 1;
            }
        }
    }

    for merge in &plan.item_merges {
        match surface.merge(merge.region(columns)) {
            Ok(()) => report.merges_applied += 1,
            Err(e) => report.swallow(e),
        }
    }

    apply_category_merges(plan, options, surface, &mut report);
    report
}

/// The category pass on its own. Safe to repeat: bands that are already
/// in place are left alone.
pub fn apply_category_merges<S: GridSurface + ?Sized>(
    plan: &LayoutPlan,
    options: &LayoutOptions,
    surface: &mut S,
    report: &mut LayoutReport,
) {
    for merge in &plan.category_merges {
        let outcome = reconcile(surface, merge.region(&options.columns));
        report.merges_dissolved += outcome.dissolved.len();
        report.merges_applied = report.merges_applied.saturating_sub(outcome.dissolved.len());
        if outcome.merged {
            report.merges_applied += 1;
        }
        for err in outcome.errors {
            report.swallow(err);
        }
    }
}

/// Convenience wrapper owning the options.
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    options: LayoutOptions,
}

impl LayoutEngine {
    pub fn new(options: LayoutOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    pub fn plan(&self, items: &[TestItem]) -> LayoutPlan {
        plan(items, &self.options)
    }

    pub fn layout<S: GridSurface + ?Sized>(&self, items: &[TestItem], surface: &mut S) -> LayoutReport {
        let plan = self.plan(items);
        self.apply(&plan, surface)
    }

    /// Render a plan made by [`LayoutEngine::plan`].
    pub fn apply<S: GridSurface + ?Sized>(&self, plan: &LayoutPlan, surface: &mut S) -> LayoutReport {
        let report = apply(plan, &self.options, surface);
        log::info!(
            "layout: {} (rows {}..{})",
            report.summary(),
            self.options.start_row.saturating_add(1),
            report.next_row
        );
        report
    }
}
