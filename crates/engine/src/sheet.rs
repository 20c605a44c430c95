use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cell::{Cell, CellFormat, CellValue};
use crate::region::MergedRegion;
use crate::surface::{GridSurface, SurfaceError};

/// In-memory grid surface: sparse cells plus a list of merged regions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    cells: FxHashMap<(usize, usize), Cell>,
    /// Used extent (one past the last touched row/column)
    pub rows: usize,
    pub cols: usize,
    /// Non-overlapping merged regions, in insertion order
    pub merged_regions: Vec<MergedRegion>,
}

impl Default for Sheet {
    fn default() -> Self {
        Self::new("Sheet1")
    }
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: FxHashMap::default(),
            rows: 0,
            cols: 0,
            merged_regions: Vec::new(),
        }
    }

    fn grow(&mut self, row: usize, col: usize) {
        self.rows = self.rows.max(row.saturating_add(1));
        self.cols = self.cols.max(col.saturating_add(1));
    }

    pub fn set_value(&mut self, row: usize, col: usize, value: CellValue) {
        self.grow(row, col);
        let cell = self.cells.entry((row, col)).or_insert_with(Cell::new);
        cell.value = value;
    }

    pub fn set_format(&mut self, row: usize, col: usize, format: CellFormat) {
        self.grow(row, col);
        let cell = self.cells.entry((row, col)).or_insert_with(Cell::new);
        cell.format = format;
    }

    pub fn get_display(&self, row: usize, col: usize) -> String {
        self.cells
            .get(&(row, col))
            .map(|c| c.value.raw_display())
            .unwrap_or_default()
    }

    pub fn get_format(&self, row: usize, col: usize) -> CellFormat {
        self.cells
            .get(&(row, col))
            .map(|c| c.format.clone())
            .unwrap_or_default()
    }

    pub fn cells_iter(&self) -> impl Iterator<Item = (&(usize, usize), &Cell)> {
        self.cells.iter()
    }

    /// Number of cells holding a value (formatted-only cells are not counted)
    pub fn value_count(&self) -> usize {
        self.cells.values().filter(|c| !c.value.is_empty()).count()
    }

    // =========================================================================
    // Merged regions
    // =========================================================================

    /// Add a merged region. Fails if it is inverted or overlaps an existing one.
    pub fn add_merge(&mut self, region: MergedRegion) -> Result<(), SurfaceError> {
        if !region.is_valid() {
            return Err(SurfaceError::InvalidRegion(region));
        }
        if let Some(existing) = self.merged_regions.iter().find(|m| m.overlaps(&region)) {
            return Err(SurfaceError::MergeConflict {
                requested: region,
                existing: *existing,
            });
        }
        self.grow(region.end.0, region.end.1);
        self.merged_regions.push(region);
        Ok(())
    }

    /// The merged region covering `(row, col)`, if any.
    pub fn get_merge(&self, row: usize, col: usize) -> Option<&MergedRegion> {
        self.merged_regions.iter().find(|m| m.contains(row, col))
    }

    pub fn is_merge_origin(&self, row: usize, col: usize) -> bool {
        self.merged_regions.iter().any(|m| m.start == (row, col))
    }

    /// True for cells covered by a merge but not at its origin.
    pub fn is_merge_hidden(&self, row: usize, col: usize) -> bool {
        self.get_merge(row, col).is_some_and(|m| m.start != (row, col))
    }

    /// Merged regions sorted by position, for stable comparisons.
    pub fn sorted_merges(&self) -> Vec<MergedRegion> {
        let mut merges = self.merged_regions.clone();
        merges.sort();
        merges
    }
}

impl GridSurface for Sheet {
    fn write_value(&mut self, row: usize, col: usize, value: CellValue) {
        self.set_value(row, col, value);
    }

    fn apply_format(&mut self, row: usize, col: usize, format: &CellFormat) {
        self.set_format(row, col, format.clone());
    }

    fn merge(&mut self, region: MergedRegion) -> Result<(), SurfaceError> {
        self.add_merge(region)
    }

    fn unmerge(&mut self, region: MergedRegion) -> Result<(), SurfaceError> {
        match self.merged_regions.iter().position(|m| *m == region) {
            Some(idx) => {
                self.merged_regions.remove(idx);
                Ok(())
            }
            None => Err(SurfaceError::UnmergeNotFound(region)),
        }
    }

    fn merges_within(&self, bounds: &MergedRegion) -> Vec<MergedRegion> {
        self.merged_regions
            .iter()
            .filter(|m| bounds.encloses(m))
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_value_grows_extent() {
        let mut sheet = Sheet::new("Items");
        sheet.set_value(4, 10, CellValue::text("x"));
        assert_eq!(sheet.rows, 5);
        assert_eq!(sheet.cols, 11);
        assert_eq!(sheet.get_display(4, 10), "x");
        assert_eq!(sheet.get_display(0, 0), "");
    }

    #[test]
    fn test_format_does_not_touch_value() {
        let mut sheet = Sheet::default();
        sheet.set_value(0, 0, CellValue::text("kept"));
        sheet.set_format(0, 0, CellFormat::framed());
        assert_eq!(sheet.get_display(0, 0), "kept");
        assert!(sheet.get_format(0, 0).has_border());
        assert_eq!(sheet.value_count(), 1);
    }

    #[test]
    fn test_add_merge_rejects_overlap() {
        let mut sheet = Sheet::default();
        sheet.add_merge(MergedRegion::new(4, 4, 5, 13)).unwrap();

        let err = sheet.add_merge(MergedRegion::new(5, 4, 5, 13)).unwrap_err();
        assert!(matches!(err, SurfaceError::MergeConflict { .. }));
        assert_eq!(sheet.merged_regions.len(), 1);

        // Adjacent, non-overlapping merge is fine
        sheet.add_merge(MergedRegion::new(6, 4, 6, 13)).unwrap();
        assert_eq!(sheet.merged_regions.len(), 2);
    }

    #[test]
    fn test_add_merge_rejects_inverted() {
        let mut sheet = Sheet::default();
        let err = sheet.add_merge(MergedRegion::new(5, 0, 4, 0)).unwrap_err();
        assert!(matches!(err, SurfaceError::InvalidRegion(_)));
    }

    #[test]
    fn test_unmerge_requires_exact_region() {
        let mut sheet = Sheet::default();
        let region = MergedRegion::new(4, 4, 5, 13);
        sheet.add_merge(region).unwrap();

        let err = sheet.unmerge(MergedRegion::new(4, 4, 4, 13)).unwrap_err();
        assert_eq!(err, SurfaceError::UnmergeNotFound(MergedRegion::new(4, 4, 4, 13)));

        sheet.unmerge(region).unwrap();
        assert!(sheet.merged_regions.is_empty());
    }

    #[test]
    fn test_merge_hidden_cells() {
        let mut sheet = Sheet::default();
        sheet.add_merge(MergedRegion::new(0, 0, 1, 2)).unwrap();
        assert!(sheet.is_merge_origin(0, 0));
        assert!(!sheet.is_merge_hidden(0, 0));
        assert!(sheet.is_merge_hidden(1, 2));
        assert!(!sheet.is_merge_hidden(2, 0));
    }

    #[test]
    fn test_merges_within_only_returns_enclosed() {
        let mut sheet = Sheet::default();
        sheet.add_merge(MergedRegion::new(4, 4, 4, 13)).unwrap();
        sheet.add_merge(MergedRegion::new(5, 4, 6, 13)).unwrap();
        sheet.add_merge(MergedRegion::new(7, 4, 8, 13)).unwrap();

        let bounds = MergedRegion::new(4, 4, 7, 13);
        assert_eq!(
            sheet.merges_within(&bounds),
            vec![MergedRegion::new(4, 4, 4, 13), MergedRegion::new(5, 4, 6, 13)]
        );
    }
}
