//! The grid surface the layout renders onto.

use std::fmt;

use crate::cell::{CellFormat, CellValue};
use crate::region::MergedRegion;

/// Why a surface refused a merge or unmerge request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// The requested region overlaps an existing merged region.
    MergeConflict { requested: MergedRegion, existing: MergedRegion },
    /// The requested region is not currently merged.
    UnmergeNotFound(MergedRegion),
    /// Start corner lies after the end corner.
    InvalidRegion(MergedRegion),
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MergeConflict { requested, existing } => {
                write!(f, "merge {requested} overlaps existing merge {existing}")
            }
            Self::UnmergeNotFound(region) => write!(f, "no merged region {region} to unmerge"),
            Self::InvalidRegion(region) => write!(f, "invalid region {region}"),
        }
    }
}

impl std::error::Error for SurfaceError {}

/// A cell-addressable grid: values, per-cell formats and merged regions.
///
/// Merges must not overlap; surfaces report violations instead of
/// silently stacking regions.
pub trait GridSurface {
    fn write_value(&mut self, row: usize, col: usize, value: CellValue);

    fn apply_format(&mut self, row: usize, col: usize, format: &CellFormat);

    fn merge(&mut self, region: MergedRegion) -> Result<(), SurfaceError>;

    /// Remove the merged region exactly matching `region`.
    fn unmerge(&mut self, region: MergedRegion) -> Result<(), SurfaceError>;

    /// Merged regions lying entirely inside `bounds`.
    fn merges_within(&self, bounds: &MergedRegion) -> Vec<MergedRegion>;
}
