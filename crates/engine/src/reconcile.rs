//! Region reconciliation: make a surface hold exactly one merge over a
//! target rectangle, dissolving whatever smaller merges sit inside it.
//!
//! Surfaces refuse overlapping merges, so widening a set of per-row merges
//! into one band has to unmerge them first. Only the delta is applied: a
//! target that is already merged is left untouched.

use crate::region::MergedRegion;
use crate::surface::{GridSurface, SurfaceError};

/// What a reconciliation changed on the surface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Regions removed because they sat inside the target.
    pub dissolved: Vec<MergedRegion>,
    /// Whether the target merge was added.
    pub merged: bool,
    /// Refusals from the surface. Never fatal.
    pub errors: Vec<SurfaceError>,
}

impl Reconciliation {
    pub fn is_noop(&self) -> bool {
        self.dissolved.is_empty() && !self.merged && self.errors.is_empty()
    }
}

pub fn reconcile<S: GridSurface + ?Sized>(surface: &mut S, target: MergedRegion) -> Reconciliation {
    let mut outcome = Reconciliation::default();

    let current = surface.merges_within(&target);
    if current.as_slice() == [target] {
        return outcome;
    }

    for region in current {
        match surface.unmerge(region) {
            Ok(()) => outcome.dissolved.push(region),
            Err(e) => outcome.errors.push(e),
        }
    }

    // A region straddling the target edge survives the sweep above; the
    // surface then refuses the merge and the conflict is recorded.
    match surface.merge(target) {
        Ok(()) => outcome.merged = true,
        Err(e) => outcome.errors.push(e),
    }

    outcome
}
