//! `testbook-engine`: test-item sheet layout.
//!
//! Pure crate: item records in, cell writes and merged regions out, rendered
//! onto any [`surface::GridSurface`]. No file IO.

pub mod cell;
pub mod columns;
pub mod item;
pub mod layout;
pub mod reconcile;
pub mod region;
pub mod sheet;
pub mod surface;

pub use columns::{ColumnLayout, ColumnSpan};
pub use item::{Field, TestItem};
pub use layout::{LayoutEngine, LayoutOptions, LayoutPlan, LayoutReport};
pub use region::{MergedRegion, RowRange};
pub use sheet::Sheet;
pub use surface::{GridSurface, SurfaceError};
