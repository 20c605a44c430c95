//! Field → column span mapping for the test-item sheet.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::item::Field;
use crate::region::{col_to_letters, MergedRegion, RowRange};

/// Inclusive, zero-based column span of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpan {
    pub start: usize,
    pub end: usize,
}

impl ColumnSpan {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn width(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn overlaps(&self, other: &ColumnSpan) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Letters form, e.g. `E:N`.
    pub fn letters(&self) -> String {
        format!("{}:{}", col_to_letters(self.start), col_to_letters(self.end))
    }
}

/// Column spans for every field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    spans: BTreeMap<Field, ColumnSpan>,
}

impl Default for ColumnLayout {
    /// The established test-item sheet: ID in A:D, major category in E:N,
    /// ... notes in DO:DW.
    fn default() -> Self {
        let spans = [
            (Field::Id, ColumnSpan::new(0, 3)),                 // A:D
            (Field::Major, ColumnSpan::new(4, 13)),             // E:N
            (Field::Medium, ColumnSpan::new(14, 23)),           // O:X
            (Field::Minor, ColumnSpan::new(24, 33)),            // Y:AH
            (Field::Classification, ColumnSpan::new(34, 43)),   // AI:AR
            (Field::Spec, ColumnSpan::new(44, 55)),             // AS:BD
            (Field::Viewpoint, ColumnSpan::new(56, 67)),        // BE:BP
            (Field::Precondition, ColumnSpan::new(68, 80)),     // BQ:CC
            (Field::Steps, ColumnSpan::new(81, 89)),            // CD:CL
            (Field::Expected, ColumnSpan::new(90, 102)),        // CM:CY
            (Field::Result, ColumnSpan::new(103, 105)),         // CZ:DB
            (Field::ExecutedOn, ColumnSpan::new(106, 108)),     // DC:DE
            (Field::ExecutedBy, ColumnSpan::new(109, 111)),     // DF:DH
            (Field::CheckedOn, ColumnSpan::new(112, 114)),      // DI:DK
            (Field::CheckedBy, ColumnSpan::new(115, 117)),      // DL:DN
            (Field::Note, ColumnSpan::new(118, 126)),           // DO:DW
        ];
        Self {
            spans: spans.into_iter().collect(),
        }
    }
}

impl ColumnLayout {
    /// Replace the span of one field. Call `validate` once all overrides
    /// are in.
    pub fn set(&mut self, field: Field, span: ColumnSpan) {
        self.spans.insert(field, span);
    }

    pub fn span(&self, field: Field) -> ColumnSpan {
        // Every field is inserted by Default and `set` only replaces.
        self.spans[&field]
    }

    /// First column of a field: where its value is written.
    pub fn col(&self, field: Field) -> usize {
        self.span(field).start
    }

    pub fn last_col(&self) -> usize {
        self.spans.values().map(|s| s.end).max().unwrap_or(0)
    }

    /// Region covering `field`'s columns over `rows`.
    pub fn region(&self, field: Field, rows: RowRange) -> MergedRegion {
        let span = self.span(field);
        MergedRegion::from_spans(rows, (span.start, span.end))
    }

    pub fn spans(&self) -> impl Iterator<Item = (Field, ColumnSpan)> + '_ {
        self.spans.iter().map(|(f, s)| (*f, *s))
    }

    /// Spans must be ordered and must not overlap each other.
    pub fn validate(&self) -> Result<(), String> {
        for (field, span) in self.spans() {
            if span.start > span.end {
                return Err(format!("{field}: span {} is inverted", span.letters()));
            }
        }
        let mut sorted: Vec<(Field, ColumnSpan)> = self.spans().collect();
        sorted.sort_by_key(|(_, s)| s.start);
        for pair in sorted.windows(2) {
            let (a, sa) = pair[0];
            let (b, sb) = pair[1];
            if sa.overlaps(&sb) {
                return Err(format!(
                    "{a} ({}) overlaps {b} ({})",
                    sa.letters(),
                    sb.letters()
                ));
            }
        }
        Ok(())
    }
}
