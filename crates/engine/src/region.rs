//! Rectangular cell regions and A1-style addressing.
//!
//! Coordinates are zero-based `(row, col)` pairs everywhere in the engine.
//! Letters only show up when a region is displayed.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A merged rectangle, stored by its top-left and bottom-right corners
/// (both inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MergedRegion {
    pub start: (usize, usize),
    pub end: (usize, usize),
}

impl MergedRegion {
    pub fn new(start_row: usize, start_col: usize, end_row: usize, end_col: usize) -> Self {
        Self {
            start: (start_row, start_col),
            end: (end_row, end_col),
        }
    }

    /// Region covering `rows` over the inclusive column span `cols`.
    pub fn from_spans(rows: RowRange, cols: (usize, usize)) -> Self {
        Self::new(rows.start, cols.0, rows.end, cols.1)
    }

    pub fn is_valid(&self) -> bool {
        self.start.0 <= self.end.0 && self.start.1 <= self.end.1
    }

    pub fn rows(&self) -> RowRange {
        RowRange::new(self.start.0, self.end.0)
    }

    pub fn is_single_cell(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.start.0 && row <= self.end.0 && col >= self.start.1 && col <= self.end.1
    }

    /// True when `other` lies entirely inside this region.
    pub fn encloses(&self, other: &MergedRegion) -> bool {
        self.contains(other.start.0, other.start.1) && self.contains(other.end.0, other.end.1)
    }

    pub fn overlaps(&self, other: &MergedRegion) -> bool {
        self.start.0 <= other.end.0
            && other.start.0 <= self.end.0
            && self.start.1 <= other.end.1
            && other.start.1 <= self.end.1
    }

    /// A1 reference, e.g. `E5:N6`.
    pub fn a1(&self) -> String {
        format!("{}:{}", cell_ref(self.start.0, self.start.1), cell_ref(self.end.0, self.end.1))
    }
}

impl fmt::Display for MergedRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.a1())
    }
}

/// Inclusive range of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowRange {
    pub start: usize,
    pub end: usize,
}

// Never empty: a range covers at least one row.
#[allow(clippy::len_without_is_empty)]
impl RowRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(row: usize) -> Self {
        Self { start: row, end: row }
    }

    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn iter(&self) -> std::ops::RangeInclusive<usize> {
        self.start..=self.end
    }
}

impl fmt::Display for RowRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start.saturating_add(1), self.end.saturating_add(1))
    }
}

/// Convert 0-based column index to Excel-style letter(s).
pub fn col_to_letters(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// Parse Excel-style column letters (case-insensitive) into a 0-based index.
pub fn letters_to_col(letters: &str) -> Option<usize> {
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }
    let mut col = 0usize;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        col = col * 26 + (ch.to_ascii_uppercase() as u8 - b'A') as usize + 1;
    }
    Some(col - 1)
}

/// Cell reference like `A1` for a zero-based coordinate.
pub fn cell_ref(row: usize, col: usize) -> String {
    format!("{}{}", col_to_letters(col), row.saturating_add(1))
}

/// Parse an A1 range like `E5:N6` (or a single cell `E5`) into a region.
pub fn parse_a1_range(s: &str) -> Option<MergedRegion> {
    let (first, last) = match s.split_once(':') {
        Some((a, b)) => (a, b),
        None => (s, s),
    };
    let (r0, c0) = parse_cell_ref(first)?;
    let (r1, c1) = parse_cell_ref(last)?;
    Some(MergedRegion::new(r0, c0, r1, c1))
}

fn parse_cell_ref(s: &str) -> Option<(usize, usize)> {
    let s = s.trim().trim_start_matches('$');
    let split = s.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = s.split_at(split);
    let col = letters_to_col(letters.trim_end_matches('$'))?;
    let row: usize = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, col))
}
