// Document settings for a rendered test-item sheet
// Loaded from a TOML file passed on the command line

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use testbook_engine::columns::ColumnSpan;
use testbook_engine::layout::{LayoutStyles, MAX_SHEET_ROWS};
use testbook_engine::region::letters_to_col;
use testbook_engine::{ColumnLayout, Field, LayoutOptions};

use crate::error::ConfigError;

/// Font applied to every laid-out cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSettings {
    pub name: String,
    pub size: f64,
}

/// Column widths in Excel character units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidthSettings {
    /// Column A
    pub first: f64,
    /// The remaining columns of the ID span
    pub id_rest: f64,
    /// Every other column up to the last laid-out one
    pub default: f64,
}

impl Default for WidthSettings {
    fn default() -> Self {
        Self {
            first: 14.0,
            id_rest: 3.0,
            default: 4.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentSettings {
    pub group_id: String,
    pub test_type: String,
    pub sheet_name: String,
    /// First item row, 1-based as shown in the spreadsheet
    pub start_row: usize,
    pub default_classification: String,
    /// Header rows kept visible while scrolling (0 = none)
    pub freeze_rows: usize,
    pub font: Option<FontSettings>,
    /// Field key → letter span (`"DO:DW"`, or `"A"` for one column)
    pub columns: BTreeMap<String, String>,
    pub widths: WidthSettings,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        let options = LayoutOptions::default();
        Self {
            group_id: options.group_id,
            test_type: options.test_type,
            sheet_name: "Test Items".to_string(),
            start_row: options.start_row + 1,
            default_classification: options.default_classification,
            freeze_rows: 0,
            font: None,
            columns: BTreeMap::new(),
            widths: WidthSettings::default(),
        }
    }
}

impl DocumentSettings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        let settings = Self::from_toml_str(&content)?;
        log::debug!("config: loaded {}", path.display());
        Ok(settings)
    }

    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let settings: DocumentSettings = toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        check_start_row(settings.start_row)?;
        Ok(settings)
    }

    /// Default column layout with the `[columns]` overrides applied and
    /// validated.
    pub fn column_layout(&self) -> Result<ColumnLayout, ConfigError> {
        let mut columns = ColumnLayout::default();
        for (key, value) in &self.columns {
            let invalid = |reason: String| ConfigError::InvalidColumn {
                key: key.clone(),
                value: value.clone(),
                reason,
            };
            let field: Field = key.parse().map_err(invalid)?;
            let span = parse_letter_span(value).ok_or_else(|| invalid("expected letters like \"DO:DW\"".to_string()))?;
            columns.set(field, span);
        }
        columns.validate().map_err(ConfigError::InvalidLayout)?;
        Ok(columns)
    }

    pub fn to_layout_options(&self) -> Result<LayoutOptions, ConfigError> {
        check_start_row(self.start_row)?;
        let mut styles = LayoutStyles::default();
        if let Some(font) = &self.font {
            styles = styles.with_font(&font.name, font.size);
        }
        Ok(LayoutOptions {
            group_id: self.group_id.clone(),
            test_type: self.test_type.clone(),
            start_row: self.start_row - 1,
            columns: self.column_layout()?,
            styles,
            default_classification: self.default_classification.clone(),
        })
    }

    /// Width of every column from A through the layout's last column.
    pub fn column_widths(&self, columns: &ColumnLayout) -> BTreeMap<usize, f64> {
        let id_end = columns.span(Field::Id).end;
        (0..=columns.last_col())
            .map(|col| {
                let width = if col == 0 {
                    self.widths.first
                } else if col <= id_end {
                    self.widths.id_rest
                } else {
                    self.widths.default
                };
                (col, width)
            })
            .collect()
    }
}

/// 1-based sheet row of the first item: a row Excel has.
fn check_start_row(start_row: usize) -> Result<(), ConfigError> {
    if (1..=MAX_SHEET_ROWS).contains(&start_row) {
        Ok(())
    } else {
        Err(ConfigError::InvalidStartRow(start_row))
    }
}

/// `"DO:DW"` or `"A"` → inclusive column span.
fn parse_letter_span(value: &str) -> Option<ColumnSpan> {
    let (first, last) = value.split_once(':').unwrap_or((value, value));
    let start = letters_to_col(first.trim())?;
    let end = letters_to_col(last.trim())?;
    Some(ColumnSpan::new(start, end))
}
