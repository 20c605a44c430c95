//! Test items: the records the layout renders, and the sheet columns
//! (fields) their values land in.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One column group of the test-item sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Id,
    Major,
    Medium,
    Minor,
    #[serde(alias = "type")]
    Classification,
    Spec,
    Viewpoint,
    Precondition,
    Steps,
    Expected,
    Result,
    ExecutedOn,
    ExecutedBy,
    CheckedOn,
    CheckedBy,
    Note,
}

impl Field {
    /// Every field, in sheet column order.
    pub const ALL: [Field; 16] = [
        Field::Id,
        Field::Major,
        Field::Medium,
        Field::Minor,
        Field::Classification,
        Field::Spec,
        Field::Viewpoint,
        Field::Precondition,
        Field::Steps,
        Field::Expected,
        Field::Result,
        Field::ExecutedOn,
        Field::ExecutedBy,
        Field::CheckedOn,
        Field::CheckedBy,
        Field::Note,
    ];

    /// Fields carried in `TestItem::fields`, written once per item.
    pub const SCALAR: [Field; 12] = [
        Field::Medium,
        Field::Minor,
        Field::Classification,
        Field::Spec,
        Field::Viewpoint,
        Field::Precondition,
        Field::Result,
        Field::ExecutedOn,
        Field::ExecutedBy,
        Field::CheckedOn,
        Field::CheckedBy,
        Field::Note,
    ];

    /// Line fields hold one entry per row instead of one value per item.
    pub fn is_line(self) -> bool {
        matches!(self, Field::Steps | Field::Expected)
    }

    /// Fields whose values are dates when they parse as one.
    pub fn is_date(self) -> bool {
        matches!(self, Field::ExecutedOn | Field::CheckedOn)
    }

    pub fn key(self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::Major => "major",
            Field::Medium => "medium",
            Field::Minor => "minor",
            Field::Classification => "classification",
            Field::Spec => "spec",
            Field::Viewpoint => "viewpoint",
            Field::Precondition => "precondition",
            Field::Steps => "steps",
            Field::Expected => "expected",
            Field::Result => "result",
            Field::ExecutedOn => "executed_on",
            Field::ExecutedBy => "executed_by",
            Field::CheckedOn => "checked_on",
            Field::CheckedBy => "checked_by",
            Field::Note => "note",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        if key == "type" {
            return Ok(Field::Classification);
        }
        Field::ALL
            .into_iter()
            .find(|f| f.key() == key)
            .ok_or_else(|| format!("unknown field '{s}'"))
    }
}

/// One test case record.
///
/// `steps` and `expected` are independent sequences; the item occupies as
/// many rows as the longer of the two, and never fewer than one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestItem {
    #[serde(default)]
    pub major: String,
    #[serde(flatten)]
    pub fields: BTreeMap<Field, String>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub expected: Vec<String>,
}

impl TestItem {
    pub fn new(major: impl Into<String>) -> Self {
        Self {
            major: major.into(),
            ..Self::default()
        }
    }

    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.fields.insert(field, value.into());
        self
    }

    pub fn with_steps<I, S>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.steps = steps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_expected<I, S>(mut self, expected: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expected = expected.into_iter().map(Into::into).collect();
        self
    }

    /// Scalar value for `field`; empty when absent.
    pub fn field(&self, field: Field) -> &str {
        self.fields.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn row_count(&self) -> usize {
        self.steps.len().max(self.expected.len()).max(1)
    }

    /// The entries of a line field.
    pub fn lines(&self, field: Field) -> &[String] {
        match field {
            Field::Steps => &self.steps,
            Field::Expected => &self.expected,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_count_floor_is_one() {
        assert_eq!(TestItem::new("X").row_count(), 1);
        assert_eq!(TestItem::new("X").with_steps(["a", "b", "c"]).row_count(), 3);
        assert_eq!(TestItem::new("X").with_expected(["a", "b"]).with_steps(["a"]).row_count(), 2);
    }

    #[test]
    fn test_field_from_str() {
        assert_eq!("medium".parse::<Field>(), Ok(Field::Medium));
        assert_eq!("Executed-On".parse::<Field>(), Ok(Field::ExecutedOn));
        assert_eq!("type".parse::<Field>(), Ok(Field::Classification));
        assert!("colour".parse::<Field>().is_err());
    }

    #[test]
    fn test_scalar_fields_exclude_structural_ones() {
        for field in Field::SCALAR {
            assert!(!field.is_line());
            assert_ne!(field, Field::Id);
            assert_ne!(field, Field::Major);
        }
    }

    #[test]
    fn test_item_deserializes_from_record_json() {
        let json = r#"{
            "major": "Group copy",
            "medium": "Response time",
            "type": "Normal",
            "spec": "POST /api/test-groups",
            "steps": ["1. Run the copy API"],
            "expected": ["Completes within 3s", "Copy is listed"],
            "note": "JMeter"
        }"#;
        let item: TestItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.major, "Group copy");
        assert_eq!(item.field(Field::Medium), "Response time");
        assert_eq!(item.field(Field::Classification), "Normal");
        assert_eq!(item.field(Field::Minor), "");
        assert_eq!(item.steps.len(), 1);
        assert_eq!(item.row_count(), 2);
    }

    #[test]
    fn test_item_rejects_unknown_keys() {
        let json = r#"{"major": "X", "colour": "red"}"#;
        assert!(serde_json::from_str::<TestItem>(json).is_err());
    }
}
