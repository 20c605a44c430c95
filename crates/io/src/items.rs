// Test item input: a JSON array of items, or an object with an `items` array.

use std::path::Path;

use serde_json::Value;
use testbook_engine::TestItem;

const SHAPE_ERROR: &str = "expected an array of items or an object with an \"items\" array";

pub fn load_items(path: &Path) -> Result<Vec<TestItem>, String> {
    let content = std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    parse_items(&content).map_err(|e| format!("{}: {}", path.display(), e))
}

pub fn parse_items(content: &str) -> Result<Vec<TestItem>, String> {
    let value: Value = serde_json::from_str(content).map_err(|e| format!("invalid JSON: {}", e))?;
    let list = match value {
        Value::Array(list) => list,
        Value::Object(mut map) => match map.remove("items") {
            Some(Value::Array(list)) => list,
            _ => return Err(SHAPE_ERROR.to_string()),
        },
        _ => return Err(SHAPE_ERROR.to_string()),
    };

    // Item by item so errors name the offending index
    list.into_iter()
        .enumerate()
        .map(|(i, item)| serde_json::from_value(item).map_err(|e| format!("item {}: {}", i + 1, e)))
        .collect()
}
