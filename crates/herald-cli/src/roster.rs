use std::{fs, path::Path};

use anyhow::Context;
use herald::{RawAge, RawEntity};
use serde_json::{Map, Value};

/// The roster greeted when no input file is given.
pub const DEFAULT_ROSTER: [(&str, i64); 4] =
    [("John", 30), ("Michael", 13), ("Mery", 60), ("Chris", 45)];

pub fn default_roster() -> Vec<RawEntity> {
    DEFAULT_ROSTER.into_iter().map(RawEntity::from).collect()
}

/// Reads a JSON array of raw records from `path`.
///
/// Only the array itself must be well formed. Each element is converted on
/// its own: unknown attributes (e.g. `last_name`) are ignored, and missing or
/// ill-typed ones are left for the dispatcher's validation to report against
/// that record.
pub fn load(path: &Path) -> anyhow::Result<Vec<RawEntity>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read input file {}", path.display()))?;
    parse(&raw).with_context(|| format!("failed to parse input file {}", path.display()))
}

fn parse(raw: &str) -> anyhow::Result<Vec<RawEntity>> {
    let records: Vec<Value> = serde_json::from_str(raw)?;
    Ok(records.iter().map(to_raw_entity).collect())
}

fn to_raw_entity(record: &Value) -> RawEntity {
    let Some(fields) = record.as_object() else {
        return RawEntity::default();
    };
    RawEntity {
        first_name: fields
            .get("first_name")
            .and_then(Value::as_str)
            .map(str::to_owned),
        age: raw_age(fields),
    }
}

/// Whole numbers (including `30.0`) pass through; anything else is kept as
/// text so validation can name it.
fn raw_age(fields: &Map<String, Value>) -> Option<RawAge> {
    match fields.get("age")? {
        Value::Null => None,
        Value::Number(n) => Some(match n.as_i64() {
            Some(age) => RawAge::Number(age),
            None => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                    RawAge::Number(f as i64)
                }
                _ => RawAge::Text(n.to_string()),
            },
        }),
        Value::String(text) => Some(RawAge::Text(text.clone())),
        other => Some(RawAge::Text(other.to_string())),
    }
}
