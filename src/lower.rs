//! Lowering of parsed JSON documents into runtime values.
//!
//! JSON has no callables, bytes or timestamps, so only a subset of `Value` is
//! reachable from here. Objects become `Dict`s keyed by strings, except an
//! object tagged with a string `"$type"` member, which becomes a nested
//! `Record` of that type.
use indexmap::IndexMap;
use serde_json::{Map, Number};
use thiserror::Error;

use crate::value::{RecordValue, Value};

/// Member naming the nominal type of a nested record.
pub const TYPE_TAG: &str = "$type";

#[derive(Debug, Error)]
pub enum LowerError {
    #[error("expected a JSON object for record `{record}`, found {found}")]
    NotAnObject { record: String, found: &'static str },
}

pub fn lower(v: &serde_json::Value) -> Value {
    match v {
        serde_json::Value::Null => Value::None,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => lower_number(n),
        serde_json::Value::String(s) => Value::Str(s.clone()),
        serde_json::Value::Array(xs) => Value::List(xs.iter().map(lower).collect()),
        serde_json::Value::Object(m) => match m.get(TYPE_TAG).and_then(|t| t.as_str()) {
            Some(type_name) => Value::Record(lower_fields(type_name, m)),
            None => Value::Dict(
                m.iter().map(|(k, v)| (Value::Str(k.clone()), lower(v))).collect(),
            ),
        },
    }
}

/// Lower a top-level document as a record of type `type_name`.
pub fn lower_record(type_name: &str, v: &serde_json::Value) -> Result<RecordValue, LowerError> {
    match v {
        serde_json::Value::Object(m) => Ok(lower_fields(type_name, m)),
        other => Err(LowerError::NotAnObject {
            record: type_name.to_string(),
            found: json_kind(other),
        }),
    }
}

fn lower_fields(type_name: &str, m: &Map<String, serde_json::Value>) -> RecordValue {
    let fields: IndexMap<String, Value> = m
        .iter()
        .filter(|(k, _)| k.as_str() != TYPE_TAG)
        .map(|(k, v)| (k.clone(), lower(v)))
        .collect();
    RecordValue { type_name: type_name.to_string(), fields }
}

// integers outside i64 (large u64) fall back to Float
fn lower_number(n: &Number) -> Value {
    match n.as_i64() {
        Some(i) => Value::Int(i),
        None => Value::from(n.as_f64().unwrap_or(f64::NAN)),
    }
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
