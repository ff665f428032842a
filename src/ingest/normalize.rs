// src/ingest/normalize.rs
//! Payload shape handling: optional wrapper key, per-element validation.

use serde_json::Value;

use super::types::RawIngestItem;
use crate::error::IngestError;

/// Some producers wrap the item array as `{"=": [...]}`.
pub const WRAPPER_KEY: &str = "=";

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Unwrap the optional sentinel key and validate every element, preserving order.
/// All-or-nothing: the first invalid element fails the whole payload.
pub fn normalize(payload: Value) -> Result<Vec<RawIngestItem>, IngestError> {
    let elements = match payload {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove(WRAPPER_KEY) {
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(IngestError::validation(
                    None,
                    format!("`{WRAPPER_KEY}` must wrap an array, got {}", json_kind(&other)),
                ))
            }
            None => {
                return Err(IngestError::validation(
                    None,
                    format!("expected an array of items or an object wrapping one under `{WRAPPER_KEY}`"),
                ))
            }
        },
        other => {
            return Err(IngestError::validation(
                None,
                format!("expected an array of items, got {}", json_kind(&other)),
            ))
        }
    };

    elements
        .into_iter()
        .enumerate()
        .map(|(index, v)| {
            if !v.is_object() {
                return Err(IngestError::validation(
                    Some(index),
                    format!("expected an object, got {}", json_kind(&v)),
                ));
            }
            serde_json::from_value::<RawIngestItem>(v)
                .map_err(|e| IngestError::validation(Some(index), e.to_string()))
        })
        .collect()
}
