//! Typed field access over loosely structured JSON payloads.
//!
//! Message payloads in the log change shape between record types and client
//! versions. Every accessor here returns `None` on absence *or* type mismatch
//! and never panics; the `*_or_*` variants give the zero value instead.

use serde_json::{Map, Value};

/// String field, if present and a string.
pub fn get_str<'a>(doc: &'a Value, key: &str) -> Option<&'a str> {
    doc.get(key).and_then(Value::as_str)
}

/// Boolean field, if present and a bool.
pub fn get_bool(doc: &Value, key: &str) -> Option<bool> {
    doc.get(key).and_then(Value::as_bool)
}

/// Integer field, if present and numeric.
///
/// Floats are truncated, matching how token counters are sometimes written.
pub fn get_i64(doc: &Value, key: &str) -> Option<i64> {
    let value = doc.get(key)?;
    value
        .as_i64()
        .or_else(|| value.as_u64().map(|v| v.min(i64::MAX as u64) as i64))
        .or_else(|| value.as_f64().map(|v| v as i64))
}

/// Array field, if present and an array.
pub fn get_array<'a>(doc: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    doc.get(key).and_then(Value::as_array)
}

/// Object field, if present and an object.
pub fn get_object<'a>(doc: &'a Value, key: &str) -> Option<&'a Map<String, Value>> {
    doc.get(key).and_then(Value::as_object)
}

pub fn str_or_empty<'a>(doc: &'a Value, key: &str) -> &'a str {
    get_str(doc, key).unwrap_or("")
}

pub fn bool_or_false(doc: &Value, key: &str) -> bool {
    get_bool(doc, key).unwrap_or(false)
}

pub fn i64_or_zero(doc: &Value, key: &str) -> i64 {
    get_i64(doc, key).unwrap_or(0)
}
