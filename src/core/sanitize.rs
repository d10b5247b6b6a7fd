//! Context sanitization
//!
//! Caller-supplied context is arbitrary JSON. Before it is stored in an
//! event it is bounded in every dimension: string length, array length,
//! object width, and nesting depth. Sanitization never fails; pathological
//! input degrades to a smaller value, not an error.

use crate::core::event::Ctx;
use serde_json::Value;

/// Strings longer than this are truncated
pub const MAX_STRING_LEN: usize = 4000;
/// Arrays keep at most this many leading elements
pub const MAX_ARRAY_LEN: usize = 50;
/// Objects keep at most this many keys, in encountered order
pub const MAX_OBJECT_KEYS: usize = 100;
/// Recursion bound; owned JSON trees cannot alias, so depth is the only
/// unbounded dimension a caller can construct
pub const MAX_DEPTH: usize = 128;

/// Appended to truncated strings
pub const TRUNCATION_MARKER: char = '…';
/// Substituted where recursion is cut off
pub const RECURSION_MARKER: &str = "[Circular]";

/// Sanitize a full context map.
pub fn sanitize_ctx(ctx: Ctx) -> Ctx {
    match sanitize_value(Value::Object(ctx), MAX_DEPTH) {
        Value::Object(map) => map,
        // Depth 0 cannot be reached for a top-level object; kept total anyway.
        _ => Ctx::new(),
    }
}

/// Sanitize a single value, recursing with a shrinking depth allowance.
pub fn sanitize_value(value: Value, depth: usize) -> Value {
    if depth == 0 {
        return Value::String(RECURSION_MARKER.to_string());
    }

    match value {
        Value::String(s) => Value::String(truncate(s)),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .take(MAX_ARRAY_LEN)
                .map(|item| sanitize_value(item, depth - 1))
                .collect(),
        ),
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .take(MAX_OBJECT_KEYS)
                .map(|(key, field)| (key, sanitize_value(field, depth - 1)))
                .collect(),
        ),
        // Numbers, bools, and null pass through unchanged.
        scalar => scalar,
    }
}

fn truncate(s: String) -> String {
    if s.chars().count() <= MAX_STRING_LEN {
        return s;
    }
    let mut out: String = s.chars().take(MAX_STRING_LEN).collect();
    out.push(TRUNCATION_MARKER);
    out
}
