//! Schema-tolerant normalization of raw JSON records into [`LogEvent`]s.
//!
//! Each canonical field is resolved through an ordered chain of key paths.
//! The first candidate holding a present value wins; `null` and blank strings
//! count as absent. Coercion happens after resolution and never fails: an
//! unusable value simply leaves the field unknown.

use crate::event::LogEvent;
use crate::timestamp::parse_timestamp;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// A path of nested object keys, e.g. `["request", "method"]`.
pub type KeyPath = &'static [&'static str];

/// Per-field fallback chains, in priority order.
pub mod fields {
    use super::KeyPath;

    pub const TIMESTAMP: &[KeyPath] = &[&["timestamp"], &["time"], &["meta", "timestamp"]];
    pub const LEVEL: &[KeyPath] = &[&["level"], &["severity"]];
    pub const EVENT_TYPE: &[KeyPath] = &[&["event_type"], &["type"]];
    pub const METHOD: &[KeyPath] = &[&["method"], &["request", "method"], &["http", "method"]];
    pub const PATH: &[KeyPath] = &[
        &["path"],
        &["request", "path"],
        &["http", "path"],
        &["endpoint"],
    ];
    pub const STATUS_CODE: &[KeyPath] = &[
        &["status_code"],
        &["status"],
        &["response", "status_code"],
        &["http", "status"],
    ];
    pub const DURATION_MS: &[KeyPath] = &[
        &["duration_ms"],
        &["latency_ms"],
        &["response_time_ms"],
        &["timing", "duration_ms"],
    ];
    pub const IS_AUTHENTICATED: &[KeyPath] = &[
        &["is_authenticated"],
        &["authenticated"],
        &["auth", "is_authenticated"],
    ];
    pub const USER_ID: &[KeyPath] = &[&["user_id"], &["user", "id"]];
    pub const ERROR_TYPE: &[KeyPath] = &[&["error_type"]];
    pub const ERROR_MESSAGE: &[KeyPath] = &[&["error_message"]];
}

/// Parse one store line. Anything that is not a JSON object is dropped.
pub fn parse_line(line: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => {
            tracing::trace!("dropping non-object line");
            None
        }
        Err(e) => {
            tracing::trace!(error = %e, "dropping unparsable line");
            None
        }
    }
}

/// Normalize a raw record. Returns `None` when no parseable timestamp exists.
pub fn normalize(raw: &Map<String, Value>) -> Option<LogEvent> {
    let timestamp = resolve(raw, fields::TIMESTAMP).and_then(as_timestamp)?;

    Some(LogEvent {
        timestamp,
        level: resolve(raw, fields::LEVEL).and_then(as_text).unwrap_or_default(),
        event_type: resolve(raw, fields::EVENT_TYPE)
            .and_then(as_text)
            .unwrap_or_default(),
        method: resolve(raw, fields::METHOD).and_then(as_text),
        path: resolve(raw, fields::PATH).and_then(as_text),
        status_code: resolve(raw, fields::STATUS_CODE).and_then(as_int),
        duration_ms: resolve(raw, fields::DURATION_MS).and_then(as_float),
        user_id: resolve(raw, fields::USER_ID).and_then(as_int),
        is_authenticated: resolve(raw, fields::IS_AUTHENTICATED).and_then(as_bool),
        error_type: resolve(raw, fields::ERROR_TYPE).and_then(as_text),
        error_message: resolve(raw, fields::ERROR_MESSAGE).and_then(as_text),
    })
}

/// First present value along `chain`.
pub fn resolve<'a>(raw: &'a Map<String, Value>, chain: &[KeyPath]) -> Option<&'a Value> {
    chain
        .iter()
        .filter_map(|path| lookup(raw, path))
        .find(|v| is_present(v))
}

fn lookup<'a>(raw: &'a Map<String, Value>, path: KeyPath) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut cur = raw.get(*first)?;
    for key in rest {
        cur = cur.as_object()?.get(*key)?;
    }
    Some(cur)
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

// ── Coercion ──────────────────────────────────────────────────

fn as_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value.as_str().and_then(parse_timestamp)
}

/// Scalars become text; objects and arrays do not.
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Integers pass through, finite floats truncate toward zero, strings must
/// spell an integer.
pub fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

pub fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Tri-state: literal booleans pass through; a fixed vocabulary of strings and
/// the numbers 0/1 map to true/false; anything else is unknown.
pub fn as_bool(value: &Value) -> Option<bool> {
    let text = match value {
        Value::Bool(b) => return Some(*b),
        Value::String(s) => s.trim().to_ascii_lowercase(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    match text.as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
