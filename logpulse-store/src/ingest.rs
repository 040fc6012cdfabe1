//! Upload ingestion: detect the payload shape and rewrite the store as JSONL.
//!
//! Accepted shapes, in detection order:
//! * a JSON array of objects
//! * a JSON object wrapping a list under one of [`WRAPPER_KEYS`]
//! * any other single JSON object
//! * text that is not one JSON document, stored verbatim as JSONL
//!
//! Everything is validated before the store is touched, so a rejected upload
//! leaves the previous contents in place.

use crate::{LogStore, count_non_blank};
use logpulse_core::error::{PulseError, Result};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Keys checked, in order, for a wrapped list of records.
pub const WRAPPER_KEYS: [&str; 5] = ["logs", "events", "entries", "data", "items"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestMode {
    JsonArray,
    JsonObject(&'static str),
    SingleJsonObject,
    RawJsonl,
}

impl fmt::Display for IngestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestMode::JsonArray => f.write_str("json_array"),
            IngestMode::JsonObject(key) => write!(f, "json_object.{key}"),
            IngestMode::SingleJsonObject => f.write_str("single_json_object"),
            IngestMode::RawJsonl => f.write_str("raw_jsonl"),
        }
    }
}

impl Serialize for IngestMode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub mode: IngestMode,
    pub written: usize,
}

/// A validated upload, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedUpload {
    pub mode: IngestMode,
    pub written: usize,
    pub contents: String,
}

/// Validate and flatten `payload` without touching any store.
pub fn prepare(payload: &[u8]) -> Result<PreparedUpload> {
    if payload.is_empty() {
        return Err(PulseError::invalid_upload("Empty file content"));
    }

    let decoded = String::from_utf8_lossy(payload);
    let text = decoded.trim();
    if text.is_empty() {
        return Err(PulseError::invalid_upload("Empty file after decoding"));
    }

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => Ok(flatten(IngestMode::JsonArray, &items)),
        Ok(Value::Object(obj)) => {
            let wrapped = WRAPPER_KEYS
                .iter()
                .find_map(|key| obj.get(*key).and_then(Value::as_array).map(|l| (*key, l)));
            Ok(match wrapped {
                Some((key, items)) => flatten(IngestMode::JsonObject(key), items),
                None => flatten(IngestMode::SingleJsonObject, &[Value::Object(obj)]),
            })
        }
        Ok(_) => Err(PulseError::invalid_upload(
            "Unsupported JSON payload: expected an array or an object",
        )),
        // Not a single JSON document: assume it already is JSONL.
        Err(_) => Ok(PreparedUpload {
            mode: IngestMode::RawJsonl,
            written: count_non_blank(text),
            contents: format!("{text}\n"),
        }),
    }
}

/// Non-object elements are skipped and not counted.
fn flatten(mode: IngestMode, items: &[Value]) -> PreparedUpload {
    let mut contents = String::new();
    let mut written = 0;
    for item in items.iter().filter(|v| v.is_object()) {
        // Serializing an in-memory `Value` cannot fail.
        if let Ok(line) = serde_json::to_string(item) {
            contents.push_str(&line);
            contents.push('\n');
            written += 1;
        }
    }
    let skipped = items.len() - written;
    if skipped > 0 {
        tracing::debug!(skipped, "ingest: skipped non-object elements");
    }
    PreparedUpload {
        mode,
        written,
        contents,
    }
}

/// Validate `payload` and overwrite `store` with it.
pub fn ingest(store: &dyn LogStore, payload: &[u8]) -> Result<IngestReport> {
    let prepared = prepare(payload)?;
    store.replace(&prepared.contents)?;

    tracing::info!(
        mode = %prepared.mode,
        written = prepared.written,
        bytes = payload.len(),
        location = %store.location(),
        "ingest: store replaced"
    );

    Ok(IngestReport {
        mode: prepared.mode,
        written: prepared.written,
    })
}
