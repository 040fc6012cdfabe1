use crate::error::ApiError;
use crate::handlers::scan;
use crate::query::{SAMPLE_SIZE, SampleQuery};
use crate::server::ApiState;
use axum::extract::{Query, State};
use axum::response::Json;
use logpulse_core::LogEvent;
use logpulse_core::timestamp::format_timestamp;
use serde_json::{Value, json};
use std::sync::Arc;

/// First `n` store lines, raw and normalized, to check what the
/// normalizer makes of an unfamiliar log shape.
pub async fn debug_sample(
    State(state): State<Arc<ApiState>>,
    Query(q): Query<SampleQuery>,
) -> Result<Json<Value>, ApiError> {
    let n = SAMPLE_SIZE.apply(q.n) as usize;
    let (sample, latest) = scan(&state, "debug_sample", move |reader| {
        Ok((reader.sample(n)?, reader.latest_timestamp()?))
    })
    .await?;

    let parsed: Vec<Value> = sample.parsed.iter().map(sample_entry).collect();
    Ok(Json(json!({
        "raw": sample.raw,
        "parsed": parsed,
        "latest_timestamp": latest.as_ref().map(format_timestamp),
    })))
}

fn sample_entry(e: &LogEvent) -> Value {
    json!({
        "timestamp": format_timestamp(&e.timestamp),
        "path": e.path,
        "method": e.method,
        "status_code": e.status_code,
        "duration_ms": e.duration_ms,
        "is_authenticated": e.is_authenticated,
        "level": e.level,
        "is_request": e.is_request(),
    })
}
