use crate::error::ApiError;
use crate::handlers::scan;
use crate::query::{ERROR_LIMIT, LimitQuery};
use crate::server::ApiState;
use axum::extract::{Query, State};
use axum::response::Json;
use logpulse_core::LogEvent;
use logpulse_core::aggregate::compute_errors;
use logpulse_core::timestamp::format_timestamp;
use serde_json::{Value, json};
use std::sync::Arc;

/// Newest errors across the whole store; not windowed.
pub async fn get_errors(
    State(state): State<Arc<ApiState>>,
    Query(q): Query<LimitQuery>,
) -> Result<Json<Value>, ApiError> {
    let limit = ERROR_LIMIT.apply(q.limit) as usize;
    let errors = scan(&state, "errors", move |reader| {
        Ok(compute_errors(&reader.load_events()?, limit))
    })
    .await?;

    let list: Vec<Value> = errors.iter().map(error_entry).collect();
    Ok(Json(json!({ "errors": list })))
}

fn error_entry(e: &LogEvent) -> Value {
    json!({
        "timestamp": format_timestamp(&e.timestamp),
        "level": e.level,
        "method": e.method,
        "path": e.path,
        "status_code": e.status_code,
        "error_type": e.error_type,
        "error_message": e.error_message,
        "user_id": e.user_id,
    })
}
