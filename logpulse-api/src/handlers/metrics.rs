use crate::error::ApiError;
use crate::handlers::scan;
use crate::query::{METRICS_MINUTES, WindowQuery};
use crate::server::ApiState;
use axum::extract::{Query, State};
use axum::response::Json;
use logpulse_core::aggregate::compute_metrics;
use serde_json::{Value, json};
use std::sync::Arc;

pub async fn get_metrics(
    State(state): State<Arc<ApiState>>,
    Query(q): Query<WindowQuery>,
) -> Result<Json<Value>, ApiError> {
    let minutes = q.minutes(METRICS_MINUTES);
    let metrics = scan(&state, "metrics", move |reader| {
        Ok(compute_metrics(&reader.window(minutes)?.events))
    })
    .await?;

    Ok(Json(json!({ "metrics": metrics })))
}
