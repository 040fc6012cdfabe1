use crate::error::ApiError;
use crate::handlers::scan;
use crate::query::{TRAFFIC_MINUTES, WindowQuery};
use crate::server::ApiState;
use axum::extract::{Query, State};
use axum::response::Json;
use logpulse_core::aggregate::hourly_distribution;
use serde_json::{Value, json};
use std::sync::Arc;

pub async fn get_traffic(
    State(state): State<Arc<ApiState>>,
    Query(q): Query<WindowQuery>,
) -> Result<Json<Value>, ApiError> {
    let minutes = q.minutes(TRAFFIC_MINUTES);
    let hourly = scan(&state, "traffic", move |reader| {
        Ok(hourly_distribution(&reader.window(minutes)?.events))
    })
    .await?;

    Ok(Json(json!({ "hourly_distribution": hourly })))
}
