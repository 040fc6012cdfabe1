use crate::error::ApiError;
use crate::handlers::scan;
use crate::query::EndpointsQuery;
use crate::server::ApiState;
use axum::extract::{Query, State};
use axum::response::Json;
use logpulse_core::aggregate::compute_endpoints;
use serde_json::{Value, json};
use std::sync::Arc;

pub async fn get_endpoints(
    State(state): State<Arc<ApiState>>,
    Query(q): Query<EndpointsQuery>,
) -> Result<Json<Value>, ApiError> {
    let (minutes, limit) = (q.minutes(), q.limit());
    let (key, order) = (q.sort_key(), q.sort_order());

    let endpoints = scan(&state, "endpoints", move |reader| {
        let window = reader.window(minutes)?;
        Ok(compute_endpoints(&window.events, limit, key, order))
    })
    .await?;

    Ok(Json(json!({ "endpoints": endpoints })))
}
