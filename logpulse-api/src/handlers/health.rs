use crate::error::ApiError;
use crate::handlers::scan;
use crate::server::ApiState;
use axum::extract::State;
use axum::response::Json;
use logpulse_core::timestamp::format_timestamp;
use serde_json::{Value, json};
use std::sync::Arc;

pub async fn health_check(State(state): State<Arc<ApiState>>) -> Result<Json<Value>, ApiError> {
    let (stat, latest) = scan(&state, "health", |reader| {
        let stat = reader.store().stat();
        let latest = reader.latest_timestamp()?;
        Ok((stat, latest))
    })
    .await?;

    Ok(Json(json!({
        "status": "ok",
        "log_file": stat,
        "latest_timestamp": latest.as_ref().map(format_timestamp),
    })))
}
