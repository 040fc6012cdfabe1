use crate::error::ApiError;
use crate::server::ApiState;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header;
use axum::response::Json;
use bytes::Bytes;
use logpulse_store::ingest;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{error, warn};

/// Multipart field carrying the uploaded file.
const FILE_FIELD: &str = "file";

/// Replace the store with an uploaded log file.
///
/// Accepts `multipart/form-data` with a `file` field, or the file as the raw
/// request body.
pub async fn upload_log(
    State(state): State<Arc<ApiState>>,
    request: Request,
) -> Result<Json<Value>, ApiError> {
    let payload = read_payload(request).await?;
    let bytes = payload.len();

    let store = Arc::clone(state.store());
    let result = tokio::task::spawn_blocking(move || ingest(store.as_ref(), &payload))
        .await
        .map_err(|e| ApiError::internal(format!("Upload failed: {e}")))?;

    let report = match result {
        Ok(report) => report,
        Err(e) if e.is_client_error() => {
            warn!(error = %e, bytes, "upload: rejected");
            return Err(ApiError::upload(e));
        }
        Err(e) => {
            error!(error = %e, bytes, "upload: store write failed");
            return Err(ApiError::upload(e));
        }
    };

    let mode = report.mode.to_string();
    state.metrics.record_upload(&mode, report.written);

    Ok(Json(json!({
        "status": "ok",
        "saved_as": "jsonl",
        "mode": mode,
        "written": report.written,
        "path": state.store().location(),
    })))
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
}

async fn read_payload(request: Request) -> Result<Bytes, ApiError> {
    if !is_multipart(&request) {
        return Bytes::from_request(request, &())
            .await
            .map_err(|rej| ApiError::new(rej.status(), rej.body_text()));
    }

    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|rej| ApiError::new(rej.status(), rej.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::new(e.status(), e.body_text()))?
    {
        if field.name() == Some(FILE_FIELD) {
            return field
                .bytes()
                .await
                .map_err(|e| ApiError::new(e.status(), e.body_text()));
        }
    }

    Err(ApiError::bad_request(format!(
        "Missing multipart field '{FILE_FIELD}'"
    )))
}
