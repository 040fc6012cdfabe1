use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use logpulse_core::PulseError;
use serde_json::json;

/// An error on its way back to the HTTP client.
///
/// Rendered as `{"error": <message>, "status": <code>}`.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Map an ingest failure: client errors keep their message, anything
    /// else is reported as a failed upload.
    pub fn upload(err: PulseError) -> Self {
        if err.is_client_error() {
            Self::bad_request(err.to_string())
        } else {
            Self::internal(format!("Upload failed: {err}"))
        }
    }
}

impl From<PulseError> for ApiError {
    fn from(err: PulseError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, err.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::internal(format!("worker task failed: {err}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16(),
        }));
        (self.status, body).into_response()
    }
}
