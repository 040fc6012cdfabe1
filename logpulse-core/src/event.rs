use chrono::{DateTime, Utc};
use serde::Serialize;

/// A single normalized log record.
///
/// Only `timestamp` is guaranteed. Every optional field distinguishes
/// "not present in the source record" (`None`) from a present zero/false.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEvent {
    #[serde(serialize_with = "crate::timestamp::serialize")]
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub event_type: String,
    pub method: Option<String>,
    pub path: Option<String>,
    pub status_code: Option<i64>,
    pub duration_ms: Option<f64>,
    pub user_id: Option<i64>,
    pub is_authenticated: Option<bool>,
    pub error_type: Option<String>,
    pub error_message: Option<String>,
}

impl LogEvent {
    /// A bare event carrying only a timestamp.
    pub fn at(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            level: String::new(),
            event_type: String::new(),
            method: None,
            path: None,
            status_code: None,
            duration_ms: None,
            user_id: None,
            is_authenticated: None,
            error_type: None,
            error_message: None,
        }
    }

    /// Request-like: has both an HTTP method and a path.
    ///
    /// A status code is deliberately not required; events without one still
    /// count toward `total_requests`.
    pub fn is_request(&self) -> bool {
        self.method.as_deref().is_some_and(|m| !m.is_empty())
            && self.path.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// Status code is known and `>= 400`.
    pub fn is_failed_status(&self) -> bool {
        self.status_code.is_some_and(|s| s >= 400)
    }

    /// Error: failed status, or level `ERROR` in any case.
    pub fn is_error(&self) -> bool {
        self.is_failed_status() || self.level.eq_ignore_ascii_case("error")
    }
}
