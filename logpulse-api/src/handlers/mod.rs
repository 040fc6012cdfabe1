pub mod debug;
pub mod endpoints;
pub mod errors;
pub mod health;
pub mod metrics;
pub mod traffic;
pub mod upload;

use crate::error::ApiError;
use crate::server::ApiState;
use logpulse_store::EventReader;
use std::sync::Arc;
use std::time::Instant;

/// Run a store scan on the blocking pool and record how long it took.
///
/// Every query rescans the whole store, so none of this may run on the
/// async worker threads.
pub(crate) async fn scan<T, F>(state: &Arc<ApiState>, endpoint: &'static str, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&EventReader) -> logpulse_core::error::Result<T> + Send + 'static,
{
    let reader = state.reader.clone();
    let start = Instant::now();
    let out = tokio::task::spawn_blocking(move || f(&reader)).await?;
    let elapsed = start.elapsed();

    state.metrics.record_query(endpoint, elapsed.as_secs_f64());
    tracing::debug!(endpoint, elapsed_ms = elapsed.as_millis() as u64, "query: store scanned");

    Ok(out?)
}
