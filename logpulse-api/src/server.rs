use crate::handlers;
use crate::middleware::access_log;
use axum::{
    Router as AxumRouter,
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, header},
    response::IntoResponse,
    routing::{get, post},
};
use logpulse_core::error::{PulseError, Result};
use logpulse_core::PulseConfig;
use logpulse_observability::MetricsCollector;
use logpulse_store::{EventReader, LogStore};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::{info, warn};

/// Query routes, relative to `server.api_prefix`. Keep in sync with
/// [`build_api_router`].
pub const QUERY_ROUTES: &[&str] = &[
    "/upload-log",
    "/health",
    "/metrics",
    "/endpoints",
    "/errors",
    "/traffic",
    "/debug/sample",
];

/// Shared state behind every handler.
pub struct ApiState {
    pub reader: EventReader,
    pub metrics: Arc<MetricsCollector>,
    pub config: PulseConfig,
}

impl ApiState {
    /// Fails when the config describes routes the router cannot mount.
    pub fn new(
        store: Arc<dyn LogStore>,
        metrics: Arc<MetricsCollector>,
        config: PulseConfig,
    ) -> Result<Self> {
        config.validate()?;
        if metrics.is_enabled() && prometheus_collides(&config) {
            return Err(PulseError::Config(format!(
                "observability.prometheus.path {:?} collides with a query route under api_prefix {:?}",
                config.observability.prometheus.path, config.server.api_prefix
            )));
        }

        Ok(Self {
            reader: EventReader::new(store),
            metrics,
            config,
        })
    }

    pub fn store(&self) -> &Arc<dyn LogStore> {
        self.reader.store()
    }
}

/// Build the axum router: query routes under `server.api_prefix`, the
/// optional Prometheus route at the root.
///
/// Separated from [`start_api`] so tests can drive it with `oneshot`.
pub fn build_api_router(state: Arc<ApiState>) -> AxumRouter {
    let api = AxumRouter::new()
        .route("/upload-log", post(handlers::upload::upload_log))
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::get_metrics))
        .route("/endpoints", get(handlers::endpoints::get_endpoints))
        .route("/errors", get(handlers::errors::get_errors))
        .route("/traffic", get(handlers::traffic::get_traffic))
        .route("/debug/sample", get(handlers::debug::debug_sample));

    let prefix = api_prefix(&state.config);
    let mut app = if prefix.is_empty() {
        AxumRouter::new().merge(api)
    } else {
        AxumRouter::new().nest(prefix, api)
    };

    if state.metrics.is_enabled() {
        app = app.route(&state.config.observability.prometheus.path, get(prometheus_metrics));
    }

    app.layer(DefaultBodyLimit::max(state.config.server.max_upload_bytes))
        .layer(axum::middleware::from_fn_with_state(Arc::clone(&state), access_log))
        .layer(cors_layer(&state.config))
        .with_state(state)
}

fn api_prefix(config: &PulseConfig) -> &str {
    config.server.api_prefix.trim_end_matches('/')
}

/// Whether the Prometheus route would shadow a query route.
fn prometheus_collides(config: &PulseConfig) -> bool {
    let prefix = api_prefix(config);
    let path = config.observability.prometheus.path.as_str();
    QUERY_ROUTES
        .iter()
        .any(|route| path.strip_prefix(prefix) == Some(*route))
}

/// `["*"]` allows everything; otherwise only the listed origins, with
/// credentials.
fn cors_layer(config: &PulseConfig) -> CorsLayer {
    if config.cors_is_permissive() {
        return CorsLayer::very_permissive();
    }

    let origins: Vec<HeaderValue> = config
        .server
        .cors_allow_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %origin, "cors: ignoring invalid origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

/// Bind `server.addr` and serve until `shutdown` resolves.
pub async fn start_api(
    state: Arc<ApiState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr: SocketAddr = state.config.server.addr.parse()?;
    let prefix = state.config.server.api_prefix.clone();
    let app = build_api_router(state);

    info!(addr = %addr, prefix = %prefix, "Starting query API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Query API server stopped");
    Ok(())
}

/// Prometheus exposition of the service's own counters.
async fn prometheus_metrics(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(prefix: &str, prom_path: &str) -> PulseConfig {
        let mut config = PulseConfig::default();
        config.server.api_prefix = prefix.into();
        config.observability.prometheus.path = prom_path.into();
        config
    }

    #[test]
    fn collision_follows_the_effective_prefix() {
        assert!(prometheus_collides(&config("", "/metrics")));
        assert!(prometheus_collides(&config("/", "/metrics")));
        assert!(prometheus_collides(&config("/api/", "/api/errors")));
        assert!(prometheus_collides(&config("/api", "/api/debug/sample")));
    }

    #[test]
    fn distinct_paths_do_not_collide() {
        assert!(!prometheus_collides(&config("/api", "/metrics")));
        assert!(!prometheus_collides(&config("", "/prom")));
        assert!(!prometheus_collides(&config("/api", "/api/metrics/extra")));
    }
}
