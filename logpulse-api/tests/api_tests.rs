//! Integration tests for the query and upload API.
//!
//! Uses `tower::ServiceExt::oneshot` to call handlers without binding a real
//! TCP port. Every test gets a fresh in-memory store.

use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use logpulse_api::server::{ApiState, QUERY_ROUTES, build_api_router};
use logpulse_core::{PulseConfig, PulseError};
use logpulse_observability::MetricsCollector;
use logpulse_store::{FileStore, LogStore, MemoryStore};
use std::sync::Arc;
use tower::ServiceExt; // .oneshot()

// ── Helpers ───────────────────────────────────────────────────

const FIXTURE: &str = concat!(
    r#"{"timestamp":"2024-01-01T09:00:00Z","method":"GET","path":"/old","status_code":200,"duration_ms":10}"#,
    "\n",
    r#"{"timestamp":"2024-01-01T10:00:00Z","method":"GET","path":"/a","status_code":200,"duration_ms":100,"user_id":1,"is_authenticated":true}"#,
    "\n",
    r#"{"timestamp":"2024-01-01T10:30:00Z","method":"POST","path":"/a","status_code":500,"duration_ms":200,"user_id":2,"level":"ERROR","error_type":"DbError","error_message":"boom"}"#,
    "\n",
    r#"{"timestamp":"2024-01-01T11:00:00Z","method":"GET","path":"/b","status_code":404,"duration_ms":50,"user_id":1}"#,
    "\n",
    "not json at all\n",
);

fn make_state_with(store: Arc<dyn LogStore>, config: PulseConfig) -> Arc<ApiState> {
    let metrics = MetricsCollector::new(config.observability.prometheus.enabled).unwrap();
    Arc::new(ApiState::new(store, Arc::new(metrics), config).unwrap())
}

fn make_state(contents: Option<&str>) -> Arc<ApiState> {
    let store = match contents {
        Some(text) => MemoryStore::with_contents(text),
        None => MemoryStore::new(),
    };
    make_state_with(Arc::new(store), PulseConfig::default())
}

fn get_req(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn raw_upload(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/upload-log")
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .body(body.into())
        .unwrap()
}

fn multipart_upload(field: &str, contents: &str) -> Request<Body> {
    let boundary = "XBOUNDARYX";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"logs.json\"\r\n\
         Content-Type: application/json\r\n\r\n\
         {contents}\r\n\
         --{boundary}--\r\n"
    );
    Request::builder()
        .method(Method::POST)
        .uri("/api/upload-log")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ── Health ────────────────────────────────────────────────────

#[tokio::test]
async fn health_on_empty_store() {
    let app = build_api_router(make_state(None));
    let resp = app.oneshot(get_req("/api/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let j = body_json(resp).await;
    assert_eq!(j["status"], "ok");
    assert_eq!(j["log_file"]["exists"], false);
    assert_eq!(j["log_file"]["total_lines"], 0);
    assert!(j["latest_timestamp"].is_null());
}

#[tokio::test]
async fn health_reports_latest_timestamp() {
    let app = build_api_router(make_state(Some(FIXTURE)));
    let j = body_json(app.oneshot(get_req("/api/health")).await.unwrap()).await;
    assert_eq!(j["log_file"]["exists"], true);
    assert_eq!(j["log_file"]["total_lines"], 5);
    assert_eq!(j["latest_timestamp"], "2024-01-01T11:00:00+00:00");
}

// ── Metrics ───────────────────────────────────────────────────

#[tokio::test]
async fn metrics_default_window_is_anchored_to_latest_event() {
    let app = build_api_router(make_state(Some(FIXTURE)));
    let resp = app.oneshot(get_req("/api/metrics")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let m = &body_json(resp).await["metrics"];

    assert_eq!(m["total_requests"], 3);
    assert_eq!(m["error_count"], 2);
    assert_eq!(m["p50_response_time"], 100.0);
    assert_eq!(m["requests_by_status"]["404"], 1);
    assert_eq!(m["requests_by_method"]["GET"], 2);
    assert_eq!(m["requests_by_method"]["POST"], 1);
    assert_eq!(m["unique_users"], 2);
    assert_eq!(m["authenticated_requests"], 1);
}

#[tokio::test]
async fn metrics_wider_window_includes_older_events() {
    let app = build_api_router(make_state(Some(FIXTURE)));
    let j = body_json(app.oneshot(get_req("/api/metrics?minutes=1440")).await.unwrap()).await;
    assert_eq!(j["metrics"]["total_requests"], 4);
}

#[tokio::test]
async fn metrics_out_of_range_minutes_are_clamped() {
    let app = build_api_router(make_state(Some(FIXTURE)));
    let resp = app.oneshot(get_req("/api/metrics?minutes=0")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    // One minute still contains the anchor event itself.
    let j = body_json(resp).await;
    assert_eq!(j["metrics"]["total_requests"], 1);
}

#[tokio::test]
async fn metrics_on_empty_store_are_zero() {
    let app = build_api_router(make_state(None));
    let j = body_json(app.oneshot(get_req("/api/metrics")).await.unwrap()).await;
    assert_eq!(j["metrics"]["total_requests"], 0);
    assert_eq!(j["metrics"]["error_rate"], 0.0);
    assert_eq!(j["metrics"]["p99_response_time"], 0.0);
}

// ── Endpoints ─────────────────────────────────────────────────

#[tokio::test]
async fn endpoints_sorted_by_count_desc() {
    let app = build_api_router(make_state(Some(FIXTURE)));
    let j = body_json(app.oneshot(get_req("/api/endpoints")).await.unwrap()).await;
    let list = j["endpoints"].as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["path"], "/a");
    assert_eq!(list[0]["count"], 2);
    assert_eq!(list[0]["errors"], 1);
    assert_eq!(list[0]["error_rate"], 50.0);
    assert_eq!(list[1]["path"], "/b");
}

#[tokio::test]
async fn endpoints_ascending_and_limited() {
    let app = build_api_router(make_state(Some(FIXTURE)));
    let uri = "/api/endpoints?minutes=1440&order=ASC&limit=1";
    let j = body_json(app.oneshot(get_req(uri)).await.unwrap()).await;
    let list = j["endpoints"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["path"], "/old");
}

#[tokio::test]
async fn endpoints_unknown_sort_falls_back_to_count() {
    let app = build_api_router(make_state(Some(FIXTURE)));
    let uri = "/api/endpoints?sort_by=bogus&order=bogus";
    let j = body_json(app.oneshot(get_req(uri)).await.unwrap()).await;
    assert_eq!(j["endpoints"][0]["path"], "/a");
}

// ── Errors ────────────────────────────────────────────────────

#[tokio::test]
async fn errors_are_newest_first_across_whole_store() {
    let app = build_api_router(make_state(Some(FIXTURE)));
    let j = body_json(app.oneshot(get_req("/api/errors")).await.unwrap()).await;
    let list = j["errors"].as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["path"], "/b");
    assert_eq!(list[0]["timestamp"], "2024-01-01T11:00:00+00:00");
    assert_eq!(list[1]["error_type"], "DbError");
    assert_eq!(list[1]["error_message"], "boom");
    assert_eq!(list[1]["user_id"], 2);
}

#[tokio::test]
async fn errors_respect_limit() {
    let app = build_api_router(make_state(Some(FIXTURE)));
    let j = body_json(app.oneshot(get_req("/api/errors?limit=1")).await.unwrap()).await;
    assert_eq!(j["errors"].as_array().unwrap().len(), 1);
}

// ── Traffic ───────────────────────────────────────────────────

#[tokio::test]
async fn traffic_has_all_24_buckets() {
    let app = build_api_router(make_state(Some(FIXTURE)));
    let j = body_json(app.oneshot(get_req("/api/traffic")).await.unwrap()).await;
    let hourly = j["hourly_distribution"].as_object().unwrap();
    assert_eq!(hourly.len(), 24);
    assert!(hourly.contains_key("00"));
    assert!(hourly.contains_key("23"));
    let total: u64 = hourly.values().map(|v| v.as_u64().unwrap()).sum();
    assert_eq!(total, 4);
}

// ── Debug sample ──────────────────────────────────────────────

#[tokio::test]
async fn debug_sample_shows_raw_and_parsed() {
    let app = build_api_router(make_state(Some(FIXTURE)));
    let j = body_json(app.oneshot(get_req("/api/debug/sample?n=2")).await.unwrap()).await;
    assert_eq!(j["raw"].as_array().unwrap().len(), 2);
    let parsed = j["parsed"].as_array().unwrap();
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[0]["path"], "/old");
    assert_eq!(parsed[0]["is_request"], true);
    assert_eq!(j["latest_timestamp"], "2024-01-01T11:00:00+00:00");
}

// ── Upload ────────────────────────────────────────────────────

#[tokio::test]
async fn raw_json_array_upload_replaces_store() {
    let state = make_state(Some(FIXTURE));
    let body = r#"[{"timestamp":"2024-02-01T00:00:00Z","method":"GET","path":"/x"},42]"#;

    let app = build_api_router(Arc::clone(&state));
    let resp = app.oneshot(raw_upload(body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let j = body_json(resp).await;
    assert_eq!(j["status"], "ok");
    assert_eq!(j["saved_as"], "jsonl");
    assert_eq!(j["mode"], "json_array");
    assert_eq!(j["written"], 1);
    assert_eq!(j["path"], "memory");

    let app = build_api_router(Arc::clone(&state));
    let j = body_json(app.oneshot(get_req("/api/health")).await.unwrap()).await;
    assert_eq!(j["log_file"]["total_lines"], 1);
    assert_eq!(j["latest_timestamp"], "2024-02-01T00:00:00+00:00");
}

#[tokio::test]
async fn multipart_upload_uses_file_field() {
    let state = make_state(None);
    let app = build_api_router(Arc::clone(&state));
    let contents = r#"{"events":[{"timestamp":"2024-01-01T00:00:00Z"},{"timestamp":"2024-01-01T00:01:00Z"}]}"#;
    let resp = app.oneshot(multipart_upload("file", contents)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let j = body_json(resp).await;
    assert_eq!(j["mode"], "json_object.events");
    assert_eq!(j["written"], 2);
    assert_eq!(state.store().read_lines().unwrap().len(), 2);
}

#[tokio::test]
async fn multipart_without_file_field_is_rejected() {
    let app = build_api_router(make_state(None));
    let resp = app.oneshot(multipart_upload("other", "{}")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_upload_is_400_and_store_untouched() {
    let state = make_state(Some(FIXTURE));
    let app = build_api_router(Arc::clone(&state));
    let resp = app.oneshot(raw_upload("   \n")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let j = body_json(resp).await;
    assert_eq!(j["status"], 400);
    assert_eq!(j["error"], "Empty file after decoding");
    assert_eq!(state.store().read_lines().unwrap().len(), 5);
}

#[tokio::test]
async fn scalar_json_upload_is_400() {
    let app = build_api_router(make_state(None));
    let resp = app.oneshot(raw_upload("123")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn write_failure_is_reported_as_upload_failed() {
    let dir = tempfile::tempdir().unwrap();
    // The store path is an existing directory, so the rename cannot succeed.
    let store = FileStore::new(dir.path());
    let app = build_api_router(make_state_with(Arc::new(store), PulseConfig::default()));

    let resp = app.oneshot(raw_upload(r#"{"a":1}"#)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let j = body_json(resp).await;
    assert!(j["error"].as_str().unwrap().starts_with("Upload failed: "));
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let mut config = PulseConfig::default();
    config.server.max_upload_bytes = 16;
    let app = build_api_router(make_state_with(Arc::new(MemoryStore::new()), config));
    let resp = app.oneshot(raw_upload(vec![b'x'; 64])).await.unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

// ── Routing & observability ───────────────────────────────────

#[tokio::test]
async fn custom_prefix_is_honoured() {
    let mut config = PulseConfig::default();
    config.server.api_prefix = "/v1/".into();
    let app = build_api_router(make_state_with(Arc::new(MemoryStore::new()), config));
    let resp = app.oneshot(get_req("/v1/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn every_listed_query_route_is_mounted() {
    let state = make_state(Some(FIXTURE));
    for route in QUERY_ROUTES {
        let app = build_api_router(Arc::clone(&state));
        let resp = app.oneshot(get_req(&format!("/api{route}"))).await.unwrap();
        assert_ne!(resp.status(), StatusCode::NOT_FOUND, "{route} is not mounted");
    }
}

#[test]
fn prometheus_path_shadowing_a_query_route_is_rejected() {
    for prefix in ["", "/"] {
        let mut config = PulseConfig::default();
        config.server.api_prefix = prefix.into();
        config.observability.prometheus.enabled = true;
        let metrics = Arc::new(MetricsCollector::new(true).unwrap());

        let err = ApiState::new(Arc::new(MemoryStore::new()), metrics, config)
            .err()
            .expect("colliding /metrics routes must be refused");
        assert!(matches!(err, PulseError::Config(_)));
    }

    let mut config = PulseConfig::default();
    config.observability.prometheus.enabled = true;
    config.observability.prometheus.path = "/api/health".into();
    let metrics = Arc::new(MetricsCollector::new(true).unwrap());
    assert!(ApiState::new(Arc::new(MemoryStore::new()), metrics, config).is_err());
}

#[test]
fn prometheus_path_without_leading_slash_is_rejected() {
    let mut config = PulseConfig::default();
    config.observability.prometheus.enabled = true;
    config.observability.prometheus.path = "metrics".into();
    let metrics = Arc::new(MetricsCollector::new(true).unwrap());
    assert!(ApiState::new(Arc::new(MemoryStore::new()), metrics, config).is_err());
}

#[tokio::test]
async fn root_prefix_with_separate_prometheus_path_serves_both() {
    let mut config = PulseConfig::default();
    config.server.api_prefix = "/".into();
    config.observability.prometheus.enabled = true;
    config.observability.prometheus.path = "/prom".into();
    let state = make_state_with(Arc::new(MemoryStore::with_contents(FIXTURE)), config);

    let app = build_api_router(Arc::clone(&state));
    let resp = app.oneshot(get_req("/metrics")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_json(resp).await["metrics"].is_object());

    let app = build_api_router(Arc::clone(&state));
    let resp = app.oneshot(get_req("/prom")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn prometheus_route_absent_when_disabled() {
    let app = build_api_router(make_state(None));
    let resp = app.oneshot(get_req("/metrics")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn prometheus_route_exposes_counters_when_enabled() {
    let mut config = PulseConfig::default();
    config.observability.prometheus.enabled = true;
    let state = make_state_with(Arc::new(MemoryStore::with_contents(FIXTURE)), config);

    let app = build_api_router(Arc::clone(&state));
    app.oneshot(get_req("/api/metrics")).await.unwrap();

    let app = build_api_router(Arc::clone(&state));
    let resp = app.oneshot(get_req("/metrics")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("logpulse_queries_total"));
    assert!(text.contains("logpulse_http_requests_total"));
}

#[tokio::test]
async fn cors_preflight_is_answered() {
    let app = build_api_router(make_state(None));
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/metrics")
        .header(header::ORIGIN, "http://dashboard.local")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert!(resp.status().is_success());
    assert_eq!(
        resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://dashboard.local"
    );
}
