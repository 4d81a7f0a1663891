use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use endpoint_latency::export::JpegChartExporter;
use endpoint_latency::metrics::{EndpointKeyResolver, MetricsStore, StoreConfig, MAX_BINS};
use endpoint_latency::persistence::{MemoryStore, PersistenceAdapter};
use endpoint_latency::{server, AppState};

fn app_with(backend: Option<Arc<MemoryStore>>, export_dir: &std::path::Path) -> (Router, Arc<AppState>) {
    let persistence = backend.map(|b| PersistenceAdapter::new(b, "http-test"));
    let store = MetricsStore::new(StoreConfig::default(), EndpointKeyResolver::default(), persistence);
    let state = Arc::new(AppState::new(
        store,
        Arc::new(JpegChartExporter::new(export_dir)),
        25.0,
    ));
    (server::create_router(state.clone()), state)
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_record_event_returns_endpoint_key() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = app_with(None, dir.path());

    let req = post_json(
        "/api/events",
        serde_json::json!({ "url": "/wms?LAYERS=roads", "latencyMs": 95.0, "outcome": "timeout" }),
    );
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["endpoint"], "roads");

    let snap = state.store.lock().snapshot("roads").unwrap();
    assert_eq!(snap.total_calls, 1);
    assert_eq!(snap.timed_out_calls, 1);
}

#[tokio::test]
async fn test_unknown_outcome_is_rejected_and_not_counted() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = app_with(None, dir.path());

    let req = post_json(
        "/api/events",
        serde_json::json!({ "url": "/wms?LAYERS=roads", "latencyMs": 10.0, "outcome": "bogus" }),
    );
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert!(body["error"].as_str().unwrap().contains("bogus"));
    assert!(state.store.lock().is_empty());
}

#[tokio::test]
async fn test_save_against_unavailable_storage_reports_in_body() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(MemoryStore::new());
    backend.set_unavailable(true);
    let (app, _state) = app_with(Some(backend), dir.path());

    let (status, body) = send(app, empty("POST", "/api/persistence/save")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], false);
    assert_eq!(body["kind"], "unavailable");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_load_reports_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(MemoryStore::new());
    let (app, _state) = app_with(Some(backend), dir.path());

    let (status, body) = send(app, empty("POST", "/api/persistence/load")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["load"]["status"], "absent");
}

#[tokio::test]
async fn test_unknown_endpoint_snapshot_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _state) = app_with(None, dir.path());

    let (status, body) = send(app, empty("GET", "/api/metrics/ghost")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn test_histogram_with_huge_max_is_bounded() {
    let dir = tempfile::tempdir().unwrap();
    let (app, state) = app_with(None, dir.path());
    state
        .store
        .lock()
        .record_event("/tiles/roads", Some(1e13), endpoint_latency::metrics::Outcome::Success);

    let (status, body) = send(app.clone(), empty("GET", "/api/histogram/roads?maxMs=1e20")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["counts"].as_array().unwrap().len(), MAX_BINS);

    let (status, body) = send(app, empty("GET", "/api/histogram/roads?binSize=1e-9")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["samples"], 1);
    assert_eq!(body["counts"].as_array().unwrap().len(), MAX_BINS);
}
