use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::handlers;
use crate::metrics::stream;
use crate::middleware::timing;
use crate::AppState;

/// Builds the full Axum `Router` with all routes and middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // ── Ingestion ───────────────────────────────────────────
        .route("/api/events", post(handlers::events::record_event))
        .route("/api/resolve", get(handlers::events::resolve_endpoint))
        // ── Metrics ─────────────────────────────────────────────
        .route("/api/metrics", get(stream::get_metrics))
        .route("/api/metrics/stream", get(stream::metrics_stream))
        .route(
            "/api/metrics/:endpoint",
            get(handlers::events::get_snapshot),
        )
        .route(
            "/api/histogram/:endpoint",
            get(handlers::events::get_histogram),
        )
        // ── Persistence ─────────────────────────────────────────
        .route(
            "/api/persistence/save",
            post(handlers::persistence::save),
        )
        .route(
            "/api/persistence/load",
            post(handlers::persistence::load),
        )
        .route(
            "/api/persistence/clear",
            post(handlers::persistence::clear),
        )
        // ── Chart export ────────────────────────────────────────
        .route("/api/export", post(handlers::export::export_all))
        .route(
            "/api/export/:endpoint",
            post(handlers::export::export_one),
        )
        // ── Provide shared state to all routes above ────────────
        .with_state(state)
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(axum_mw::from_fn(timing::timing_middleware))
        .layer(CorsLayer::permissive())
}
