use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::metrics::{Histogram, Outcome, StatsSnapshot};
use crate::AppState;

use super::{blocking, AppError};

// ─── Request / response types ────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordEventRequest {
    /// Raw request id, usually the URL that was fetched
    pub url: String,

    /// Observed latency (ms); absent for calls that never completed
    #[serde(default)]
    pub latency_ms: Option<f64>,

    /// `success` (default), `failed` or `timeout`
    #[serde(default)]
    pub outcome: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EndpointKey {
    pub endpoint: String,
}

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramQuery {
    pub bin_size: Option<f64>,
    pub max_ms: Option<f64>,
}

// ─── POST /api/events ────────────────────────────────────────────

pub async fn record_event(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RecordEventRequest>,
) -> Result<Json<EndpointKey>, AppError> {
    // Unknown outcomes are refused so every call lands in exactly one counter
    let outcome = match req.outcome.as_deref() {
        None => Outcome::default(),
        Some(s) => s
            .parse::<Outcome>()
            .map_err(|e| AppError::BadRequest(e.to_string()))?,
    };

    // May trigger a periodic save
    let endpoint = blocking(move || {
        state
            .store
            .lock()
            .record_event(&req.url, req.latency_ms, outcome)
    })
    .await?;

    Ok(Json(EndpointKey { endpoint }))
}

// ─── GET /api/resolve?url= ───────────────────────────────────────

pub async fn resolve_endpoint(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ResolveQuery>,
) -> Json<EndpointKey> {
    let endpoint = state.store.lock().resolve_endpoint_key(&q.url);
    Json(EndpointKey { endpoint })
}

// ─── GET /api/metrics/:endpoint ──────────────────────────────────

pub async fn get_snapshot(
    State(state): State<Arc<AppState>>,
    Path(endpoint): Path<String>,
) -> Result<Json<StatsSnapshot>, AppError> {
    state
        .store
        .lock()
        .snapshot(&endpoint)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("endpoint '{endpoint}' not found")))
}

// ─── GET /api/histogram/:endpoint ────────────────────────────────

pub async fn get_histogram(
    State(state): State<Arc<AppState>>,
    Path(endpoint): Path<String>,
    Query(q): Query<HistogramQuery>,
) -> Json<Histogram> {
    let bin_size = q.bin_size.unwrap_or(state.default_bin_size);
    Json(state.store.lock().histogram(&endpoint, bin_size, q.max_ms))
}
