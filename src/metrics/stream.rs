use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;

use super::store::EndpointStats;
use crate::AppState;

// ─── GET /api/metrics ────────────────────────────────────────────
/// Every endpoint's snapshot as one JSON array.

pub async fn get_metrics(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<EndpointStats>> {
    Json(state.store.lock().all_snapshots())
}

// ─── GET /api/metrics/stream ─────────────────────────────────────
/// Server-Sent Events endpoint.
/// Pushes `all_snapshots()` as JSON every 500 ms.

pub async fn metrics_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let interval = tokio::time::interval(Duration::from_millis(500));

    let stream = IntervalStream::new(interval).map(move |_| {
        let snapshots = state.store.lock().all_snapshots();
        let json = serde_json::to_string(&snapshots).unwrap_or_default();
        Ok(Event::default().data(json))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
