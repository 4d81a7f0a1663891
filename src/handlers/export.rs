use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ExportError;
use crate::export::{run_batch, BatchExportEntry, ChartJob, ExportReport};
use crate::AppState;

use super::{blocking, AppError};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    pub bin_size: Option<f64>,
}

// ─── POST /api/export/:endpoint ──────────────────────────────────

pub async fn export_one(
    State(state): State<Arc<AppState>>,
    Path(endpoint): Path<String>,
    Query(q): Query<ExportQuery>,
) -> Result<Json<ExportReport>, AppError> {
    let bin_size = q.bin_size.unwrap_or(state.default_bin_size);

    // Snapshot under the lock, render without it
    let job = ChartJob::from_store(&state.store.lock(), &endpoint, bin_size).map_err(to_app_error)?;
    let exporter = state.exporter.clone();
    let report = blocking(move || job.run(exporter.as_ref()))
        .await?
        .map_err(to_app_error)?;

    Ok(Json(report))
}

// ─── POST /api/export ────────────────────────────────────────────

pub async fn export_all(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ExportQuery>,
) -> Result<Json<Vec<BatchExportEntry>>, AppError> {
    let bin_size = q.bin_size.unwrap_or(state.default_bin_size);

    let jobs = ChartJob::all_from_store(&state.store.lock(), bin_size);
    let exporter = state.exporter.clone();
    let results = blocking(move || run_batch(exporter.as_ref(), jobs)).await?;

    Ok(Json(results))
}

fn to_app_error(e: ExportError) -> AppError {
    match e {
        ExportError::UnknownEndpoint(_) => AppError::NotFound(e.to_string()),
        other => AppError::Internal(other.to_string()),
    }
}
