use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::PersistError;
use crate::metrics::LoadOutcome;
use crate::AppState;

use super::{blocking, AppError};

/// Storage failures are reported in the body, never as an HTTP error.
#[derive(Debug, Serialize)]
pub struct PersistStatus {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load: Option<LoadOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PersistStatus {
    fn from_result(result: Result<Option<LoadOutcome>, PersistError>) -> Self {
        match result {
            Ok(load) => Self {
                ok: true,
                load,
                kind: None,
                error: None,
            },
            Err(e) => Self {
                ok: false,
                load: None,
                kind: Some(e.kind()),
                error: Some(e.to_string()),
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ClearQuery {
    #[serde(default)]
    pub persist: bool,
}

// ─── POST /api/persistence/save ──────────────────────────────────

pub async fn save(State(state): State<Arc<AppState>>) -> Result<Json<PersistStatus>, AppError> {
    let result = blocking(move || state.store.lock().save().map(|_| None)).await?;
    Ok(Json(PersistStatus::from_result(result)))
}

// ─── POST /api/persistence/load ──────────────────────────────────

pub async fn load(State(state): State<Arc<AppState>>) -> Result<Json<PersistStatus>, AppError> {
    let result = blocking(move || state.store.lock().load().map(Some)).await?;
    Ok(Json(PersistStatus::from_result(result)))
}

// ─── POST /api/persistence/clear?persist= ────────────────────────

pub async fn clear(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ClearQuery>,
) -> Result<Json<PersistStatus>, AppError> {
    let result = blocking(move || state.store.lock().clear(q.persist).map(|_| None)).await?;
    Ok(Json(PersistStatus::from_result(result)))
}
