use axum::extract::{Path, State};
use axum::Json;

use handover_core::{ParticipantId, RecordStore};

use crate::error::AppError;
use crate::state::AppState;

/// GET /api/orchestrations/{participant} — the active record.
pub async fn get_active(
    State(app): State<AppState>,
    Path(participant): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let participant = ParticipantId::new(participant);
    let record = tokio::task::spawn_blocking(move || store.get(&participant))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    match record {
        Some(record) => Ok(Json(serde_json::to_value(&record)?)),
        None => Err(AppError::not_found("no active orchestration")),
    }
}

/// GET /api/orchestrations/{participant}/history — every record, newest first.
pub async fn get_history(
    State(app): State<AppState>,
    Path(participant): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let participant = ParticipantId::new(participant);
    let records = tokio::task::spawn_blocking(move || store.list(&participant))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(Json(serde_json::to_value(&records)?))
}

/// POST /api/orchestrations/{participant}/end — close the active record.
pub async fn end_orchestration(
    State(app): State<AppState>,
    Path(participant): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let id = ParticipantId::new(participant);
    let closed = {
        let id = id.clone();
        tokio::task::spawn_blocking(move || store.end(&id))
            .await
            .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??
    };
    tracing::info!(participant = %id, closed, "orchestration ended by operator");

    Ok(Json(serde_json::json!({
        "participant": id,
        "closed": closed,
    })))
}
