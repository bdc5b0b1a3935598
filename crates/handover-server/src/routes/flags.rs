use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use handover_core::{FlagStore, ParticipantId, SessionFlag};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SetFlagBody {
    pub value: bool,
    /// Defaults to `orchestration.flag_ttl_minutes`.
    #[serde(default)]
    pub ttl_minutes: Option<u32>,
}

/// GET /api/flags/{participant}/{flag}
pub async fn get_flag(
    State(app): State<AppState>,
    Path((participant, flag)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let flag: SessionFlag = flag.parse()?;
    let participant = ParticipantId::new(participant);
    let store = app.store.clone();
    let value = {
        let participant = participant.clone();
        tokio::task::spawn_blocking(move || store.get(&participant, flag))
            .await
            .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??
    };

    Ok(Json(serde_json::json!({
        "participant": participant,
        "flag": flag,
        "value": value,
    })))
}

/// PUT /api/flags/{participant}/{flag}
pub async fn put_flag(
    State(app): State<AppState>,
    Path((participant, flag)): Path<(String, String)>,
    Json(body): Json<SetFlagBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let flag: SessionFlag = flag.parse()?;
    let participant = ParticipantId::new(participant);
    let ttl = match body.ttl_minutes {
        Some(minutes) => chrono::Duration::minutes(i64::from(minutes)),
        None => app.config.orchestration.flag_ttl(),
    };
    let store = app.store.clone();
    {
        let participant = participant.clone();
        tokio::task::spawn_blocking(move || store.set(&participant, flag, ttl, body.value))
            .await
            .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    }
    tracing::info!(%participant, %flag, value = body.value, "session flag set");

    Ok(Json(serde_json::json!({
        "participant": participant,
        "flag": flag,
        "value": body.value,
        "ttl_minutes": ttl.num_minutes(),
    })))
}

/// DELETE /api/flags/{participant}/{flag}
pub async fn delete_flag(
    State(app): State<AppState>,
    Path((participant, flag)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let flag: SessionFlag = flag.parse()?;
    let participant = ParticipantId::new(participant);
    let store = app.store.clone();
    {
        let participant = participant.clone();
        tokio::task::spawn_blocking(move || store.clear(&participant, flag))
            .await
            .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    }

    Ok(Json(serde_json::json!({
        "participant": participant,
        "flag": flag,
        "value": null,
    })))
}
